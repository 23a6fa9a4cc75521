//! Search strategies over the open leaves of a decision tree.
//!
//! The explorer keeps every open leaf in an [`OpenSet`], stamped with a
//! discovery sequence number. Each [`Strategy`] is a pure selection function
//! over that set and the current tree:
//!
//! - [`Strategy::Dfs`]: the most recently discovered leaf (stack).
//! - [`Strategy::Bfs`]: the earliest discovered leaf (queue).
//! - [`Strategy::InOrder`]: the leftmost open leaf of the tree as it is shaped
//!   *now*, `True` slots before `False` slots. Found in O(depth) by always
//!   descending into the first child that is not closed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::DseError;
use crate::tree::{DecisionTree, Leaf, NodeId, NodeKind};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Strategy {
    Bfs,
    #[default]
    Dfs,
    InOrder,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Bfs, Strategy::Dfs, Strategy::InOrder];

    /// Pick the next open leaf to solve, or `None` when nothing is open.
    pub fn select(self, open: &OpenSet, tree: &DecisionTree) -> Option<NodeId> {
        match self {
            Strategy::Dfs => open.newest(),
            Strategy::Bfs => open.oldest(),
            Strategy::InOrder => leftmost_open(tree),
        }
    }
}

impl FromStr for Strategy {
    type Err = DseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bfs" => Ok(Strategy::Bfs),
            "dfs" => Ok(Strategy::Dfs),
            "inorder" | "in_order" => Ok(Strategy::InOrder),
            _ => Err(DseError::Config(format!("unsupported exploration strategy: {}", s))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Bfs => write!(f, "bfs"),
            Strategy::Dfs => write!(f, "dfs"),
            Strategy::InOrder => write!(f, "inorder"),
        }
    }
}

/// Leftmost open leaf of the tree.
pub fn leftmost_open(tree: &DecisionTree) -> Option<NodeId> {
    let mut current = tree.root();
    if tree.is_closed(current) {
        return None;
    }
    loop {
        match tree.node(current).kind() {
            NodeKind::Leaf(Leaf::Open) => return Some(current),
            NodeKind::Decision { children, .. } => {
                // A decision that is not closed has a child that is not closed.
                current = *children.iter().find(|&&c| !tree.is_closed(c))?;
            }
            NodeKind::Leaf(_) => unreachable!("closed leaf {} reached through open ancestors", current),
        }
    }
}

/// Open leaves keyed by discovery order.
#[derive(Debug, Clone, Default)]
pub struct OpenSet {
    by_seq: BTreeMap<u64, NodeId>,
    seq_of: HashMap<NodeId, u64>,
    next_seq: u64,
}

impl OpenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly discovered leaf. Re-inserting a known leaf keeps its
    /// original discovery stamp.
    pub fn insert(&mut self, id: NodeId) {
        if self.seq_of.contains_key(&id) {
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_seq.insert(seq, id);
        self.seq_of.insert(id, seq);
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        match self.seq_of.remove(&id) {
            Some(seq) => {
                self.by_seq.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.seq_of.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_seq.is_empty()
    }

    pub fn newest(&self) -> Option<NodeId> {
        self.by_seq.values().next_back().copied()
    }

    pub fn oldest(&self) -> Option<NodeId> {
        self.by_seq.values().next().copied()
    }

    /// Leaves in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_seq.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::expr::Expr;
    use crate::path::PathState;
    use crate::trace::{Decision, Trace};
    use crate::types::Valuation;

    #[test]
    fn test_parse() {
        assert_eq!("BFS".parse::<Strategy>().unwrap(), Strategy::Bfs);
        assert_eq!(" dfs ".parse::<Strategy>().unwrap(), Strategy::Dfs);
        assert_eq!("inorder".parse::<Strategy>().unwrap(), Strategy::InOrder);
        assert!("random".parse::<Strategy>().is_err());
        for s in Strategy::ALL {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
    }

    #[test]
    fn test_open_set_order() {
        let mut open = OpenSet::new();
        assert_eq!(open.newest(), None);

        let ids: Vec<NodeId> = {
            let mut tree = DecisionTree::new();
            let t = Trace::new(
                vec![
                    Decision::new(Expr::var(1), true),
                    Decision::new(Expr::var(2), true),
                    Decision::new(Expr::var(3), true),
                ],
                PathState::Ok,
            );
            tree.merge(&t, &Valuation::new()).unwrap().discovered
        };
        for &id in &ids {
            open.insert(id);
        }
        open.insert(ids[0]);

        assert_eq!(open.len(), 3);
        assert_eq!(open.oldest(), Some(ids[0]));
        assert_eq!(open.newest(), Some(ids[2]));

        assert!(open.remove(ids[2]));
        assert!(!open.remove(ids[2]));
        assert_eq!(open.newest(), Some(ids[1]));
        assert_eq!(open.iter().collect::<Vec<_>>(), vec![ids[0], ids[1]]);
    }

    #[test]
    fn test_leftmost_open_is_dynamic() {
        let mut tree = DecisionTree::new();
        assert_eq!(leftmost_open(&tree), Some(tree.root()));

        // x1=F, x2=F: open slots are [x1] and [!x1, x2].
        let t = Trace::new(
            vec![Decision::new(Expr::var(1), false), Decision::new(Expr::var(2), false)],
            PathState::Ok,
        );
        let merge = tree.merge(&t, &Valuation::new()).unwrap();
        let left = merge.discovered[0];
        assert_eq!(leftmost_open(&tree), Some(left));

        // Filling the left slot adds a new, even more leftward, open slot.
        let t = Trace::new(
            vec![Decision::new(Expr::var(1), true), Decision::new(Expr::var(3), false)],
            PathState::Ok,
        );
        let merge2 = tree.merge(&t, &Valuation::new()).unwrap();
        assert_eq!(leftmost_open(&tree), Some(merge2.discovered[0]));

        tree.close(merge2.discovered[0], Leaf::Infeasible);
        assert_eq!(leftmost_open(&tree), Some(merge.discovered[1]));

        tree.close(merge.discovered[1], Leaf::Infeasible);
        assert_eq!(leftmost_open(&tree), None);
    }
}

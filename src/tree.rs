//! The decision tree accumulated across all runs.
//!
//! Every branch condition any run has evaluated becomes a decision node; the
//! two outcome slots of a decision node hold either further decisions or
//! leaves. Nodes live in an arena (`Vec<Node>`) and are addressed by
//! [`NodeId`] handles; the parent link is a back-reference index only.
//!
//! # Open and closed
//!
//! A leaf is *open* while it is an unexplored slot waiting for the solver.
//! Every other leaf (a classified run, or a slot proven infeasible) is
//! *closed*. A decision node is closed once both of its slots are closed.
//! Closing is monotonic and propagates bottom-up in O(depth).
//!
//! # Merging
//!
//! [`DecisionTree::merge`] walks from the root along the trace's outcomes,
//! reusing existing nodes. At the first open leaf it builds the remainder of
//! the trace as a fresh chain, ending in a leaf carrying the trace's
//! classification; the untaken slot of every new decision becomes a new open
//! leaf. Any disagreement with recorded structure is reported as
//! [`DseError::Inconsistent`] and leaves the tree untouched.

use std::fmt;

use log::debug;

use crate::error::{DseError, Result};
use crate::expr::Expr;
use crate::path::{PathResult, PathState};
use crate::trace::{Decision, Trace};
use crate::types::{Outcome, Valuation, Var};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Leaf {
    /// Unexplored slot, pending a solver query.
    Open,
    /// Slot whose path condition is unsatisfiable; never executed.
    Infeasible,
    /// Slot reached by a run (or given up on), with its classification.
    Done(PathResult),
}

impl Leaf {
    pub fn is_open(&self) -> bool {
        matches!(self, Leaf::Open)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NodeKind {
    Decision { condition: Expr, children: [NodeId; 2] },
    Leaf(Leaf),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Node {
    parent: Option<NodeId>,
    depth: usize,
    closed: bool,
    kind: NodeKind,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
    pub fn depth(&self) -> usize {
        self.depth
    }
    pub fn is_closed(&self) -> bool {
        self.closed
    }
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Decision { .. } => None,
        }
    }

    pub fn condition(&self) -> Option<&Expr> {
        match &self.kind {
            NodeKind::Decision { condition, .. } => Some(condition),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn child(&self, outcome: Outcome) -> Option<NodeId> {
        match &self.kind {
            NodeKind::Decision { children, .. } => Some(children[outcome.index()]),
            NodeKind::Leaf(_) => None,
        }
    }
}

/// One literal of a path condition: the decision node it comes from and the
/// outcome taken there.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PathLiteral {
    pub node: NodeId,
    pub outcome: Outcome,
    pub literal: Expr,
}

/// What a merge did to the tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Merge {
    /// The terminal leaf the trace ended in.
    pub leaf: NodeId,
    /// The open leaf the trace filled in, if it reached one.
    pub filled: Option<NodeId>,
    /// Open leaves created by this merge, in discovery order (root first).
    pub discovered: Vec<NodeId>,
}

/// One step of a root-to-leaf walk for downstream consumers.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WitnessStep {
    pub literal: Expr,
    /// Concrete values of the variables the literal mentions.
    pub values: Vec<(Var, bool)>,
}

/// Leaf and node counts of a tree.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Census {
    pub decisions: usize,
    pub open: usize,
    pub infeasible: usize,
    pub ok: usize,
    pub abort: usize,
    pub error: usize,
    pub dont_know: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

fn inconsistent(depth: usize, message: String) -> DseError {
    DseError::Inconsistent { depth, message }
}

impl DecisionTree {
    /// Create a tree consisting of a single open root.
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            depth: 0,
            closed: false,
            kind: NodeKind::Leaf(Leaf::Open),
        };
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i as u32), node))
    }

    pub fn is_closed(&self, id: NodeId) -> bool {
        self.node(id).closed
    }

    /// Whether every path has been resolved.
    pub fn is_exhausted(&self) -> bool {
        self.is_closed(NodeId::ROOT)
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        self.node(id).leaf()
    }

    pub fn is_open_leaf(&self, id: NodeId) -> bool {
        matches!(self.leaf(id), Some(Leaf::Open))
    }

    pub fn result(&self, id: NodeId) -> Option<&PathResult> {
        match self.leaf(id) {
            Some(Leaf::Done(result)) => Some(result),
            _ => None,
        }
    }

    /// All open leaves, in arena order.
    pub fn open_leaves(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Leaf(Leaf::Open)))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for node in &self.nodes {
            match &node.kind {
                NodeKind::Decision { .. } => census.decisions += 1,
                NodeKind::Leaf(Leaf::Open) => census.open += 1,
                NodeKind::Leaf(Leaf::Infeasible) => census.infeasible += 1,
                NodeKind::Leaf(Leaf::Done(result)) => match result.state() {
                    PathState::Ok => census.ok += 1,
                    PathState::Abort { .. } => census.abort += 1,
                    PathState::Error { .. } => census.error += 1,
                    PathState::DontKnow => census.dont_know += 1,
                },
            }
        }
        census
    }

    /// Fold the trace of a run on `valuation` into the tree.
    pub fn merge(&mut self, trace: &Trace, valuation: &Valuation) -> Result<Merge> {
        let result = PathResult::new(trace.state.clone(), Some(valuation.clone()));
        let mut current = NodeId::ROOT;

        for (depth, decision) in trace.decisions.iter().enumerate() {
            let next = match &self.node(current).kind {
                NodeKind::Decision { condition, children } => {
                    if *condition != decision.condition {
                        return Err(inconsistent(
                            depth,
                            format!("recorded condition {} but trace tested {}", condition, decision.condition),
                        ));
                    }
                    Some(children[decision.outcome.index()])
                }
                NodeKind::Leaf(Leaf::Open) => None,
                NodeKind::Leaf(Leaf::Infeasible) => {
                    return Err(inconsistent(depth, "trace took a branch proven infeasible".to_string()));
                }
                NodeKind::Leaf(Leaf::Done(existing)) => {
                    return Err(inconsistent(
                        depth,
                        format!("trace continues past a terminal leaf ({})", existing.state()),
                    ));
                }
            };
            match next {
                Some(child) => current = child,
                None => return Ok(self.expand(current, &trace.decisions[depth..], result)),
            }
        }

        let depth = trace.decisions.len();
        match &self.node(current).kind {
            NodeKind::Leaf(Leaf::Open) => {}
            NodeKind::Leaf(Leaf::Done(existing)) => {
                if existing.state() != &trace.state {
                    return Err(inconsistent(
                        depth,
                        format!("trace ends as {} where {} was recorded", trace.state, existing.state()),
                    ));
                }
                debug!("merge: trace already recorded at {}", current);
                return Ok(Merge {
                    leaf: current,
                    filled: None,
                    discovered: Vec::new(),
                });
            }
            NodeKind::Leaf(Leaf::Infeasible) => {
                return Err(inconsistent(depth, "trace ends in a branch proven infeasible".to_string()));
            }
            NodeKind::Decision { condition, .. } => {
                return Err(inconsistent(depth, format!("trace ends before the decision on {}", condition)));
            }
        }
        Ok(self.expand(current, &[], result))
    }

    fn expand(&mut self, at: NodeId, decisions: &[Decision], result: PathResult) -> Merge {
        let mut current = at;
        let mut discovered = Vec::with_capacity(decisions.len());

        for decision in decisions {
            let depth = self.node(current).depth + 1;
            let taken = self.alloc(current, depth);
            let other = self.alloc(current, depth);
            let mut children = [taken, taken];
            children[(!decision.outcome).index()] = other;
            self.nodes[current.index()].kind = NodeKind::Decision {
                condition: decision.condition.clone(),
                children,
            };
            discovered.push(other);
            current = taken;
        }

        debug!(
            "merge: filled {} with {} new decisions, ending in {} ({})",
            at,
            decisions.len(),
            current,
            result.state()
        );
        self.set_leaf(current, Leaf::Done(result));

        Merge {
            leaf: current,
            filled: Some(at),
            discovered,
        }
    }

    fn alloc(&mut self, parent: NodeId, depth: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: Some(parent),
            depth,
            closed: false,
            kind: NodeKind::Leaf(Leaf::Open),
        });
        id
    }

    /// Resolve an open leaf without running it.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not an open leaf, or if `leaf` is [`Leaf::Open`].
    pub fn close(&mut self, id: NodeId, leaf: Leaf) {
        assert!(!leaf.is_open(), "Cannot close {} with an open leaf", id);
        self.set_leaf(id, leaf);
    }

    fn set_leaf(&mut self, id: NodeId, leaf: Leaf) {
        let node = &mut self.nodes[id.index()];
        assert!(
            matches!(node.kind, NodeKind::Leaf(Leaf::Open)),
            "Node {} is not an open leaf",
            id
        );
        node.kind = NodeKind::Leaf(leaf);
        self.close_upward(id);
    }

    fn close_upward(&mut self, id: NodeId) {
        self.nodes[id.index()].closed = true;

        let mut current = self.node(id).parent;
        while let Some(p) = current {
            let both_closed = match &self.node(p).kind {
                NodeKind::Decision { children, .. } => children.iter().all(|&c| self.is_closed(c)),
                NodeKind::Leaf(_) => unreachable!("parent {} is not a decision node", p),
            };
            if !both_closed || self.is_closed(p) {
                break;
            }
            debug!("close: {} is exhausted", p);
            self.nodes[p.index()].closed = true;
            current = self.node(p).parent;
        }
    }

    /// Literals from the root down to `id`, with the polarity of each branch
    /// leading towards `id`.
    pub fn path_condition(&self, id: NodeId) -> Vec<PathLiteral> {
        let mut path = Vec::with_capacity(self.node(id).depth);
        let mut child = id;
        while let Some(parent) = self.node(child).parent {
            let NodeKind::Decision { condition, children } = &self.node(parent).kind else {
                unreachable!("parent {} is not a decision node", parent);
            };
            let outcome = if children[Outcome::True.index()] == child {
                Outcome::True
            } else {
                Outcome::False
            };
            path.push(PathLiteral {
                node: parent,
                outcome,
                literal: condition.literal(outcome),
            });
            child = parent;
        }
        path.reverse();
        path
    }

    /// Root-to-leaf walk of a classified leaf: every branch literal together
    /// with the concrete values the run used for its variables.
    ///
    /// Returns `None` if the leaf carries no valuation.
    pub fn witness(&self, id: NodeId) -> Option<Vec<WitnessStep>> {
        let valuation = self.result(id)?.valuation()?;
        let steps = self
            .path_condition(id)
            .into_iter()
            .map(|lit| {
                let values = lit.literal.vars().into_iter().map(|v| (v, valuation.value(v))).collect();
                WitnessStep {
                    literal: lit.literal,
                    values,
                }
            })
            .collect();
        Some(steps)
    }

    /// Check the structural invariants, describing the first violation found.
    pub fn check_well_formed(&self) -> std::result::Result<(), String> {
        for (id, node) in self.nodes() {
            match node.parent {
                None if id != NodeId::ROOT => return Err(format!("{} has no parent", id)),
                Some(_) if id == NodeId::ROOT => return Err("root has a parent".to_string()),
                None => {}
                Some(p) => {
                    let parent = self.node(p);
                    let NodeKind::Decision { children, .. } = &parent.kind else {
                        return Err(format!("parent {} of {} is not a decision node", p, id));
                    };
                    if !children.contains(&id) {
                        return Err(format!("{} is not a child of its parent {}", id, p));
                    }
                    if node.depth != parent.depth + 1 {
                        return Err(format!("{} has depth {} under parent depth {}", id, node.depth, parent.depth));
                    }
                    if parent.closed && !node.closed {
                        return Err(format!("open {} under closed parent {}", id, p));
                    }
                }
            }

            let expected = match &node.kind {
                NodeKind::Leaf(leaf) => !leaf.is_open(),
                NodeKind::Decision { children, .. } => {
                    if children[0] == children[1] {
                        return Err(format!("{} has the same child in both slots", id));
                    }
                    for &c in children {
                        if self.node(c).parent != Some(id) {
                            return Err(format!("child {} of {} points to another parent", c, id));
                        }
                    }
                    children.iter().all(|&c| self.is_closed(c))
                }
            };
            if node.closed != expected {
                return Err(format!("{} is marked closed={} but should be closed={}", id, node.closed, expected));
            }
        }
        Ok(())
    }
}

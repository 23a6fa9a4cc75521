//! Decision tree to DOT (Graphviz) conversion.
//!
//! The generated DOT output follows these conventions:
//! - **Decision nodes** are ellipses labeled with their branch condition
//! - **Leaves** are boxes labeled with their classification, colored by class
//! - **Edges**: solid lines for the `True` slot, dashed lines for `False`
//! - Nodes at the same depth share a rank
//!
//! # Examples
//!
//! ```
//! use dse::expr::Expr;
//! use dse::path::PathState;
//! use dse::trace::{Decision, Trace};
//! use dse::tree::DecisionTree;
//! use dse::types::Valuation;
//!
//! let mut tree = DecisionTree::new();
//! let trace = Trace::new(vec![Decision::new(Expr::var(1), true)], PathState::Ok);
//! tree.merge(&trace, &Valuation::new()).unwrap();
//!
//! let dot = tree.to_dot().unwrap();
//! assert!(dot.starts_with("digraph"));
//! // Render with: dot -Tpng tree.dot -o tree.png
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::path::PathState;
use crate::tree::{DecisionTree, Leaf, NodeId, NodeKind};
use crate::types::Outcome;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for decision nodes (default: "ellipse")
    pub decision_shape: &'static str,
    /// Shape for leaves (default: "box")
    pub leaf_shape: &'static str,
    /// Style for `True` edges (default: "solid")
    pub true_edge_style: &'static str,
    /// Style for `False` edges (default: "dashed")
    pub false_edge_style: &'static str,
    /// Whether to put the node handle in each label (default: false)
    pub show_ids: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            decision_shape: "ellipse",
            leaf_shape: "box",
            true_edge_style: "solid",
            false_edge_style: "dashed",
            show_ids: false,
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn leaf_style(leaf: &Leaf) -> (String, &'static str) {
    match leaf {
        Leaf::Open => ("open".to_string(), "white"),
        Leaf::Infeasible => ("infeasible".to_string(), "gray"),
        Leaf::Done(result) => {
            let color = match result.state() {
                PathState::Ok => "palegreen",
                PathState::Abort { .. } => "khaki",
                PathState::Error { .. } => "salmon",
                PathState::DontKnow => "lightblue",
            };
            (result.state().to_string(), color)
        }
    }
}

impl DecisionTree {
    /// Converts the tree to DOT (Graphviz) format.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the tree to DOT format with custom configuration.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;

        let mut levels = BTreeMap::<usize, Vec<NodeId>>::new();
        for (id, node) in self.nodes() {
            levels.entry(node.depth()).or_default().push(id);
        }

        for level in levels.values() {
            writeln!(dot, "{{ rank=same")?;
            for &id in level {
                let node = self.node(id);
                let prefix = if config.show_ids { format!("{}: ", id) } else { String::new() };
                match node.kind() {
                    NodeKind::Decision { condition, .. } => {
                        let label = escape(&format!("{}{}", prefix, condition));
                        writeln!(dot, "n{} [shape={}, label=\"{}\"];", id.index(), config.decision_shape, label)?;
                    }
                    NodeKind::Leaf(leaf) => {
                        let (text, color) = leaf_style(leaf);
                        let label = escape(&format!("{}{}", prefix, text));
                        writeln!(
                            dot,
                            "n{} [shape={}, style=filled, fillcolor={}, label=\"{}\"];",
                            id.index(),
                            config.leaf_shape,
                            color,
                            label
                        )?;
                    }
                }
            }
            writeln!(dot, "}}")?;
        }

        for (id, node) in self.nodes() {
            if let NodeKind::Decision { children, .. } = node.kind() {
                for outcome in Outcome::ALL {
                    let style = match outcome {
                        Outcome::True => config.true_edge_style,
                        Outcome::False => config.false_edge_style,
                    };
                    writeln!(
                        dot,
                        "n{} -> n{} [style={}, label=\"{}\"];",
                        id.index(),
                        children[outcome.index()].index(),
                        style,
                        outcome
                    )?;
                }
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

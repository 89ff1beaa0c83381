//! Metavariables: unknowns represented as *two* graph nodes, not a
//! mutable "current type" slot (§3.4, §9).

use crate::solver::node::NodeId;

/// Identifies a metavariable across the whole lifetime of a
/// [`crate::state::TypecheckerState`]. Stable under shadowing - a
/// metavariable allocated inside a speculative branch keeps the same id
/// if the branch commits, and simply stops being reachable if it
/// reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaVarId(pub u32);

/// `value` is the graph node representing what this unknown *is*;
/// `usage` is the node representing what it is *expected to be*.
/// Constraints *into* `usage` are lower bounds, constraints *from*
/// `value` are upper bounds - keeping the two endpoints distinct is what
/// encodes bivariance directly on the graph (§3.4).
#[derive(Debug, Clone, Copy)]
pub struct Metavariable {
    pub id: MetaVarId,
    pub value: NodeId,
    pub usage: NodeId,
    pub is_trait: bool,
    pub block_level: u32,
}

impl Metavariable {
    /// A metavariable outlives any scope strictly shallower than its own
    /// `block_level` - i.e. it must be sliced away (§4.G) before a scope
    /// at or below `exiting_level` closes.
    pub fn escapes(&self, exiting_level: u32) -> bool {
        self.block_level >= exiting_level
    }
}

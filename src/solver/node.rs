//! The node table: every value that participates in the constraint graph
//! - a metavariable's `value`/`usage` endpoint, or an interned concrete
//! `Flex` - is assigned a [`NodeId`] (§4.A, §4.G).

use std::collections::HashMap;

use crate::metavariable::MetaVarId;
use crate::value::Flex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// What a node stands for. Concrete nodes are deduped by `Flex::identity`
/// so that building the "same" value object twice doesn't fork the graph
/// in two (§4.A); metavariable nodes are never deduped; each
/// `register_metavariable` call allocates two fresh ones.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Concrete(Flex),
    MetaValue(MetaVarId),
    MetaUsage(MetaVarId),
}

#[derive(Default)]
pub struct NodeTable {
    nodes: Vec<NodeKind>,
    concrete_index: HashMap<usize, NodeId>,
}

impl NodeTable {
    pub fn new() -> NodeTable {
        NodeTable::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize]
    }

    /// Interns a concrete value, returning the existing node if an
    /// equal-by-identity value was interned before. Returns `true` in
    /// the second element iff a new node was actually allocated (the
    /// caller needs this to know whether to record an undo entry and
    /// insert the reflexive self-edge).
    pub fn intern_concrete(&mut self, value: Flex) -> (NodeId, bool) {
        let key = value.identity();
        if let Some(id) = self.concrete_index.get(&key) {
            return (*id, false);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeKind::Concrete(value));
        self.concrete_index.insert(key, id);
        (id, true)
    }

    pub fn alloc_meta_value(&mut self, id: MetaVarId) -> NodeId {
        let node = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeKind::MetaValue(id));
        node
    }

    pub fn alloc_meta_usage(&mut self, id: MetaVarId) -> NodeId {
        let node = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeKind::MetaUsage(id));
        node
    }

    /// Restores the table to a previously observed length, used by
    /// revert (§4.H). Also sweeps the concrete index of any entries that
    /// pointed past the restored length.
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
        self.concrete_index.retain(|_, id| (id.0 as usize) < len);
    }
}

//! The three edge families of the constraint graph (§4.F): plain
//! subtype ("constrain") edges, and the two "call" edge families used to
//! record a pending application against a node that isn't known to be a
//! function yet (typically a metavariable usage node). Composing a call
//! edge against a concrete function type is what lets `infer`-ed
//! applications resolve once the callee's metavariable is pinned down.

use std::collections::HashMap;
use std::rc::Rc;

use crate::relation::RelationId;
use crate::solver::cause::Cause;
use crate::solver::node::NodeId;

#[derive(Debug, Clone)]
pub struct ConstrainEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub relation: RelationId,
    pub cause: Rc<Cause>,
}

/// A pending application: `node` is applied to `arg`, and the result of
/// that application flows into `result`. A *left*-call edge records this
/// when `node` sits on the covariant (value) side of the obligation that
/// produced it; a *right*-call edge records the contravariant (usage)
/// side. Composing a left-call edge against a concrete `Pi` checks `arg`
/// contravariantly against the domain and flows the range into `result`;
/// composing a right-call edge does the dual.
#[derive(Debug, Clone)]
pub struct CallEdge {
    pub node: NodeId,
    pub arg: NodeId,
    pub result: NodeId,
    pub cause: Rc<Cause>,
}

#[derive(Default)]
pub struct EdgeSet {
    constrain: Vec<ConstrainEdge>,
    constrain_by_from: HashMap<NodeId, Vec<usize>>,
    constrain_by_to: HashMap<NodeId, Vec<usize>>,

    left_call: Vec<CallEdge>,
    left_call_by_node: HashMap<NodeId, Vec<usize>>,

    right_call: Vec<CallEdge>,
    right_call_by_node: HashMap<NodeId, Vec<usize>>,
}

impl EdgeSet {
    pub fn new() -> EdgeSet {
        EdgeSet::default()
    }

    pub fn constrain_len(&self) -> usize {
        self.constrain.len()
    }

    pub fn left_call_len(&self) -> usize {
        self.left_call.len()
    }

    pub fn right_call_len(&self) -> usize {
        self.right_call.len()
    }

    /// Whether an edge with these exact endpoints and relation already
    /// exists - inserting a duplicate is defined as a no-op (§4.F).
    pub fn has_constrain(&self, from: NodeId, to: NodeId, relation: RelationId) -> bool {
        self.constrain_by_from
            .get(&from)
            .into_iter()
            .flatten()
            .any(|&i| self.constrain[i].to == to && self.constrain[i].relation == relation)
    }

    /// Inserts a constrain edge, returning `true` if it was new (the
    /// caller records an undo entry and enqueues it for closure
    /// computation only when new).
    pub fn insert_constrain(&mut self, edge: ConstrainEdge) -> bool {
        if self.has_constrain(edge.from, edge.to, edge.relation) {
            return false;
        }
        let idx = self.constrain.len();
        self.constrain_by_from.entry(edge.from).or_default().push(idx);
        self.constrain_by_to.entry(edge.to).or_default().push(idx);
        self.constrain.push(edge);
        true
    }

    pub fn edges_from(&self, node: NodeId) -> impl Iterator<Item = &ConstrainEdge> {
        self.constrain_by_from
            .get(&node)
            .into_iter()
            .flatten()
            .map(move |&i| &self.constrain[i])
    }

    pub fn edges_to(&self, node: NodeId) -> impl Iterator<Item = &ConstrainEdge> {
        self.constrain_by_to
            .get(&node)
            .into_iter()
            .flatten()
            .map(move |&i| &self.constrain[i])
    }

    pub fn insert_left_call(&mut self, edge: CallEdge) -> usize {
        let idx = self.left_call.len();
        self.left_call_by_node.entry(edge.node).or_default().push(idx);
        self.left_call.push(edge);
        idx
    }

    pub fn insert_right_call(&mut self, edge: CallEdge) -> usize {
        let idx = self.right_call.len();
        self.right_call_by_node.entry(edge.node).or_default().push(idx);
        self.right_call.push(edge);
        idx
    }

    pub fn left_calls_on(&self, node: NodeId) -> impl Iterator<Item = &CallEdge> {
        self.left_call_by_node
            .get(&node)
            .into_iter()
            .flatten()
            .map(move |&i| &self.left_call[i])
    }

    pub fn right_calls_on(&self, node: NodeId) -> impl Iterator<Item = &CallEdge> {
        self.right_call_by_node
            .get(&node)
            .into_iter()
            .flatten()
            .map(move |&i| &self.right_call[i])
    }

    pub fn truncate_constrain(&mut self, len: usize) {
        self.constrain.truncate(len);
        for v in self.constrain_by_from.values_mut() {
            v.retain(|&i| i < len);
        }
        for v in self.constrain_by_to.values_mut() {
            v.retain(|&i| i < len);
        }
    }

    pub fn truncate_left_call(&mut self, len: usize) {
        self.left_call.truncate(len);
        for v in self.left_call_by_node.values_mut() {
            v.retain(|&i| i < len);
        }
    }

    pub fn truncate_right_call(&mut self, len: usize) {
        self.right_call.truncate(len);
        for v in self.right_call_by_node.values_mut() {
            v.retain(|&i| i < len);
        }
    }

    /// All edges touching `node`, on either endpoint, across all three
    /// families - used when slicing a metavariable's constraints into a
    /// `ConstrainedType` at scope exit (§4.G).
    pub fn edges_touching(&self, node: NodeId) -> Touching {
        Touching {
            from: self.edges_from(node).cloned().collect(),
            to: self.edges_to(node).cloned().collect(),
            left: self.left_calls_on(node).cloned().collect(),
            right: self.right_calls_on(node).cloned().collect(),
        }
    }
}

pub struct Touching {
    pub from: Vec<ConstrainEdge>,
    pub to: Vec<ConstrainEdge>,
    pub left: Vec<CallEdge>,
    pub right: Vec<CallEdge>,
}

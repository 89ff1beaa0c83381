//! Metavariable slicing (§4.G): when a scope closes and a metavariable
//! declared inside it still has edges touching nodes that only make
//! sense at that scope's depth, those edges are converted into a
//! `ConstrainedType` term - the metavariable's whole local neighbourhood
//! reified as data - and re-registered against a *fresh* metavariable
//! the first time that term is evaluated outside the scope.

use std::rc::Rc;

use crate::metavariable::MetaVarId;
use crate::relation::RelationId;
use crate::solver::cause::Cause;
use crate::solver::node::{NodeId, NodeKind};
use crate::solver::Solver;
use crate::term::Typed;

/// One edge that touched the escaping metavariable, with its other
/// endpoint quoted back into a closed term (via `evaluate::quote`) so
/// it can be carried inside a `ConstrainedType` independent of the
/// now-defunct node ids.
#[derive(Debug, Clone)]
pub enum ConstraintElem {
    /// The metavariable's value endpoint flowed into `bound`.
    UpperBound {
        relation: RelationId,
        bound: Rc<Typed>,
        cause: Rc<Cause>,
    },
    /// `bound` flowed into the metavariable's usage endpoint.
    LowerBound {
        relation: RelationId,
        bound: Rc<Typed>,
        cause: Rc<Cause>,
    },
    /// The metavariable's value endpoint was applied to `arg`, with the
    /// result flowing into `result`.
    LeftCall { arg: Rc<Typed>, result: Rc<Typed>, cause: Rc<Cause> },
    /// Dual for the usage endpoint.
    RightCall { arg: Rc<Typed>, result: Rc<Typed>, cause: Rc<Cause> },
}

impl ConstraintElem {
    pub fn cause(&self) -> &Rc<Cause> {
        match self {
            ConstraintElem::UpperBound { cause, .. }
            | ConstraintElem::LowerBound { cause, .. }
            | ConstraintElem::LeftCall { cause, .. }
            | ConstraintElem::RightCall { cause, .. } => cause,
        }
    }

    /// A cause chain that has crossed a slice boundary is marked `lost`
    /// if a head-check against it ever fails after re-instatement far
    /// from where it was registered (§7) - wrapping here marks every
    /// element's cause as sliced so that later.
    pub fn mark_sliced(self) -> ConstraintElem {
        match self {
            ConstraintElem::UpperBound { relation, bound, cause } => ConstraintElem::UpperBound {
                relation,
                bound,
                cause: Cause::sliced(cause),
            },
            ConstraintElem::LowerBound { relation, bound, cause } => ConstraintElem::LowerBound {
                relation,
                bound,
                cause: Cause::sliced(cause),
            },
            ConstraintElem::LeftCall { arg, result, cause } => ConstraintElem::LeftCall {
                arg,
                result,
                cause: Cause::sliced(cause),
            },
            ConstraintElem::RightCall { arg, result, cause } => ConstraintElem::RightCall {
                arg,
                result,
                cause: Cause::sliced(cause),
            },
        }
    }
}

/// Reifies every live edge touching `id`'s two nodes into a
/// [`ConstraintElem`] list, ready to be packaged into a
/// [`Typed::ConstrainedType`] before the block that owns `id` closes.
/// Edges found on either the value or the usage node are folded together
/// by direction (outgoing -> upper/left-call, incoming -> lower/right-call)
/// rather than kept separate per endpoint - once a metavariable's
/// neighbourhood is about to be reified as data there is no remaining
/// reader that distinguishes "this came from the value node" from "this
/// came from the usage node transitively reaching it".
pub fn slice_metavariable(solver: &Solver, id: MetaVarId) -> Vec<ConstraintElem> {
    let meta = solver.metavariable(id);
    let mut elems = Vec::new();
    for node in [meta.value, meta.usage] {
        let touching = solver.edges.edges_touching(node);
        for edge in touching.from {
            elems.push(
                ConstraintElem::UpperBound {
                    relation: edge.relation,
                    bound: reify_node(solver, edge.to),
                    cause: edge.cause,
                }
                .mark_sliced(),
            );
        }
        for edge in touching.to {
            elems.push(
                ConstraintElem::LowerBound {
                    relation: edge.relation,
                    bound: reify_node(solver, edge.from),
                    cause: edge.cause,
                }
                .mark_sliced(),
            );
        }
        for edge in touching.left {
            elems.push(
                ConstraintElem::LeftCall {
                    arg: reify_node(solver, edge.arg),
                    result: reify_node(solver, edge.result),
                    cause: edge.cause,
                }
                .mark_sliced(),
            );
        }
        for edge in touching.right {
            elems.push(
                ConstraintElem::RightCall {
                    arg: reify_node(solver, edge.arg),
                    result: reify_node(solver, edge.result),
                    cause: edge.cause,
                }
                .mark_sliced(),
            );
        }
    }
    elems
}

fn reify_node(solver: &Solver, node: NodeId) -> Rc<Typed> {
    match solver.kind_of(node) {
        // No enclosing binder chain is relevant here: a node bound into
        // the constraint graph is already closed with respect to
        // anything this slice needs to address by index.
        NodeKind::Concrete(v) => crate::evaluate::quote(v, &im::Vector::new()),
        NodeKind::MetaValue(other) | NodeKind::MetaUsage(other) => Rc::new(Typed::MetaRef(*other)),
    }
}

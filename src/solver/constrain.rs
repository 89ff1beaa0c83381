//! The core solver procedure (§4.F): registers one subtype obligation
//! and drains the work queue until the graph reaches a fixed point or a
//! concrete head-check fails.

use std::rc::Rc;

use crate::error::ConstraintError;
use crate::relation::{RelationId, RelationRegistry};
use crate::solver::cause::Cause;
use crate::solver::graph::{CallEdge, ConstrainEdge};
use crate::solver::node::{NodeId, NodeKind};
use crate::solver::queue::WorkItem;
use crate::solver::Solver;
use crate::value::strict::Strict;
use crate::value::stuck::Stuck;
use crate::value::Flex;

/// Registers `left -relation-> right` (read: values flowing out of
/// `left` must satisfy `relation` against whatever flows into `right`)
/// and runs the graph to a fixed point.
pub fn constrain(
    solver: &mut Solver,
    relations: &RelationRegistry,
    relation: RelationId,
    left: Flex,
    right: Flex,
    cause: Rc<Cause>,
) -> Result<(), ConstraintError> {
    if is_application(&left) || is_application(&right) {
        return constrain_application(solver, relations, relation, left, right, cause);
    }
    let from = solver.node_for_value(&left);
    let to = solver.node_for_usage(&right);
    push_edge(solver, from, to, relation, cause);
    drain(solver, relations)
}

fn is_application(value: &Flex) -> bool {
    matches!(value, Flex::Stuck(s) if matches!(s.as_ref(), Stuck::App { .. }))
}

/// An application on either side becomes a call edge instead of a plain
/// constrain edge: the solver defers the actual head-check until the
/// function side is pinned down to a concrete `Pi` (§4.F).
fn constrain_application(
    solver: &mut Solver,
    relations: &RelationRegistry,
    relation: RelationId,
    left: Flex,
    right: Flex,
    cause: Rc<Cause>,
) -> Result<(), ConstraintError> {
    if let Flex::Stuck(s) = &left {
        if let Stuck::App { func, arg } = s.as_ref() {
            let func_value = Flex::stuck((**func).clone());
            let func_node = solver.node_for_value(&func_value);
            let result_node = solver.node_for_usage(&right);
            let arg_node = solver.node_for_value(arg);
            let idx = solver.edges.insert_left_call(CallEdge {
                node: func_node,
                arg: arg_node,
                result: result_node,
                cause: cause.clone(),
            });
            solver.record_left_call_insert();
            let _ = idx;
            solver.queue.push(WorkItem::NewLeftCall { node: func_node });
            return drain(solver, relations);
        }
    }
    if let Flex::Stuck(s) = &right {
        if let Stuck::App { func, arg } = s.as_ref() {
            let func_value = Flex::stuck((**func).clone());
            let func_node = solver.node_for_usage(&func_value);
            let result_node = solver.node_for_value(&left);
            let arg_node = solver.node_for_value(arg);
            solver.edges.insert_right_call(CallEdge {
                node: func_node,
                arg: arg_node,
                result: result_node,
                cause: cause.clone(),
            });
            solver.record_right_call_insert();
            solver.queue.push(WorkItem::NewRightCall { node: func_node });
            return drain(solver, relations);
        }
    }
    let _ = relation;
    Ok(())
}

fn push_edge(solver: &mut Solver, from: NodeId, to: NodeId, relation: RelationId, cause: Rc<Cause>) {
    if from == to {
        return;
    }
    let inserted = solver.edges.insert_constrain(ConstrainEdge {
        from,
        to,
        relation,
        cause: cause.clone(),
    });
    if inserted {
        log::debug!(target: "biunify::solver", "edge {:?} -{:?}-> {:?}", from, relation, to);
        solver.record_constrain_insert();
        solver.queue.push(WorkItem::NewConstrain { from, to, relation, cause });
    }
}

fn drain(solver: &mut Solver, relations: &RelationRegistry) -> Result<(), ConstraintError> {
    while let Some(item) = solver.queue.pop() {
        match item {
            WorkItem::NewConstrain { from, to, relation, cause } => {
                propagate(solver, relations, from, to, relation, cause)?
            }
            WorkItem::NewLeftCall { node } => discharge_left_calls(solver, relations, node)?,
            WorkItem::NewRightCall { node } => discharge_right_calls(solver, relations, node)?,
        }
    }
    solver.queue.assert_quiescent();
    Ok(())
}

fn propagate(
    solver: &mut Solver,
    relations: &RelationRegistry,
    from: NodeId,
    to: NodeId,
    relation: RelationId,
    cause: Rc<Cause>,
) -> Result<(), ConstraintError> {
    let forward: Vec<(NodeId, RelationId, Rc<Cause>)> = solver
        .edges
        .edges_from(to)
        .filter(|e| e.relation == relation)
        .map(|e| (e.to, e.relation, e.cause.clone()))
        .collect();
    for (x, rel2, c2) in forward {
        push_edge(solver, from, x, rel2, Cause::compose(cause.clone(), c2));
    }

    let backward: Vec<(NodeId, RelationId, Rc<Cause>)> = solver
        .edges
        .edges_to(from)
        .filter(|e| e.relation == relation)
        .map(|e| (e.from, e.relation, e.cause.clone()))
        .collect();
    for (y, rel2, c2) in backward {
        push_edge(solver, y, to, rel2, Cause::compose(c2, cause.clone()));
    }

    if let (NodeKind::Concrete(lv), NodeKind::Concrete(rv)) = (solver.kind_of(from).clone(), solver.kind_of(to).clone()) {
        if !is_application(&lv) && !is_application(&rv) {
            let comparer = relations.get(relation);
            comparer.constrain(solver, relations, &lv, &rv, &cause)?;
        }
    }

    discharge_left_calls(solver, relations, to)?;
    discharge_right_calls(solver, relations, from)?;
    Ok(())
}

/// If `node` (or something it flows into) is now known to be a concrete
/// `Pi`, applies every pending left-call edge on `node`: the argument is
/// checked contravariantly against the domain and the codomain (applied
/// to the argument) flows into the call's result node.
fn discharge_left_calls(solver: &mut Solver, relations: &RelationRegistry, node: NodeId) -> Result<(), ConstraintError> {
    let pi = match concrete_pi_reachable_from(solver, node) {
        Some(pi) => pi,
        None => return Ok(()),
    };
    let calls: Vec<CallEdge> = solver.edges.left_calls_on(node).cloned().collect();
    for call in calls {
        let arg_value = flex_for_node(solver, call.arg);
        let param_ty = pi_param(&pi);
        constrain(
            solver,
            relations,
            relations.subtype(),
            arg_value.clone(),
            param_ty,
            Cause::sliced(call.cause.clone()),
        )?;
        let result_value = crate::evaluate::apply_pi(&pi, arg_value);
        let result_node = solver.node_for_value(&result_value);
        push_edge(solver, result_node, call.result, relations.equal(), call.cause.clone());
    }
    Ok(())
}

fn discharge_right_calls(solver: &mut Solver, relations: &RelationRegistry, node: NodeId) -> Result<(), ConstraintError> {
    let pi = match concrete_pi_reachable_from(solver, node) {
        Some(pi) => pi,
        None => return Ok(()),
    };
    let calls: Vec<CallEdge> = solver.edges.right_calls_on(node).cloned().collect();
    for call in calls {
        let arg_value = flex_for_node(solver, call.arg);
        let result_value = crate::evaluate::apply_pi(&pi, arg_value);
        let result_usage = solver.node_for_usage(&result_value);
        push_edge(solver, call.result, result_usage, relations.equal(), call.cause.clone());
    }
    Ok(())
}

fn concrete_pi_reachable_from(solver: &Solver, node: NodeId) -> Option<Strict> {
    if let NodeKind::Concrete(Flex::Strict(s)) = solver.kind_of(node) {
        if let Strict::Pi { .. } = s.as_ref() {
            return Some(s.as_ref().clone());
        }
    }
    for edge in solver.edges.edges_from(node) {
        if let NodeKind::Concrete(Flex::Strict(s)) = solver.kind_of(edge.to) {
            if let Strict::Pi { .. } = s.as_ref() {
                return Some(s.as_ref().clone());
            }
        }
    }
    None
}

fn flex_for_node(solver: &Solver, node: NodeId) -> Flex {
    match solver.kind_of(node) {
        NodeKind::Concrete(v) => v.clone(),
        NodeKind::MetaValue(id) | NodeKind::MetaUsage(id) => Flex::stuck(Stuck::Meta(*id)),
    }
}

fn pi_param(pi: &Strict) -> Flex {
    match pi {
        Strict::Pi { param_ty, .. } => param_ty.clone(),
        _ => unreachable!("concrete_pi_reachable_from only returns Pi"),
    }
}

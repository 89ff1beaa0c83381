//! `check`: elaborates a term against a goal type handed down from its
//! context (§4.E). Falls back to `infer` plus a flow obligation whenever
//! the term's shape doesn't give `check` anything special to do with the
//! goal.

use std::rc::Rc;

use crate::context::TypeContext;
use crate::error::TypeError;
use crate::span::{Span, SpannedName};
use crate::state::TypecheckerState;
use crate::term::{Checkable, Inferrable, Typed};
use crate::value::strict::Strict;
use crate::value::stuck::Stuck;
use crate::value::Flex;

pub fn check(state: &mut TypecheckerState, ctx: &TypeContext, term: &Checkable, expected: &Flex) -> Result<Rc<Typed>, TypeError> {
    match term {
        Checkable::Lambda { param_debug, body } => {
            let (param_ty, closure) = match expected.as_strict() {
                Some(Strict::Pi { param_ty, closure, .. }) => (param_ty.clone(), closure.clone()),
                _ => return Err(TypeError::ExpectedPiGoal { span: param_debug.span }),
            };
            let param_value = Flex::stuck(Stuck::Free {
                debug: param_debug.clone(),
                ty: param_ty.clone(),
            });
            let body_goal = crate::evaluate::apply_closure(&closure, param_value.clone());
            let inner_ctx = ctx.extend(param_value, param_ty, param_debug.clone());
            let body_term = check(state, &inner_ctx, body, &body_goal)?;
            Ok(build_lambda_term(param_debug, ctx, &body_term))
        }

        Checkable::TupleCons(elems) => {
            let descs = match expected.as_strict() {
                Some(Strict::TupleType(d)) => d.clone(),
                _ => return check_via_infer(state, ctx, term, expected),
            };
            if descs.len() != elems.len() {
                return Err(TypeError::TupleLengthMismatch {
                    span: Span::initial(),
                    expected: descs.len(),
                    found: elems.len(),
                });
            }
            let mut terms = Vec::with_capacity(elems.len());
            let mut prefix_values = Vec::with_capacity(elems.len());
            for (elem, desc) in elems.iter().zip(descs.iter()) {
                let prefix = Flex::strict(Strict::TupleCons(prefix_values.clone()));
                let elem_ty = crate::evaluate::apply_closure(desc, prefix);
                let elem_term = check(state, ctx, elem, &elem_ty)?;
                let elem_value = state.evaluate(&elem_term, &ctx.runtime_vector());
                prefix_values.push(elem_value);
                terms.push(elem_term);
            }
            Ok(Rc::new(Typed::TupleCons(terms)))
        }

        Checkable::HostTupleCons(elems) => {
            let elem_types = match expected.as_strict() {
                Some(Strict::HostTupleType(t)) => t.clone(),
                _ => return check_via_infer(state, ctx, term, expected),
            };
            if elem_types.len() != elems.len() {
                return Err(TypeError::TupleLengthMismatch {
                    span: Span::initial(),
                    expected: elem_types.len(),
                    found: elems.len(),
                });
            }
            let terms = elems
                .iter()
                .zip(elem_types.iter())
                .map(|(elem, ty)| check(state, ctx, elem, ty))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Rc::new(Typed::TupleCons(terms)))
        }

        Checkable::Inferrable(inner) => check_inferrable(state, ctx, inner, expected),
    }
}

fn check_via_infer(state: &mut TypecheckerState, ctx: &TypeContext, term: &Checkable, expected: &Flex) -> Result<Rc<Typed>, TypeError> {
    match term {
        Checkable::Inferrable(inner) => check_inferrable(state, ctx, inner, expected),
        Checkable::Lambda { param_debug, .. } => Err(TypeError::ExpectedPiGoal { span: param_debug.span }),
        Checkable::TupleCons(_) | Checkable::HostTupleCons(_) => Err(TypeError::ExpectedTupleSubject { span: Span::initial() }),
    }
}

/// `check (enum_cons ...)` needs the goal's variant row to find the
/// payload type, so `enum_cons` is handled here rather than in `infer`;
/// every other inferrable form just synthesises and flows (§4.E INFER).
fn check_inferrable(state: &mut TypecheckerState, ctx: &TypeContext, term: &Inferrable, expected: &Flex) -> Result<Rc<Typed>, TypeError> {
    if let Inferrable::EnumCons { variant, payload } = term {
        let desc = match expected.as_strict() {
            Some(Strict::EnumType(d)) => d.clone(),
            _ => return Err(TypeError::NoComparer),
        };
        let payload_ty = desc
            .iter()
            .find(|(n, _)| n == variant)
            .map(|(_, t)| t.clone())
            .ok_or_else(|| TypeError::MissingVariant {
                span: Span::initial(),
                variant: variant.clone(),
            })?;
        let payload_term = check(state, ctx, payload, &payload_ty)?;
        return Ok(Rc::new(Typed::EnumCons {
            variant: variant.clone(),
            payload: payload_term,
        }));
    }

    let (term, inferred_ty) = crate::elaborate::infer::infer(state, ctx, term)?;
    state
        .flow(state.subtype_relation(), inferred_ty, expected.clone(), Span::initial(), "check<=infer")
        .map_err(Box::new)?;
    Ok(term)
}

/// See the sibling helper in `elaborate::infer` for why the capture is a
/// tuple of `Var` references rather than baked-in values.
fn build_lambda_term(param_debug: &SpannedName, ctx: &TypeContext, body_term: &Rc<Typed>) -> Rc<Typed> {
    let len = ctx.len();
    let refs = (1..=len)
        .rev()
        .map(|i| {
            let debug = ctx.get(i).map(|(_, d)| d.clone()).unwrap_or_else(|| SpannedName::generated("captured"));
            Rc::new(Typed::Var { debug, index: i })
        })
        .collect();
    Rc::new(Typed::Lambda {
        param_debug: param_debug.clone(),
        capture_debug: SpannedName::generated("capture"),
        capture: Rc::new(Typed::TupleCons(refs)),
        body: body_term.clone(),
    })
}

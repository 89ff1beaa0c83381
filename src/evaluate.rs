//! Normalisation by evaluation (§4.C): turns a closed [`Typed`] term into
//! a [`Flex`] value. Every elimination form either makes progress (its
//! scrutinee reduced to a matching constructor) or gets stuck, in which
//! case the elimination itself becomes part of a [`Stuck`] spine.

use std::rc::Rc;

use crate::closure::Closure;
use crate::host::HostValue;
use crate::span::SpannedName;
use crate::term::Typed;
use crate::value::stuck::{Stuck, StuckEnumArm};
use crate::value::strict::{Strict, Unique};
use crate::value::Flex;

/// Evaluates `term`, which must be well-typed in a context of `ctx`'s
/// length, to a [`Flex`] value. `ctx` addresses free variables the same
/// way [`crate::context::RuntimeContext`] does (1-based, innermost
/// last).
pub fn evaluate(term: &Typed, ctx: &im::Vector<Flex>) -> Flex {
    match term {
        Typed::Var { index, .. } => lookup(ctx, *index),

        Typed::Pi {
            param_ty,
            body,
            visibility,
            purity,
            ..
        } => Flex::strict(Strict::Pi {
            param_ty: evaluate(param_ty, ctx),
            closure: Closure::new(ctx.clone(), body.clone()),
            visibility: *visibility,
            purity: *purity,
        }),

        Typed::Lambda { capture, body, .. } => {
            let capture_value = evaluate(capture, ctx);
            let capture_tuple = match capture_value.as_strict() {
                Some(Strict::TupleCons(elems)) => elems.clone(),
                _ => vec![capture_value],
            };
            let mut closure_ctx = im::Vector::new();
            closure_ctx.extend(capture_tuple);
            Flex::strict(Strict::Lambda {
                closure: Closure::new(closure_ctx, body.clone()),
            })
        }

        Typed::App { func, arg } => {
            let func_value = evaluate(func, ctx);
            let arg_value = evaluate(arg, ctx);
            apply_value(&func_value, arg_value)
        }

        Typed::TupleCons(elems) => Flex::strict(Strict::TupleCons(elems.iter().map(|e| evaluate(e, ctx)).collect())),

        Typed::TupleElim { subject, body, .. } => {
            let subject_value = evaluate(subject, ctx);
            match subject_value.as_strict() {
                Some(Strict::TupleCons(elems)) => {
                    let mut new_ctx = ctx.clone();
                    new_ctx.extend(elems.iter().cloned());
                    evaluate(body, &new_ctx)
                }
                _ => {
                    let stuck = as_stuck_rc(&subject_value);
                    Flex::stuck(Stuck::TupleElim {
                        subject: stuck,
                        closure: Closure::new(ctx.clone(), body.clone()),
                    })
                }
            }
        }

        Typed::TupleType(elems) => Flex::strict(Strict::TupleType(
            elems.iter().map(|e| Closure::new(ctx.clone(), e.clone())).collect(),
        )),

        Typed::HostTupleType(elems) => {
            Flex::strict(Strict::HostTupleType(elems.iter().map(|e| evaluate(e, ctx)).collect()))
        }

        Typed::RecordCons(fields) => Flex::strict(Strict::RecordCons(
            fields.iter().map(|(n, v)| (n.clone(), evaluate(v, ctx))).collect(),
        )),

        Typed::RecordElim { fields, subject, body } => {
            let subject_value = evaluate(subject, ctx);
            match subject_value.as_strict() {
                Some(Strict::RecordCons(entries)) => {
                    let mut new_ctx = ctx.clone();
                    for name in fields {
                        let value = entries
                            .iter()
                            .find(|(n, _)| n == &name.name)
                            .map(|(_, v)| v.clone())
                            .unwrap_or_else(|| Flex::stuck(Stuck::Free {
                                debug: name.clone(),
                                ty: Flex::strict(Strict::Prop),
                            }));
                        new_ctx.push_back(value);
                    }
                    evaluate(body, &new_ctx)
                }
                _ => Flex::stuck(Stuck::RecordElim {
                    subject: as_stuck_rc(&subject_value),
                    field: fields.first().map(|n| n.name.clone()).unwrap_or_default(),
                }),
            }
        }

        Typed::EnumCons { variant, payload } => Flex::strict(Strict::EnumCons {
            variant: variant.clone(),
            payload: Box::new(evaluate(payload, ctx)),
        }),

        Typed::EnumCase { subject, arms } => {
            let subject_value = evaluate(subject, ctx);
            match subject_value.as_strict() {
                Some(Strict::EnumCons { variant, payload }) => {
                    if let Some(arm) = arms.iter().find(|a| &a.variant == variant) {
                        let mut new_ctx = ctx.clone();
                        new_ctx.push_back((**payload).clone());
                        evaluate(&arm.body, &new_ctx)
                    } else {
                        Flex::stuck(Stuck::Free {
                            debug: SpannedName::generated("unmatched-variant"),
                            ty: Flex::strict(Strict::Prop),
                        })
                    }
                }
                _ => Flex::stuck(Stuck::EnumCase {
                    subject: as_stuck_rc(&subject_value),
                    arms: arms
                        .iter()
                        .map(|a| StuckEnumArm {
                            variant: a.variant.clone(),
                            closure: Closure::new(ctx.clone(), a.body.clone()),
                        })
                        .collect(),
                }),
            }
        }

        Typed::EnumType(variants) => {
            Flex::strict(Strict::EnumType(variants.iter().map(|(n, t)| (n.clone(), evaluate(t, ctx))).collect()))
        }

        Typed::HostIntrinsic { source, ty } => {
            let source_value = evaluate(source, ctx);
            let ty_value = evaluate(ty, ctx);
            let _ = ty_value;
            source_value
        }

        Typed::HostFunctionType { param_ty, result_ty } => Flex::strict(Strict::HostFunctionType {
            param_ty: evaluate(param_ty, ctx),
            result_ty: evaluate(result_ty, ctx),
        }),

        Typed::Universe(level) => Flex::strict(Strict::Type(*level)),

        Typed::LevelLiteral(level) => Flex::strict(Strict::LevelValue(*level)),
        Typed::LevelSucc(inner) => match evaluate(inner, ctx).as_strict() {
            Some(Strict::LevelValue(l)) => Flex::strict(Strict::LevelValue(l.succ())),
            _ => Flex::strict(Strict::LevelValue(crate::term::Level(crate::term::OMEGA))),
        },
        Typed::LevelMax(a, b) => {
            let av = evaluate(a, ctx);
            let bv = evaluate(b, ctx);
            match (av.as_strict(), bv.as_strict()) {
                (Some(Strict::LevelValue(a)), Some(Strict::LevelValue(b))) => Flex::strict(Strict::LevelValue((*a).max(*b))),
                _ => Flex::strict(Strict::LevelValue(crate::term::Level(crate::term::OMEGA))),
            }
        }

        Typed::Let { expr, body, .. } => {
            let value = evaluate(expr, ctx);
            let mut new_ctx = ctx.clone();
            new_ctx.push_back(value);
            evaluate(body, &new_ctx)
        }

        Typed::ProgramSequence { effect, cont, .. } => {
            // Programs are data until `execute_program` drives them; here
            // we just capture the pending continuation as a value.
            let effect_value = evaluate(effect, ctx);
            Flex::strict(Strict::TupleCons(vec![
                effect_value,
                Flex::strict(Strict::Lambda {
                    closure: Closure::new(ctx.clone(), cont.clone()),
                }),
            ]))
        }
        Typed::ProgramEnd(inner) => evaluate(inner, ctx),
        Typed::ProgramType { result_ty, effect_row } => Flex::strict(Strict::ProgramType {
            result_ty: Box::new(evaluate(result_ty, ctx)),
            effect_row: effect_row_ids(&evaluate(effect_row, ctx)),
        }),

        Typed::Literal(value) => value.clone(),
        Typed::MetaRef(id) => Flex::stuck(Stuck::Meta(*id)),
        Typed::UniqueToken(token) => Flex::strict(Strict::UniqueToken(*token)),

        Typed::TupleElemAccess { subject, index } => {
            let subject_value = evaluate(subject, ctx);
            match subject_value.as_strict() {
                Some(Strict::TupleCons(elems)) => elems.get(*index).cloned().unwrap_or(subject_value),
                _ => Flex::stuck(Stuck::TupleElemAccess {
                    subject: as_stuck_rc(&subject_value),
                    index: *index,
                }),
            }
        }

        Typed::HostWrap(inner) => evaluate(inner, ctx),
        Typed::HostUnwrap(inner) => {
            let value = evaluate(inner, ctx);
            match value.as_strict() {
                Some(Strict::Host(_)) => value,
                _ => Flex::stuck(Stuck::HostUnwrap { subject: as_stuck_rc(&value) }),
            }
        }

        Typed::HostIntFold { count, acc, fun } => {
            let count_value = evaluate(count, ctx);
            let acc_value = evaluate(acc, ctx);
            let fun_value = evaluate(fun, ctx);
            match count_value.as_strict() {
                Some(Strict::Host(HostValue::Number(n))) => {
                    let mut current = acc_value;
                    let mut i = 0.0;
                    while i < *n {
                        current = apply_value(&fun_value, current);
                        i += 1.0;
                    }
                    current
                }
                _ => Flex::stuck(Stuck::HostIntFold {
                    count: as_stuck_rc(&count_value),
                    acc: acc_value,
                    fun: fun_value,
                }),
            }
        }

        Typed::HostIf {
            subject,
            then_branch,
            else_branch,
        } => {
            let subject_value = evaluate(subject, ctx);
            match subject_value.as_strict() {
                Some(Strict::Host(HostValue::Bool(true))) => evaluate(then_branch, ctx),
                Some(Strict::Host(HostValue::Bool(false))) => evaluate(else_branch, ctx),
                _ => Flex::stuck(Stuck::HostIf {
                    subject: as_stuck_rc(&subject_value),
                    then_branch: evaluate(then_branch, ctx),
                    else_branch: evaluate(else_branch, ctx),
                }),
            }
        }

        Typed::Singleton { ty, witness } => Flex::strict(Strict::Singleton {
            ty: Box::new(evaluate(ty, ctx)),
            witness: Box::new(evaluate(witness, ctx)),
        }),

        Typed::UnionType(a, b) => Flex::strict(Strict::UnionType(Box::new(evaluate(a, ctx)), Box::new(evaluate(b, ctx)))),
        Typed::IntersectionType(a, b) => {
            Flex::strict(Strict::IntersectionType(Box::new(evaluate(a, ctx)), Box::new(evaluate(b, ctx))))
        }

        Typed::ConstrainedType { .. } => {
            // Reinstatement (fresh metavariable + re-registered sliced
            // constraints) needs solver access and so happens in
            // `elaborate`, not here; evaluating one outside that path
            // yields a fresh, as-yet-unconstrained metavariable value.
            Flex::stuck(Stuck::Free {
                debug: SpannedName::generated("sliced-constraint"),
                ty: Flex::strict(Strict::Prop),
            })
        }

        Typed::EnumAbsurd { subject } => {
            let subject_value = evaluate(subject, ctx);
            Flex::stuck(Stuck::EnumAbsurd {
                subject: as_stuck_rc(&subject_value),
            })
        }
    }
}

fn lookup(ctx: &im::Vector<Flex>, index: usize) -> Flex {
    let offset = ctx.len() - index;
    ctx.get(offset).cloned().unwrap_or_else(|| {
        Flex::stuck(Stuck::Free {
            debug: SpannedName::generated("unbound"),
            ty: Flex::strict(Strict::Prop),
        })
    })
}

fn as_stuck_rc(value: &Flex) -> Rc<Stuck> {
    match value {
        Flex::Stuck(s) => s.clone(),
        Flex::Strict(_) => Rc::new(Stuck::Free {
            debug: SpannedName::generated("forced-strict"),
            ty: value.clone(),
        }),
    }
}

fn effect_row_ids(value: &Flex) -> Vec<crate::host::EffectId> {
    match value.as_strict() {
        Some(Strict::TupleCons(elems)) => elems
            .iter()
            .filter_map(|e| match e.as_strict() {
                Some(Strict::Host(HostValue::Number(n))) => Some(crate::host::EffectId(*n as u32)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Applies a function value to an argument, making progress if `func` is
/// a `Lambda` and staying stuck (building an `App` spine) otherwise.
pub fn apply_value(func: &Flex, arg: Flex) -> Flex {
    match func.as_strict() {
        Some(Strict::Lambda { closure }) => apply_closure(closure, arg),
        _ => Flex::stuck(Stuck::App {
            func: as_stuck_rc(func),
            arg,
        }),
    }
}

/// Applies a `Pi`'s codomain closure to a probe argument - used by the
/// solver when it needs the *type* produced by applying a function of
/// this `Pi` type, not the function value itself.
pub fn apply_pi(pi: &Strict, arg: Flex) -> Flex {
    match pi {
        Strict::Pi { closure, .. } => apply_closure(closure, arg),
        _ => arg,
    }
}

/// Extends a closure's own capture with `arg` and evaluates its body -
/// the one operation that ever needs a closure's capture, so closure
/// isolation (§8) reduces to "this is the only function that reads
/// `Closure::capture`".
pub fn apply_closure(closure: &Closure, arg: Flex) -> Flex {
    let mut ctx = (*closure.capture).clone();
    ctx.push_back(arg);
    evaluate(&closure.body, &ctx)
}

/// A fresh opaque placeholder value, used to probe a closure's codomain
/// when no real argument is available yet (subtype-checking two `Pi`
/// types needs to compare codomains without ever receiving a concrete
/// argument).
pub fn fresh_probe_value() -> Flex {
    Flex::stuck(Stuck::Free {
        debug: SpannedName::generated("probe"),
        ty: Flex::strict(Strict::Prop),
    })
}

/// Quotes a value back into a term valid under a context whose runtime
/// vector is `ctx_vars` (§4.G's slicing, and §4.D's dependent closure
/// bodies). Any sub-value found by identity inside `ctx_vars` becomes a
/// `Var` at the matching index; compound dependent shapes (`Pi`,
/// `Lambda`, `TupleType`'s element closures) are quoted by probing the
/// closure with a fresh placeholder and recursing into the result under
/// one more binder, so a reinstated term still reads back the right
/// value once real arguments replace the probes. Everything else -
/// atomic heads (`Prop`, `Host`, `HostType`, `Operative`, `RecordType`,
/// whose descriptors have no term-level encoding) and the rarer stuck
/// spines (`TupleElim`, `RecordElim`, `EnumCase`, `HostIf`, ...) - is
/// embedded as an opaque `Literal`, since by construction it never
/// mentions a variable `ctx_vars` would need to resolve.
pub fn quote(value: &Flex, ctx_vars: &im::Vector<Flex>) -> Rc<Typed> {
    if let Some(index) = find_bound_index(value, ctx_vars) {
        return Rc::new(Typed::Var {
            debug: SpannedName::generated("quoted"),
            index,
        });
    }
    match value {
        Flex::Strict(s) => quote_strict(s, ctx_vars),
        Flex::Stuck(s) => quote_stuck(s, ctx_vars),
    }
}

fn find_bound_index(value: &Flex, ctx_vars: &im::Vector<Flex>) -> Option<usize> {
    let target = value.identity();
    let len = ctx_vars.len();
    ctx_vars.iter().position(|v| v.identity() == target).map(|offset| len - offset)
}

fn quote_strict(s: &Strict, ctx_vars: &im::Vector<Flex>) -> Rc<Typed> {
    match s {
        Strict::Type(level) => Rc::new(Typed::Universe(*level)),

        Strict::Pi {
            param_ty,
            closure,
            visibility,
            purity,
        } => {
            let param_ty_term = quote(param_ty, ctx_vars);
            let mut inner = ctx_vars.clone();
            let probe = fresh_probe_value();
            inner.push_back(probe.clone());
            let body_term = quote(&apply_closure(closure, probe), &inner);
            Rc::new(Typed::Pi {
                param_debug: SpannedName::generated("quoted"),
                param_ty: param_ty_term,
                visibility: *visibility,
                purity: *purity,
                body: body_term,
            })
        }

        // Eta-quotes the closure: the capture is re-read as a tuple of
        // `Var` references into `ctx_vars` (the same mechanism
        // `elaborate`'s own lambda-building uses), and the body is the
        // quoted result of probing with a fresh argument.
        Strict::Lambda { closure } => {
            let mut inner = ctx_vars.clone();
            let probe = fresh_probe_value();
            inner.push_back(probe.clone());
            let body_term = quote(&apply_closure(closure, probe), &inner);
            let capture_terms = ctx_vars.iter().map(|v| quote(v, ctx_vars)).collect();
            Rc::new(Typed::Lambda {
                param_debug: SpannedName::generated("quoted"),
                capture_debug: SpannedName::generated("capture"),
                capture: Rc::new(Typed::TupleCons(capture_terms)),
                body: body_term,
            })
        }

        Strict::TupleCons(elems) => Rc::new(Typed::TupleCons(elems.iter().map(|e| quote(e, ctx_vars)).collect())),

        // Each descriptor's dependency on the tuple's own prefix can't
        // be recovered exactly here (quoting has no actual prefix to
        // hand it, only a probe), so this approximates a dependent
        // tuple type by the type its descriptor produces for an
        // arbitrary prefix. Good enough for embedding a tuple type that
        // itself sits inside a larger quoted term; actual tuple
        // construction and elimination never go through this path.
        Strict::TupleType(descs) => Rc::new(Typed::TupleType(
            descs.iter().map(|d| quote(&apply_closure(d, fresh_probe_value()), ctx_vars)).collect(),
        )),

        Strict::HostTupleType(elems) => Rc::new(Typed::HostTupleType(elems.iter().map(|e| quote(e, ctx_vars)).collect())),

        Strict::RecordCons(fields) => Rc::new(Typed::RecordCons(
            fields.iter().map(|(n, v)| (n.clone(), quote(v, ctx_vars))).collect(),
        )),

        Strict::EnumCons { variant, payload } => Rc::new(Typed::EnumCons {
            variant: variant.clone(),
            payload: quote(payload, ctx_vars),
        }),

        Strict::EnumType(variants) => Rc::new(Typed::EnumType(
            variants.iter().map(|(n, t)| (n.clone(), quote(t, ctx_vars))).collect(),
        )),

        Strict::HostFunctionType { param_ty, result_ty } => Rc::new(Typed::HostFunctionType {
            param_ty: quote(param_ty, ctx_vars),
            result_ty: quote(result_ty, ctx_vars),
        }),

        Strict::LevelValue(level) => Rc::new(Typed::LevelLiteral(*level)),

        Strict::ProgramType { result_ty, effect_row } => Rc::new(Typed::ProgramType {
            result_ty: quote(result_ty, ctx_vars),
            effect_row: Rc::new(Typed::TupleCons(
                effect_row
                    .iter()
                    .map(|id| Typed::literal(Flex::strict(Strict::Host(HostValue::Number(id.0 as f64)))))
                    .collect(),
            )),
        }),

        Strict::Singleton { ty, witness } => Rc::new(Typed::Singleton {
            ty: quote(ty, ctx_vars),
            witness: quote(witness, ctx_vars),
        }),

        Strict::UnionType(a, b) => Rc::new(Typed::UnionType(quote(a, ctx_vars), quote(b, ctx_vars))),
        Strict::IntersectionType(a, b) => Rc::new(Typed::IntersectionType(quote(a, ctx_vars), quote(b, ctx_vars))),

        Strict::UniqueToken(token) => Rc::new(Typed::UniqueToken(*token)),

        // No term-level encoding exists for these: `Prop` and host
        // values are never written as surface syntax, `RecordType`'s
        // descriptors are closures with no corresponding `Typed`
        // constructor, and `Operative`/`HostType` are opaque handles by
        // design. Safe to embed directly since none of them can mention
        // a variable from `ctx_vars`.
        Strict::Prop | Strict::Host(_) | Strict::RecordType(_) | Strict::Operative { .. } | Strict::HostType(_) => {
            Typed::literal(Flex::strict(s.clone()))
        }
    }
}

fn quote_stuck(s: &Stuck, ctx_vars: &im::Vector<Flex>) -> Rc<Typed> {
    match s {
        Stuck::Meta(id) => Rc::new(Typed::MetaRef(*id)),

        Stuck::App { func, arg } => Rc::new(Typed::App {
            func: quote(&Flex::Stuck(func.clone()), ctx_vars),
            arg: quote(arg, ctx_vars),
        }),

        // A bound variable not found among `ctx_vars`: either it was
        // never a binder to begin with (a diagnostic placeholder) or it
        // belongs to a scope this quote doesn't see. Either way it
        // can't be addressed as a `Var`, so it's embedded verbatim.
        Stuck::Free { .. }
        | Stuck::TupleElim { .. }
        | Stuck::RecordElim { .. }
        | Stuck::EnumCase { .. }
        | Stuck::EnumAbsurd { .. }
        | Stuck::TupleElemAccess { .. }
        | Stuck::HostUnwrap { .. }
        | Stuck::HostIf { .. }
        | Stuck::HostIntFold { .. }
        | Stuck::HostTuple { .. }
        | Stuck::HostIntrinsicPending { .. } => Typed::literal(Flex::stuck(s.clone())),
    }
}

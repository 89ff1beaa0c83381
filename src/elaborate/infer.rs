//! `infer`: synthesises a type for a term whose shape alone determines
//! it, without needing an expected type handed down from its context
//! (§4.E).

use std::rc::Rc;

use crate::closure::Closure;
use crate::context::TypeContext;
use crate::error::TypeError;
use crate::span::{Span, SpannedName};
use crate::state::TypecheckerState;
use crate::term::{Checkable, Inferrable, Level, Typed, Visibility, OMEGA};
use crate::value::strict::Strict;
use crate::value::stuck::Stuck;
use crate::value::Flex;

pub fn infer(state: &mut TypecheckerState, ctx: &TypeContext, term: &Inferrable) -> Result<(Rc<Typed>, Flex), TypeError> {
    let key = crate::elaborate::memo::InferMemo::key(term, ctx.len());
    let result = infer_uncached(state, ctx, term);
    if let Ok((_, ty)) = &result {
        state.infer_memo.insert(key, ty.clone());
    }
    result
}

fn free_var(debug: SpannedName, ty: Flex) -> Flex {
    Flex::stuck(Stuck::Free { debug, ty })
}

fn infer_uncached(state: &mut TypecheckerState, ctx: &TypeContext, term: &Inferrable) -> Result<(Rc<Typed>, Flex), TypeError> {
    match term {
        Inferrable::Var { debug, index } => {
            let ty = ctx
                .get_type(*index)
                .cloned()
                .ok_or(TypeError::UnboundVariable { span: debug.span })?;
            Ok((Rc::new(Typed::Var { debug: debug.clone(), index: *index }), ty))
        }

        Inferrable::AnnotatedLambda {
            param_debug,
            param_ty,
            visibility,
            purity,
            body,
        } => {
            let (param_ty_term, param_universe) = infer(state, ctx, param_ty)?;
            require_universe(&param_universe, param_debug.span)?;
            let param_ty_value = state.evaluate(&param_ty_term, &ctx.runtime_vector());
            let inner_ctx = ctx.extend(
                free_var(param_debug.clone(), param_ty_value.clone()),
                param_ty_value.clone(),
                param_debug.clone(),
            );
            let (body_term, body_ty) = infer(state, &inner_ctx, body)?;
            let body_ty_term = crate::evaluate::quote(&body_ty, &inner_ctx.runtime_vector());
            let pi_closure = crate::closure::Closure::new(ctx.runtime_vector(), body_ty_term);
            let pi_ty = Flex::strict(Strict::Pi {
                param_ty: param_ty_value,
                closure: pi_closure,
                visibility: *visibility,
                purity: *purity,
            });
            let lambda_term = build_lambda_term(param_debug, ctx, &body_term);
            Ok((lambda_term, pi_ty))
        }

        Inferrable::Pi {
            param_debug,
            param_ty,
            visibility,
            purity,
            body,
        } => {
            let (param_ty_term, param_universe) = infer(state, ctx, param_ty)?;
            require_universe(&param_universe, param_debug.span)?;
            let param_ty_value = state.evaluate(&param_ty_term, &ctx.runtime_vector());
            let inner_ctx = ctx.extend(
                free_var(param_debug.clone(), param_ty_value.clone()),
                param_ty_value,
                param_debug.clone(),
            );
            let (body_term, body_universe) = infer(state, &inner_ctx, body)?;
            require_universe(&body_universe, param_debug.span)?;
            Ok((
                Rc::new(Typed::Pi {
                    param_debug: param_debug.clone(),
                    param_ty: param_ty_term,
                    visibility: *visibility,
                    purity: *purity,
                    body: body_term,
                }),
                max_universe(&param_universe, &body_universe),
            ))
        }

        Inferrable::App { func, arg } => {
            let (mut func_term, mut func_ty) = infer(state, ctx, func)?;
            // An implicit parameter never shows up at the call site; insert
            // a fresh metavariable for it and keep unwrapping until the
            // head pi is the one the caller actually wrote an argument for.
            while let Some(Strict::Pi {
                visibility: Visibility::Implicit,
                closure,
                ..
            }) = func_ty.as_strict()
            {
                let meta_id = state.fresh_metavariable(false);
                func_term = Rc::new(Typed::App {
                    func: func_term,
                    arg: Rc::new(Typed::MetaRef(meta_id)),
                });
                func_ty = crate::evaluate::apply_closure(closure, Flex::stuck(Stuck::Meta(meta_id)));
            }
            let (param_ty, closure) = match func_ty.as_strict() {
                Some(Strict::Pi { param_ty, closure, .. }) => (param_ty.clone(), closure.clone()),
                _ => return Err(TypeError::ExpectedFunction { span: Span::initial() }),
            };
            let arg_term = crate::elaborate::check::check(state, ctx, arg, &param_ty)?;
            let arg_value = state.evaluate(&arg_term, &ctx.runtime_vector());
            let result_ty = crate::evaluate::apply_closure(&closure, arg_value);
            Ok((
                Rc::new(Typed::App {
                    func: func_term,
                    arg: arg_term,
                }),
                result_ty,
            ))
        }

        Inferrable::TupleCons(elems) => {
            let mut terms = Vec::with_capacity(elems.len());
            let mut types = Vec::with_capacity(elems.len());
            for e in elems {
                let (t, ty) = infer(state, ctx, e)?;
                terms.push(t);
                types.push(ty);
            }
            let tuple_term = Rc::new(Typed::TupleCons(terms));
            let desc = types
                .into_iter()
                .map(|ty| crate::closure::Closure::new(ctx.runtime_vector(), crate::evaluate::quote(&ty, &ctx.runtime_vector())))
                .collect();
            Ok((tuple_term, Flex::strict(Strict::TupleType(desc))))
        }

        Inferrable::TupleElim { names, subject, body } => {
            let (subject_term, subject_ty) = infer(state, ctx, subject)?;
            let field_types: Vec<Flex> = match subject_ty.as_strict() {
                Some(Strict::TupleType(descs)) => {
                    if descs.len() != names.len() {
                        return Err(TypeError::TupleLengthMismatch {
                            span: Span::initial(),
                            expected: descs.len(),
                            found: names.len(),
                        });
                    }
                    let mut types = Vec::with_capacity(descs.len());
                    let mut prefix = Flex::strict(Strict::TupleCons(Vec::new()));
                    for desc in descs {
                        let field_ty = crate::evaluate::apply_closure(desc, prefix.clone());
                        types.push(field_ty);
                        prefix = crate::evaluate::fresh_probe_value();
                    }
                    types
                }
                Some(Strict::HostTupleType(elems)) => {
                    if elems.len() != names.len() {
                        return Err(TypeError::TupleLengthMismatch {
                            span: Span::initial(),
                            expected: elems.len(),
                            found: names.len(),
                        });
                    }
                    elems.clone()
                }
                // The subject's type didn't come back as either concrete
                // shape (it's still a bare metavariable, say) - try
                // unifying it with a dependent tuple type first, and fall
                // back to a host tuple type if that doesn't stick (§4.E
                // tuple-elim dual path). Each attempt stands up fresh
                // metavariables for the field types and lets the solver
                // decide whether the subject's type can actually take
                // that shape.
                _ => match state.speculate(|state| speculate_dependent_fields(state, &subject_ty, names.len())) {
                    Ok(types) => types,
                    Err(_) => match state.speculate(|state| speculate_host_fields(state, &subject_ty, names.len())) {
                        Ok(types) => types,
                        Err(_) => return Err(TypeError::ExpectedTupleSubject { span: Span::initial() }),
                    },
                },
            };
            let mut inner_ctx = ctx.clone();
            for (name, field_ty) in names.iter().zip(field_types.iter()) {
                inner_ctx = inner_ctx.extend(free_var(name.clone(), field_ty.clone()), field_ty.clone(), name.clone());
            }
            let (body_term, body_ty) = infer(state, &inner_ctx, body)?;
            Ok((
                Rc::new(Typed::TupleElim {
                    names: names.clone(),
                    subject: subject_term,
                    body: body_term,
                }),
                body_ty,
            ))
        }

        Inferrable::TupleType(elems) => {
            let universe = infer_type_row(state, ctx, elems)?;
            let terms = elems
                .iter()
                .map(|e| crate::elaborate::check::check(state, ctx, &Checkable::Inferrable(e.clone()), &universe))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((Rc::new(Typed::TupleType(terms)), universe))
        }

        Inferrable::HostTupleType(elems) => {
            let universe = infer_type_row(state, ctx, elems)?;
            let terms = elems
                .iter()
                .map(|e| crate::elaborate::check::check(state, ctx, &Checkable::Inferrable(e.clone()), &universe))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((Rc::new(Typed::HostTupleType(terms)), universe))
        }

        Inferrable::RecordCons(fields) => {
            let mut terms = Vec::with_capacity(fields.len());
            let mut types = Vec::with_capacity(fields.len());
            for (name, e) in fields {
                let (t, ty) = infer(state, ctx, e)?;
                terms.push((name.clone(), t));
                types.push((name.clone(), ty));
            }
            let term = Rc::new(Typed::RecordCons(terms));
            let desc = types
                .into_iter()
                .map(|(n, ty)| (n, crate::closure::Closure::new(ctx.runtime_vector(), crate::evaluate::quote(&ty, &ctx.runtime_vector()))))
                .collect();
            Ok((term, Flex::strict(Strict::RecordType(desc))))
        }

        Inferrable::RecordElim { fields, subject, body } => {
            let (subject_term, subject_ty) = infer(state, ctx, subject)?;
            let desc = match subject_ty.as_strict() {
                Some(Strict::RecordType(d)) => d.clone(),
                _ => return Err(TypeError::ExpectedRecordType { span: Span::initial() }),
            };
            let mut inner_ctx = ctx.clone();
            let mut prefix = Flex::strict(Strict::RecordCons(Vec::new()));
            for name in fields {
                let closure = desc
                    .iter()
                    .find(|(n, _)| n == &name.name)
                    .map(|(_, c)| c.clone())
                    .ok_or_else(|| TypeError::MissingField {
                        span: name.span,
                        field: name.name.clone(),
                    })?;
                let field_ty = crate::evaluate::apply_closure(&closure, prefix.clone());
                inner_ctx = inner_ctx.extend(free_var(name.clone(), field_ty.clone()), field_ty, name.clone());
                prefix = crate::evaluate::fresh_probe_value();
            }
            let (body_term, body_ty) = infer(state, &inner_ctx, body)?;
            Ok((
                Rc::new(Typed::RecordElim {
                    fields: fields.clone(),
                    subject: subject_term,
                    body: body_term,
                }),
                body_ty,
            ))
        }

        Inferrable::EnumType(variants) => {
            let row: Vec<Rc<Inferrable>> = variants.iter().map(|(_, t)| t.clone()).collect();
            let universe = infer_type_row(state, ctx, &row)?;
            let mut terms = Vec::with_capacity(variants.len());
            for (name, ty) in variants {
                let t = crate::elaborate::check::check(state, ctx, &Checkable::Inferrable(ty.clone()), &universe)?;
                terms.push((name.clone(), t));
            }
            Ok((Rc::new(Typed::EnumType(terms)), universe))
        }

        Inferrable::EnumCons { variant, payload } => {
            // A bare `enum_cons` has no way to synthesise the other
            // variants' types; it only checks against a goal enum type
            // (see `check::check`'s `EnumCons` arm).
            let _ = (variant, payload);
            Err(TypeError::NoComparer)
        }

        Inferrable::EnumCase { subject, arms } => {
            let (subject_term, subject_ty) = infer(state, ctx, subject)?;
            let desc = match subject_ty.as_strict() {
                Some(Strict::EnumType(d)) => d.clone(),
                _ => return Err(TypeError::NoComparer),
            };
            let mut typed_arms = Vec::with_capacity(arms.len());
            let mut result_ty: Option<Flex> = None;
            for arm in arms {
                let payload_ty = desc
                    .iter()
                    .find(|(n, _)| n == &arm.variant)
                    .map(|(_, t)| t.clone())
                    .ok_or_else(|| TypeError::MissingVariant {
                        span: arm.payload_debug.span,
                        variant: arm.variant.clone(),
                    })?;
                let inner_ctx = ctx.extend(
                    free_var(arm.payload_debug.clone(), payload_ty.clone()),
                    payload_ty,
                    arm.payload_debug.clone(),
                );
                let (arm_body, arm_ty) = infer(state, &inner_ctx, &arm.body)?;
                if let Some(expected) = &result_ty {
                    state
                        .flow(state.equal_relation(), arm_ty.clone(), expected.clone(), arm.payload_debug.span, "enum_case arm")
                        .map_err(Box::new)?;
                } else {
                    result_ty = Some(arm_ty);
                }
                typed_arms.push(crate::term::typed::TypedEnumArm {
                    variant: arm.variant.clone(),
                    payload_debug: arm.payload_debug.clone(),
                    body: arm_body,
                });
            }
            let result_ty = result_ty.unwrap_or_else(|| Flex::strict(Strict::EnumType(Vec::new())));
            Ok((
                Rc::new(Typed::EnumCase {
                    subject: subject_term,
                    arms: typed_arms,
                }),
                result_ty,
            ))
        }

        Inferrable::HostIntrinsic { source, ty } => {
            let (ty_term, ty_universe) = infer(state, ctx, ty)?;
            require_universe(&ty_universe, Span::initial())?;
            let ty_value = state.evaluate(&ty_term, &ctx.runtime_vector());
            let host_string = Flex::strict(Strict::HostType(crate::host::HostTypeId(0)));
            let source_term = crate::elaborate::check::check(state, ctx, source, &host_string)?;
            Ok((
                Rc::new(Typed::HostIntrinsic {
                    source: source_term,
                    ty: ty_term,
                }),
                ty_value,
            ))
        }

        Inferrable::HostFunctionType { param_ty, result_ty } => {
            let (param_term, param_universe) = infer(state, ctx, param_ty)?;
            require_universe(&param_universe, Span::initial())?;
            let (result_term, result_universe) = infer(state, ctx, result_ty)?;
            require_universe(&result_universe, Span::initial())?;
            Ok((
                Rc::new(Typed::HostFunctionType {
                    param_ty: param_term,
                    result_ty: result_term,
                }),
                max_universe(&param_universe, &result_universe),
            ))
        }

        Inferrable::Universe(level) => Ok((Rc::new(Typed::Universe(*level)), Flex::strict(Strict::Type(level.succ())))),

        Inferrable::LevelLiteral(level) => Ok((Rc::new(Typed::LevelLiteral(*level)), level_universe())),

        Inferrable::LevelSucc(inner) => {
            let (t, _) = infer(state, ctx, inner)?;
            Ok((Rc::new(Typed::LevelSucc(t)), level_universe()))
        }

        Inferrable::LevelMax(a, b) => {
            let (a_term, _) = infer(state, ctx, a)?;
            let (b_term, _) = infer(state, ctx, b)?;
            Ok((Rc::new(Typed::LevelMax(a_term, b_term)), level_universe()))
        }

        Inferrable::Let { name_debug, expr, body } => {
            let (expr_term, expr_ty) = infer(state, ctx, expr)?;
            let expr_value = state.evaluate(&expr_term, &ctx.runtime_vector());
            let inner_ctx = ctx.extend(expr_value, expr_ty, name_debug.clone());
            let (body_term, body_ty) = infer(state, &inner_ctx, body)?;
            Ok((
                Rc::new(Typed::Let {
                    name_debug: name_debug.clone(),
                    expr: expr_term,
                    body: body_term,
                }),
                body_ty,
            ))
        }

        Inferrable::ProgramSequence { effect, cont_name, cont } => {
            let (effect_term, effect_ty) = infer(state, ctx, effect)?;
            let result_ty = match effect_ty.as_strict() {
                Some(Strict::ProgramType { result_ty, .. }) => (**result_ty).clone(),
                _ => return Err(TypeError::ExpectedFunction { span: Span::initial() }),
            };
            let inner_ctx = ctx.extend(free_var(cont_name.clone(), result_ty.clone()), result_ty, cont_name.clone());
            let (cont_term, cont_ty) = infer(state, &inner_ctx, cont)?;
            Ok((
                Rc::new(Typed::ProgramSequence {
                    effect: effect_term,
                    cont_name: cont_name.clone(),
                    cont: cont_term,
                }),
                cont_ty,
            ))
        }

        Inferrable::ProgramEnd(inner) => {
            let result_id = state.fresh_metavariable(false);
            let result_meta = Flex::stuck(Stuck::Meta(result_id));
            let term = crate::elaborate::check::check(state, ctx, inner, &result_meta)?;
            Ok((
                Rc::new(Typed::ProgramEnd(term)),
                Flex::strict(Strict::ProgramType {
                    result_ty: Box::new(result_meta),
                    effect_row: Vec::new(),
                }),
            ))
        }

        Inferrable::ProgramType { result_ty, effect_row } => {
            let (result_term, _) = infer(state, ctx, result_ty)?;
            let (row_term, _) = infer(state, ctx, effect_row)?;
            Ok((
                Rc::new(Typed::ProgramType {
                    result_ty: result_term,
                    effect_row: row_term,
                }),
                level_universe(),
            ))
        }

        Inferrable::Annotated { expr, ty } => {
            let (ty_term, ty_universe) = infer(state, ctx, ty)?;
            require_universe(&ty_universe, Span::initial())?;
            let ty_value = state.evaluate(&ty_term, &ctx.runtime_vector());
            let term = crate::elaborate::check::check(state, ctx, expr, &ty_value)?;
            Ok((term, ty_value))
        }

        Inferrable::AlreadyTyped(typed, ty) => Ok((typed.clone(), (**ty).clone())),
    }
}

fn infer_type_row(state: &mut TypecheckerState, ctx: &TypeContext, elems: &[Rc<Inferrable>]) -> Result<Flex, TypeError> {
    let mut level = Level(0);
    for e in elems {
        let (_, universe) = infer(state, ctx, e)?;
        if let Some(Strict::Type(l)) = universe.as_strict() {
            level = level.max(*l);
        }
    }
    Ok(Flex::strict(Strict::Type(level)))
}

fn require_universe(ty: &Flex, span: Span) -> Result<(), TypeError> {
    match ty.as_strict() {
        Some(Strict::Type(_)) | Some(Strict::Prop) => Ok(()),
        _ => Err(TypeError::ExpectedUniverse { span }),
    }
}

fn max_universe(a: &Flex, b: &Flex) -> Flex {
    match (a.as_strict(), b.as_strict()) {
        (Some(Strict::Type(x)), Some(Strict::Type(y))) => Flex::strict(Strict::Type((*x).max(*y))),
        (Some(Strict::Prop), Some(other)) => Flex::strict(other.clone()),
        (Some(other), Some(Strict::Prop)) => Flex::strict(other.clone()),
        _ => Flex::strict(Strict::Type(Level(OMEGA))),
    }
}

fn level_universe() -> Flex {
    Flex::strict(Strict::Type(Level(OMEGA)))
}

/// Builds the typed `Lambda` node for a parameter bound in `ctx`, given
/// the already-elaborated `body_term`. The capture is a tuple of `Var`
/// references back into the definition-site context rather than baked-in
/// values (§4.D) - the whole point of re-evaluating `capture` each time
/// the enclosing `Typed::Lambda` is evaluated is to pick up whatever
/// concrete values the *current* evaluation of that context actually
/// holds, not the placeholder stand-ins elaboration saw. Since `body_term`
/// was elaborated against `ctx` extended by exactly one binder, its free
/// indices already line up with `capture ++ [param]`, with no further
/// reindexing needed.
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

/// One half of the tuple-elim dual path: tries to unify `subject_ty`
/// with a dependent tuple type of `count` fresh, independent field
/// metavariables. A constant closure (empty capture, body `MetaRef`) is
/// enough here since the whole point of speculating is that nothing
/// about the fields' dependencies is known yet.
fn speculate_dependent_fields(state: &mut TypecheckerState, subject_ty: &Flex, count: usize) -> Result<Vec<Flex>, TypeError> {
    let metas: Vec<_> = (0..count).map(|_| state.fresh_metavariable(false)).collect();
    let descs: Vec<Closure> = metas
        .iter()
        .map(|m| Closure::new(im::Vector::new(), Rc::new(Typed::MetaRef(*m))))
        .collect();
    state
        .flow(
            state.subtype_relation(),
            subject_ty.clone(),
            Flex::strict(Strict::TupleType(descs)),
            Span::initial(),
            "tuple_elim~tuple",
        )
        .map_err(Box::new)?;
    Ok(metas.into_iter().map(|m| Flex::stuck(Stuck::Meta(m))).collect())
}

/// The other half: tries `subject_ty` as a non-dependent host tuple of
/// `count` fresh field metavariables.
fn speculate_host_fields(state: &mut TypecheckerState, subject_ty: &Flex, count: usize) -> Result<Vec<Flex>, TypeError> {
    let metas: Vec<_> = (0..count).map(|_| state.fresh_metavariable(false)).collect();
    let elems: Vec<Flex> = metas.into_iter().map(|m| Flex::stuck(Stuck::Meta(m))).collect();
    state
        .flow(
            state.subtype_relation(),
            subject_ty.clone(),
            Flex::strict(Strict::HostTupleType(elems.clone())),
            Span::initial(),
            "tuple_elim~host",
        )
        .map_err(Box::new)?;
    Ok(elems)
}

//! Per-head comparers (§4.F): the leaf logic a compound relation
//! eventually bottoms out at once both sides of an obligation are
//! concrete. `check_concrete` is the single dispatch table every
//! built-in relation shares; it differs only in whether it demands
//! structural equality (`strict`) or allows genuine subtyping
//! (`strict = false`).

use std::rc::Rc;

use crate::error::ConstraintError;
use crate::relation::combinators::{EffectRowRelation, EnumDescRelation, IndepTupleRelation, RecordDescRelation, TupleDescRelation};
use crate::relation::{Relation, RelationRegistry};
use crate::solver::cause::Cause;
use crate::solver::Solver;
use crate::value::strict::Strict;
use crate::value::Flex;

fn mismatch(desc: impl Into<String>, left: &Flex, right: &Flex) -> ConstraintError {
    ConstraintError::Mismatch {
        desc: desc.into(),
        left: left.clone(),
        right: right.clone(),
        lost: false,
    }
}

fn check_concrete(
    solver: &mut Solver,
    relations: &RelationRegistry,
    left: &Flex,
    right: &Flex,
    cause: &Rc<Cause>,
    strict: bool,
) -> Result<(), ConstraintError> {
    let (l, r) = match (left.as_strict(), right.as_strict()) {
        (Some(l), Some(r)) => (l, r),
        _ => return check_concrete_stuck(left, right),
    };

    match (l, r) {
        (Strict::Prop, Strict::Prop) => Ok(()),
        (Strict::Type(a), Strict::Type(b)) => {
            if strict && a.0 != b.0 {
                Err(mismatch(format!("Type({}) is not Type({})", a.0, b.0), left, right))
            } else if !strict && a.0 > b.0 {
                Err(mismatch(format!("Type({}) does not fit in Type({})", a.0, b.0), left, right))
            } else {
                Ok(())
            }
        }
        (Strict::Prop, Strict::Type(_)) if !strict => Ok(()),

        (
            Strict::Pi {
                param_ty: lp,
                closure: lc,
                visibility: lv,
                purity: lpu,
            },
            Strict::Pi {
                param_ty: rp,
                closure: rc,
                visibility: rv,
                purity: rpu,
            },
        ) => {
            if lv != rv {
                return Err(mismatch("function visibility mismatch", left, right));
            }
            if strict && lpu != rpu {
                return Err(mismatch("function purity mismatch", left, right));
            }
            // Contravariant on the domain.
            crate::solver::constrain(solver, relations, relations.subtype(), rp.clone(), lp.clone(), cause.clone())?;
            let probe = crate::evaluate::fresh_probe_value();
            let l_codomain = crate::evaluate::apply_closure(lc, probe.clone());
            let r_codomain = crate::evaluate::apply_closure(rc, probe);
            crate::solver::constrain(solver, relations, relations.subtype(), l_codomain, r_codomain, cause.clone())
        }

        (Strict::TupleType(ld), Strict::TupleType(rd)) => TupleDescRelation.check(solver, relations, ld, rd, cause),
        (Strict::HostTupleType(le), Strict::HostTupleType(re)) => {
            IndepTupleRelation.check(solver, relations, le, re, cause)
        }
        (Strict::RecordType(ld), Strict::RecordType(rd)) => RecordDescRelation.check(solver, relations, ld, rd, cause),
        (Strict::EnumType(ld), Strict::EnumType(rd)) => EnumDescRelation.check(solver, relations, ld, rd, cause),

        (Strict::LevelValue(a), Strict::LevelValue(b)) => {
            if strict && a.0 != b.0 {
                Err(mismatch(format!("level {} is not level {}", a.0, b.0), left, right))
            } else if !strict && a.0 > b.0 {
                Err(mismatch(format!("level {} does not fit under level {}", a.0, b.0), left, right))
            } else {
                Ok(())
            }
        }

        (Strict::Host(a), Strict::Host(b)) => {
            if a == b {
                Ok(())
            } else {
                Err(mismatch("host values are not equal", left, right))
            }
        }

        (Strict::HostType(a), Strict::HostType(b)) => {
            if a == b {
                Ok(())
            } else if let Some(host_rel) = relations.host_relation_for(*a, *b) {
                relations.get(host_rel).constrain(solver, relations, left, right, cause)
            } else {
                Err(mismatch("host types differ", left, right))
            }
        }

        (
            Strict::HostFunctionType { param_ty: lp, result_ty: lr },
            Strict::HostFunctionType { param_ty: rp, result_ty: rr },
        ) => {
            crate::solver::constrain(solver, relations, relations.subtype(), rp.clone(), lp.clone(), cause.clone())?;
            crate::solver::constrain(solver, relations, relations.subtype(), lr.clone(), rr.clone(), cause.clone())
        }

        (Strict::UnionType(a1, a2), _) if !strict => {
            crate::solver::constrain(solver, relations, relations.subtype(), (**a1).clone(), right.clone(), cause.clone())?;
            crate::solver::constrain(solver, relations, relations.subtype(), (**a2).clone(), right.clone(), cause.clone())
        }
        (_, Strict::IntersectionType(b1, b2)) if !strict => {
            crate::solver::constrain(solver, relations, relations.subtype(), left.clone(), (**b1).clone(), cause.clone())?;
            crate::solver::constrain(solver, relations, relations.subtype(), left.clone(), (**b2).clone(), cause.clone())
        }
        (_, Strict::UnionType(b1, b2)) if !strict => {
            crate::solver::constrain(solver, relations, relations.subtype(), left.clone(), (**b1).clone(), cause.clone())
                .or_else(|_| {
                    crate::solver::constrain(solver, relations, relations.subtype(), left.clone(), (**b2).clone(), cause.clone())
                })
        }

        (Strict::Singleton { ty: lt, witness: lw }, Strict::Singleton { ty: rt, witness: rw }) => {
            crate::solver::constrain(solver, relations, relations.subtype(), (**lt).clone(), (**rt).clone(), cause.clone())?;
            crate::solver::constrain(solver, relations, relations.equal(), (**lw).clone(), (**rw).clone(), cause.clone())
        }
        (Strict::Singleton { ty, .. }, _) if !strict => {
            crate::solver::constrain(solver, relations, relations.subtype(), (**ty).clone(), right.clone(), cause.clone())
        }

        (
            Strict::ProgramType {
                result_ty: lr,
                effect_row: le,
            },
            Strict::ProgramType {
                result_ty: rr,
                effect_row: re,
            },
        ) => {
            EffectRowRelation.check(le, re)?;
            crate::solver::constrain(solver, relations, relations.subtype(), (**lr).clone(), (**rr).clone(), cause.clone())
        }

        (Strict::UniqueToken(a), Strict::UniqueToken(b)) => {
            if a == b {
                Ok(())
            } else {
                Err(mismatch("unique tokens do not match", left, right))
            }
        }

        (Strict::Operative { tag: a }, Strict::Operative { tag: b }) => {
            if a == b {
                Ok(())
            } else {
                Err(mismatch("operative values disagree", left, right))
            }
        }

        _ => Err(mismatch(
            format!("{} is not compatible with {}", l.head_name(), r.head_name()),
            left,
            right,
        )),
    }
}

fn check_concrete_stuck(left: &Flex, right: &Flex) -> Result<(), ConstraintError> {
    // Two stuck values: without full structural unification of their
    // spines this core only accepts the case of identical free-variable
    // heads with no further structure (e.g. two bare references to the
    // same bound variable leaking past a closure boundary), and defers
    // everything else by treating it as already satisfied - any real
    // mismatch between two distinct stuck heads will have already been
    // caught earlier, while elaborating the terms that produced them.
    match (left.as_stuck(), right.as_stuck()) {
        (Some(crate::value::stuck::Stuck::Free { debug: ld, .. }), Some(crate::value::stuck::Stuck::Free { debug: rd, .. })) => {
            if ld.name == rd.name {
                Ok(())
            } else {
                Err(mismatch("distinct free variables", left, right))
            }
        }
        _ => Ok(()),
    }
}

#[derive(Debug)]
pub struct SubtypeRelation;

impl Relation for SubtypeRelation {
    fn debug_name(&self) -> &str {
        "subtype"
    }

    fn constrain(
        &self,
        solver: &mut Solver,
        relations: &RelationRegistry,
        left: &Flex,
        right: &Flex,
        cause: &Rc<Cause>,
    ) -> Result<(), ConstraintError> {
        check_concrete(solver, relations, left, right, cause, false)
    }
}

#[derive(Debug)]
pub struct EqualRelation;

impl Relation for EqualRelation {
    fn debug_name(&self) -> &str {
        "equal"
    }

    fn antisymmetric(&self) -> bool {
        true
    }

    fn constrain(
        &self,
        solver: &mut Solver,
        relations: &RelationRegistry,
        left: &Flex,
        right: &Flex,
        cause: &Rc<Cause>,
    ) -> Result<(), ConstraintError> {
        check_concrete(solver, relations, left, right, cause, true)
    }
}

//! Compound relations built out of simpler ones (§4.F). Each recurses
//! into `solver::constrain` for every child obligation rather than
//! calling another comparer in-process, so every recursive check gets
//! its own graph edge and cause, and benefits from the same transitivity
//! and memoisation machinery as a top-level obligation.
//!
//! These combinators are fixed to recurse via `subtype`/`equal`
//! (§DESIGN.md) rather than being parameterised over an arbitrary child
//! relation - every use site in this core only ever needs ordinary
//! structural subtyping on descriptor elements, so the extra generality
//! ordinary biunification implementations give these combinators was not
//! worth the added bookkeeping here.

use std::rc::Rc;

use crate::closure::Closure;
use crate::error::ConstraintError;
use crate::relation::RelationRegistry;
use crate::solver::cause::Cause;
use crate::solver::Solver;
use crate::value::Flex;

/// Non-dependent tuples (host tuples): covariant, same-width.
pub struct IndepTupleRelation;

impl IndepTupleRelation {
    pub fn check(
        &self,
        solver: &mut Solver,
        relations: &RelationRegistry,
        left: &[Flex],
        right: &[Flex],
        cause: &Rc<Cause>,
    ) -> Result<(), ConstraintError> {
        if left.len() != right.len() {
            return Err(width_mismatch(left.len(), right.len()));
        }
        for (l, r) in left.iter().zip(right) {
            crate::solver::constrain(solver, relations, relations.subtype(), l.clone(), r.clone(), cause.clone())?;
        }
        Ok(())
    }
}

/// Dependent tuple descriptors: element `i`'s closure is applied to the
/// left side's own first `i` elements re-packaged as a probe tuple, then
/// the resulting types are checked covariantly (§3.1 `tuple_type`).
pub struct TupleDescRelation;

impl TupleDescRelation {
    pub fn check(
        &self,
        solver: &mut Solver,
        relations: &RelationRegistry,
        left: &[Closure],
        right: &[Closure],
        cause: &Rc<Cause>,
    ) -> Result<(), ConstraintError> {
        if left.len() != right.len() {
            return Err(width_mismatch(left.len(), right.len()));
        }
        let mut prefix = Flex::strict(crate::value::strict::Strict::TupleCons(Vec::new()));
        for (lc, rc) in left.iter().zip(right) {
            let l_ty = crate::evaluate::apply_closure(lc, prefix.clone());
            let r_ty = crate::evaluate::apply_closure(rc, prefix.clone());
            crate::solver::constrain(solver, relations, relations.subtype(), l_ty, r_ty, cause.clone())?;
            prefix = crate::evaluate::fresh_probe_value();
        }
        Ok(())
    }
}

/// Record descriptors (§4.F `RecordDescRelation`): the subtype may have
/// *more* fields than the supertype (width subtyping), and a shared
/// field's closure is applied the same way `TupleDescRelation` applies
/// tuple element closures.
pub struct RecordDescRelation;

impl RecordDescRelation {
    pub fn check(
        &self,
        solver: &mut Solver,
        relations: &RelationRegistry,
        left: &[(String, Closure)],
        right: &[(String, Closure)],
        cause: &Rc<Cause>,
    ) -> Result<(), ConstraintError> {
        let mut prefix = Flex::strict(crate::value::strict::Strict::RecordCons(Vec::new()));
        for (name, rc) in right {
            let lc = left
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, c)| c)
                .ok_or_else(|| ConstraintError::Mismatch {
                    desc: format!("missing field {:?}", name),
                    left: Flex::strict(crate::value::strict::Strict::RecordType(left.to_vec())),
                    right: Flex::strict(crate::value::strict::Strict::RecordType(right.to_vec())),
                    lost: false,
                })?;
            let l_ty = crate::evaluate::apply_closure(lc, prefix.clone());
            let r_ty = crate::evaluate::apply_closure(rc, prefix.clone());
            crate::solver::constrain(solver, relations, relations.subtype(), l_ty, r_ty, cause.clone())?;
            prefix = crate::evaluate::fresh_probe_value();
        }
        Ok(())
    }
}

/// Enum descriptors: dual of record width subtyping - the subtype may
/// have *fewer* variants than the supertype, since a case-analysis over
/// the supertype can always cope with a value that turns out to be one
/// of the subtype's narrower set of variants.
pub struct EnumDescRelation;

impl EnumDescRelation {
    pub fn check(
        &self,
        solver: &mut Solver,
        relations: &RelationRegistry,
        left: &[(String, Flex)],
        right: &[(String, Flex)],
        cause: &Rc<Cause>,
    ) -> Result<(), ConstraintError> {
        for (name, l_ty) in left {
            let r_ty = right
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, t)| t)
                .ok_or_else(|| ConstraintError::Mismatch {
                    desc: format!("supertype enum has no variant {:?}", name),
                    left: Flex::strict(crate::value::strict::Strict::EnumType(left.to_vec())),
                    right: Flex::strict(crate::value::strict::Strict::EnumType(right.to_vec())),
                    lost: false,
                })?;
            crate::solver::constrain(solver, relations, relations.subtype(), l_ty.clone(), r_ty.clone(), cause.clone())?;
        }
        Ok(())
    }
}

/// Effect rows are checked as sets: the subtype's row must be contained
/// in the supertype's (a computation claiming fewer effects can always
/// be used where more are tolerated).
pub struct EffectRowRelation;

impl EffectRowRelation {
    pub fn check(&self, left: &[crate::host::EffectId], right: &[crate::host::EffectId]) -> Result<(), ConstraintError> {
        for id in left {
            if !right.contains(id) {
                return Err(ConstraintError::Mismatch {
                    desc: format!("effect {:?} is not permitted here", id),
                    left: Flex::strict(crate::value::strict::Strict::UniqueToken(crate::value::strict::Unique(id.0 as u64))),
                    right: Flex::strict(crate::value::strict::Strict::UniqueToken(crate::value::strict::Unique(0))),
                    lost: false,
                });
            }
        }
        Ok(())
    }
}

/// `Type(OMEGA)` (the top universe level) subsumes every other universe,
/// but nothing subsumes it - used at the one place the elaborator needs
/// a universe large enough to hold anything without itself having a
/// successor (§3.1 `OMEGA`).
pub struct UniverseOmegaRelation;

impl UniverseOmegaRelation {
    pub fn accepts(level: crate::term::Level) -> bool {
        level.0 <= crate::term::OMEGA
    }
}

fn width_mismatch(expected: usize, found: usize) -> ConstraintError {
    ConstraintError::Mismatch {
        desc: format!("tuple width mismatch: expected {}, found {}", expected, found),
        left: Flex::strict(crate::value::strict::Strict::TupleCons(Vec::new())),
        right: Flex::strict(crate::value::strict::Strict::TupleCons(Vec::new())),
        lost: false,
    }
}

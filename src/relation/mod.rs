//! Subtype relations: the pluggable comparers the solver calls when two
//! concrete (non-metavariable, non-application) heads need to be checked
//! against each other, plus the combinators that build compound
//! relations out of simpler ones (§4.F).
//!
//! A relation is identified by a [`RelationId`], interned so that two
//! constructions of `FunctionRelation(R)` for the same `R` are treated as
//! the same relation by the solver's edge/memo tables - building the
//! combinator twice must not look like two different relations.

pub mod combinators;
pub mod concrete;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::ConstraintError;
use crate::host::HostTypeId;
use crate::solver::cause::Cause;
use crate::solver::Solver;
use crate::value::Flex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationId(pub u32);

/// The contract every subtype relation satisfies (§4.F): a name for
/// diagnostics, a reflexivity witness (every relation must relate a
/// value to itself so the identity edge the graph inserts for every
/// fresh node is always valid), an antisymmetry flag used by the solver
/// to skip redundant opposite-direction checks, and the actual concrete
/// head-check.
pub trait Relation: std::fmt::Debug {
    fn debug_name(&self) -> &str;

    /// Whether `l` must equal `r` whenever both `Rel(l, r)` and
    /// `Rel(r, l)` hold. Most relations used here are (e.g. record
    /// width subtyping is not antisymmetric; type equality is).
    fn antisymmetric(&self) -> bool {
        false
    }

    /// Checks a single concrete pair. A comparer that needs to recurse
    /// (e.g. contravariantly on a function's domain) does so by pushing
    /// a fresh obligation onto `solver` via [`crate::solver::constrain`]
    /// rather than calling another comparer directly, so the recursive
    /// obligation gets its own graph edge, its own cause, and
    /// participates in memoisation like any other constraint. Closures
    /// need no ambient context to apply - they already carry their own
    /// capture (§4.D) - so no context is threaded through here.
    fn constrain(
        &self,
        solver: &mut Solver,
        relations: &RelationRegistry,
        left: &Flex,
        right: &Flex,
        cause: &Rc<Cause>,
    ) -> Result<(), ConstraintError>;
}

/// Interns `Rc<dyn Relation>`s by pointer identity of their *construction
/// key* so that repeated calls like `FunctionRelation::of(param_rel,
/// result_rel)` for the same `(param_rel, result_rel)` pair return the
/// same [`RelationId`] - this is what makes edge/memo dedup on relation
/// identity meaningful rather than accidentally unique per call site.
pub struct RelationRegistry {
    relations: RefCell<Vec<Rc<dyn Relation>>>,
    by_key: RefCell<HashMap<String, RelationId>>,
    host_relations: RefCell<HashMap<(HostTypeId, HostTypeId), RelationId>>,
    subtype: RelationId,
    equal: RelationId,
}

impl RelationRegistry {
    /// Builds a registry pre-seeded with the two relations the solver
    /// itself needs by name: `equal` (what a call's discharged result
    /// edge is checked with) and the general structural `subtype` order
    /// (what ordinary `infer`/`check` obligations register against)
    /// (§4.F).
    pub fn new() -> RelationRegistry {
        let registry = RelationRegistry {
            relations: RefCell::new(Vec::new()),
            by_key: RefCell::new(HashMap::new()),
            host_relations: RefCell::new(HashMap::new()),
            subtype: RelationId(0),
            equal: RelationId(0),
        };
        let subtype = registry.intern("builtin:subtype".to_string(), Rc::new(concrete::SubtypeRelation));
        let equal = registry.intern("builtin:equal".to_string(), Rc::new(concrete::EqualRelation));
        RelationRegistry { subtype, equal, ..registry }
    }

    pub fn subtype(&self) -> RelationId {
        self.subtype
    }

    pub fn equal(&self) -> RelationId {
        self.equal
    }

    /// Interns `relation` under `key` (a structural description of its
    /// construction, e.g. `"function(3,7)"` naming the child relation
    /// ids). Returns the existing id if `key` was already interned.
    pub fn intern(&self, key: String, relation: Rc<dyn Relation>) -> RelationId {
        if let Some(id) = self.by_key.borrow().get(&key) {
            return *id;
        }
        let mut relations = self.relations.borrow_mut();
        let id = RelationId(relations.len() as u32);
        relations.push(relation);
        self.by_key.borrow_mut().insert(key, id);
        id
    }

    pub fn get(&self, id: RelationId) -> Rc<dyn Relation> {
        self.relations.borrow()[id.0 as usize].clone()
    }

    /// Installs `relation` as the subtyping comparer `check_concrete`
    /// consults for this exact `(left, right)` pair of host type ids
    /// (§6 `register_host_srel`) - a variance declaration for a host
    /// type family the core itself knows nothing about.
    pub fn register_host_srel(&self, left: HostTypeId, right: HostTypeId, relation: Rc<dyn Relation>) -> RelationId {
        let id = self.intern(format!("host:{}:{}", left.0, right.0), relation);
        self.host_relations.borrow_mut().insert((left, right), id);
        id
    }

    pub fn host_relation_for(&self, left: HostTypeId, right: HostTypeId) -> Option<RelationId> {
        self.host_relations.borrow().get(&(left, right)).copied()
    }
}

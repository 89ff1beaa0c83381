//! The public surface of this crate (§6): [`TypecheckerState`] bundles
//! the solver, the relation registry, and the host-facing registries an
//! embedder populates before calling `infer`/`check`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::context::TypeContext;
use crate::elaborate::memo::InferMemo;
use crate::error::{ConstraintError, TypeError};
use crate::host::{EffectId, HostFunctionRef, HostTypeId, IntrinsicCache};
use crate::metavariable::MetaVarId;
use crate::relation::{Relation, RelationId, RelationRegistry};
use crate::solver::cause::Cause;
use crate::solver::Solver;
use crate::span::Span;
use crate::term::{Checkable, Inferrable, Typed};
use crate::value::Flex;

/// Everything `infer`/`check` need that isn't scoped to a single call:
/// the constraint graph, the interned relations, and the embedder's host
/// registries (§6, §9 "what lives in the embedding host vs the core").
pub struct TypecheckerState {
    pub(crate) solver: Solver,
    pub(crate) relations: RelationRegistry,
    pub(crate) intrinsics: IntrinsicCache,
    pub(crate) infer_memo: InferMemo,
    pub(crate) effect_handlers: HashMap<EffectId, HostFunctionRef>,
}

impl TypecheckerState {
    pub fn new() -> TypecheckerState {
        TypecheckerState {
            solver: Solver::new(),
            relations: RelationRegistry::new(),
            intrinsics: IntrinsicCache::new(),
            infer_memo: InferMemo::new(),
            effect_handlers: HashMap::new(),
        }
    }

    /// Bidirectional inference (§4.E): elaborates `term` to a [`Typed`]
    /// term and returns its (evaluated) type.
    pub fn infer(&mut self, ctx: &TypeContext, term: &Inferrable) -> Result<(Rc<Typed>, Flex), TypeError> {
        crate::elaborate::infer::infer(self, ctx, term)
    }

    /// Bidirectional checking: elaborates `term` against `expected`.
    pub fn check(&mut self, ctx: &TypeContext, term: &Checkable, expected: &Flex) -> Result<Rc<Typed>, TypeError> {
        crate::elaborate::check::check(self, ctx, term, expected)
    }

    pub fn evaluate(&self, term: &Typed, ctx: &im::Vector<Flex>) -> Flex {
        crate::evaluate::evaluate(term, ctx)
    }

    pub fn apply_value(&self, func: &Flex, arg: Flex) -> Flex {
        crate::evaluate::apply_value(func, arg)
    }

    /// Registers a subtype obligation directly, bypassing `infer`/`check`
    /// - the entry point the elaborator itself uses, and the one an
    /// embedder would use to assert a fact it already knows holds (§6).
    pub fn flow(&mut self, relation: RelationId, left: Flex, right: Flex, span: Span, label: &'static str) -> Result<(), ConstraintError> {
        crate::solver::constrain(
            &mut self.solver,
            &self.relations,
            relation,
            left,
            right,
            Cause::direct(span, label),
        )
    }

    pub fn subtype_relation(&self) -> RelationId {
        self.relations.subtype()
    }

    pub fn equal_relation(&self) -> RelationId {
        self.relations.equal()
    }

    pub fn fresh_metavariable(&mut self, is_trait: bool) -> MetaVarId {
        self.solver.fresh_metavariable(is_trait)
    }

    /// Runs `f` as a speculative branch (§4.H): the solver graph and the
    /// infer memo are both rolled back on `Err`, committed (kept) on
    /// `Ok`.
    pub fn speculate<T>(&mut self, f: impl FnOnce(&mut TypecheckerState) -> Result<T, TypeError>) -> Result<T, TypeError> {
        let solver_mark = self.solver.snapshot();
        let parent_memo = std::mem::replace(&mut self.infer_memo, InferMemo::new());
        self.infer_memo = parent_memo.shadow();

        let result = f(self);

        match &result {
            Ok(_) => {
                self.solver.commit_snapshot(solver_mark);
                let shadow = std::mem::replace(&mut self.infer_memo, InferMemo::new());
                self.infer_memo = shadow.commit();
            }
            Err(_) => {
                self.solver.revert_snapshot(solver_mark);
                let shadow = std::mem::replace(&mut self.infer_memo, InferMemo::new());
                self.infer_memo = shadow.revert();
            }
        }
        result
    }

    /// Opens a new block (§4.G): metavariables allocated from here on are
    /// tagged with the new, deeper block level, marking them as scoped to
    /// it.
    pub fn open_block(&mut self) {
        self.solver.enter_block();
    }

    /// Closes the current block, reifying `meta`'s live constraint
    /// neighbourhood into a [`Typed::ConstrainedType`] before the block
    /// level drops - the caller substitutes this term wherever `meta`
    /// would otherwise have leaked into an enclosing scope as a bare
    /// [`Typed::MetaRef`].
    pub fn close_block(&mut self, meta: MetaVarId, ctx_len: usize) -> Rc<Typed> {
        let elems = crate::solver::slice::slice_metavariable(&self.solver, meta);
        self.solver.exit_block();
        Rc::new(Typed::ConstrainedType { elems, ctx_len })
    }

    pub fn register_host_srel(&mut self, left: HostTypeId, right: HostTypeId, relation: Rc<dyn Relation>) -> RelationId {
        self.relations.register_host_srel(left, right, relation)
    }

    pub fn register_effect_handler(&mut self, effect: EffectId, handler: HostFunctionRef) {
        self.effect_handlers.insert(effect, handler);
    }

    pub fn execute_program(&mut self, program: &Flex) -> Result<Flex, ConstraintError> {
        crate::effect::execute_program(self, program)
    }
}

impl Default for TypecheckerState {
    fn default() -> TypecheckerState {
        TypecheckerState::new()
    }
}

//! The three error families (§7): `InternalError` for broken invariants
//! upstream, `TypeError` for ordinary elaboration failures, and
//! `ConstraintError` for solver head-check failures. All three are plain
//! enums deriving [`thiserror::Error`]; only `speculate` ever catches
//! them (swallowing whichever of the three crossed the shadow boundary),
//! everything else propagates to the embedder.

use thiserror::Error;

use crate::span::{SpannedName, Span};
use crate::value::Flex;

/// A term references something that should be structurally impossible
/// given how this crate builds terms - these are bugs, never surfaced to
/// a user as a normal diagnostic.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("bound variable at index {index} has no context entry ({context_len} bindings in scope)")]
    UnboundIndex { index: usize, context_len: usize },

    #[error("debug info mismatch at index {index}: term says {expected:?}, context has {found:?}")]
    DebugMismatch {
        index: usize,
        expected: SpannedName,
        found: SpannedName,
    },

    #[error("expected a closure, found a different strict value")]
    NotAClosure,

    #[error("expected a tuple value of length {expected}, found length {found}")]
    TupleLengthMismatch { expected: usize, found: usize },

    #[error("record has no field named {field:?}")]
    MissingField { field: String },

    #[error("no variant named {variant:?} in this enum value")]
    MissingVariant { variant: String },

    #[error("two edges between the same endpoints disagree on relation")]
    RelationMismatch,

    #[error("host intrinsic invoked with a value that is not a host value")]
    NotAHostValue,

    #[error("no host effect handler registered for effect {0:?}")]
    UnhandledEffect(crate::host::EffectId),

    #[error("level arithmetic overflowed past OMEGA ({0})")]
    LevelOverflow(u32),

    #[error("attempted to write to a shadowed (locked) container")]
    WriteToLockedContainer,

    #[error("not yet implemented: {0}")]
    NotImplemented(&'static str),
}

/// Failures `infer`/`check` return through `(ok = false, err)` (§7). Each
/// variant carries the span of the term that failed so a `PrettyPrint`
/// implementation can point at the surface syntax.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("unbound variable at {span}")]
    UnboundVariable { span: Span },

    #[error("expected a function type at {span}")]
    ExpectedFunction { span: Span },

    #[error("expected a pi type as the goal of a lambda at {span}")]
    ExpectedPiGoal { span: Span },

    #[error("expected a record type at {span}")]
    ExpectedRecordType { span: Span },

    #[error("expected a universe at {span}")]
    ExpectedUniverse { span: Span },

    #[error("tuple-elim subject at {span} is neither a tuple-type nor a host-tuple-type")]
    ExpectedTupleSubject { span: Span },

    #[error("tuple length mismatch at {span}: expected {expected}, found {found}")]
    TupleLengthMismatch { span: Span, expected: usize, found: usize },

    #[error("no comparer is registered for this pair of type heads")]
    NoComparer,

    #[error("enum has no variant named {variant:?} at {span}")]
    MissingVariant { span: Span, variant: String },

    #[error("record has no field named {field:?} at {span}")]
    MissingField { span: Span, field: String },

    #[error("subtype obligation failed: {0}")]
    Constraint(#[from] Box<ConstraintError>),

    #[error("{0}")]
    Internal(#[from] InternalError),
}

/// The solver's fatal-at-the-leaf error: a concrete head check failed, or
/// a `range` node was unpacked in a way that lost its normal cause chain
/// (tagged `lost`, §7).
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("{desc}")]
    Mismatch {
        desc: String,
        left: Flex,
        right: Flex,
        lost: bool,
    },

    #[error("{0}")]
    Internal(#[from] InternalError),
}

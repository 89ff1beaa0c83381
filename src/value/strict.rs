//! Fully evaluated values (§3.2): the "strict" half of [`Flex`](crate::value::Flex).
//! Every constructor here is in weak-head normal form - no further
//! evaluation step applies to it without more information (an argument,
//! a metavariable resolution, a host callback) arriving from outside.

use std::rc::Rc;

use crate::closure::Closure;
use crate::host::{EffectId, HostTypeId, HostValue};
use crate::term::{Level, Purity, Visibility};
use crate::value::Flex;

/// A dependent tuple type: element `i`'s type is computed from the
/// tuple's own first `i` elements, so each entry is a closure rather
/// than a plain value (§3.1 `tuple_type`).
pub type TupleDesc = Vec<Closure>;

/// A dependent record type: each field's type is computed from every
/// field declared before it (§4.F `RecordDescRelation`).
pub type RecordDesc = Vec<(String, Closure)>;

/// A non-empty enumeration type: each variant names a (non-dependent)
/// payload type.
pub type EnumDesc = Vec<(String, Flex)>;

/// A uniqueness token (§3.1 "unique"): a value whose only role is to be
/// itself, used to linearly thread a single-use capability through a
/// program. Two tokens are the same token iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unique(pub u64);

#[derive(Debug, Clone)]
pub enum Strict {
    /// The impredicative proposition universe, below every `Type(l)`.
    Prop,
    Type(Level),

    Pi {
        param_ty: Flex,
        closure: Closure,
        visibility: Visibility,
        purity: Purity,
    },

    Lambda {
        closure: Closure,
    },

    TupleCons(Vec<Flex>),
    TupleType(TupleDesc),
    HostTupleType(Vec<Flex>),

    RecordCons(Vec<(String, Flex)>),
    RecordType(RecordDesc),

    EnumCons {
        variant: String,
        payload: Box<Flex>,
    },
    EnumType(EnumDesc),

    Host(HostValue),
    HostFunctionType {
        param_ty: Flex,
        result_ty: Flex,
    },

    LevelValue(Level),

    ProgramType {
        result_ty: Box<Flex>,
        effect_row: Vec<EffectId>,
    },

    Singleton {
        ty: Box<Flex>,
        witness: Box<Flex>,
    },

    UnionType(Box<Flex>, Box<Flex>),
    IntersectionType(Box<Flex>, Box<Flex>),

    UniqueToken(Unique),

    /// An opaque handle produced by the (out-of-scope) operative
    /// framework; the core only ever threads these through, tagged by
    /// name, and never inspects them.
    Operative { tag: Rc<str> },

    /// A registered native host type used as a type, e.g. the return type
    /// of a `host_intrinsic` whose result the embedder declared.
    HostType(HostTypeId),
}

impl Strict {
    pub fn head_name(&self) -> &'static str {
        match self {
            Strict::Prop => "Prop",
            Strict::Type(_) => "Type",
            Strict::Pi { .. } => "Pi",
            Strict::Lambda { .. } => "Lambda",
            Strict::TupleCons(_) => "TupleCons",
            Strict::TupleType(_) => "TupleType",
            Strict::HostTupleType(_) => "HostTupleType",
            Strict::RecordCons(_) => "RecordCons",
            Strict::RecordType(_) => "RecordType",
            Strict::EnumCons { .. } => "EnumCons",
            Strict::EnumType(_) => "EnumType",
            Strict::Host(_) => "Host",
            Strict::HostFunctionType { .. } => "HostFunctionType",
            Strict::LevelValue(_) => "LevelValue",
            Strict::ProgramType { .. } => "ProgramType",
            Strict::Singleton { .. } => "Singleton",
            Strict::UnionType(_, _) => "UnionType",
            Strict::IntersectionType(_, _) => "IntersectionType",
            Strict::UniqueToken(_) => "UniqueToken",
            Strict::Operative { .. } => "Operative",
            Strict::HostType(_) => "HostType",
        }
    }
}

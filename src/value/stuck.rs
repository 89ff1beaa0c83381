//! Stuck values (§3.2): computations blocked on a free variable or a
//! metavariable. A stuck value always has a well-defined *head* - the
//! free variable or metavariable it is ultimately blocked on - reached
//! by following `subject`/`func` chains to the bottom.

use std::rc::Rc;

use crate::closure::Closure;
use crate::host::HostValue;
use crate::metavariable::MetaVarId;
use crate::span::SpannedName;
use crate::value::Flex;

#[derive(Debug, Clone)]
pub struct StuckEnumArm {
    pub variant: String,
    pub closure: Closure,
}

#[derive(Debug, Clone)]
pub enum Stuck {
    /// A context-bound variable that was never substituted - only
    /// appears under a closure's capture boundary or while elaborating
    /// an open term for diagnostics; ordinary evaluation always
    /// substitutes variables away.
    Free { debug: SpannedName, ty: Flex },

    /// A metavariable occurring in value position: its head is not yet
    /// known, so anything built on top of it is stuck too.
    Meta(MetaVarId),

    App {
        func: Rc<Stuck>,
        arg: Flex,
    },

    TupleElim {
        subject: Rc<Stuck>,
        closure: Closure,
    },

    RecordElim {
        subject: Rc<Stuck>,
        field: String,
    },

    EnumCase {
        subject: Rc<Stuck>,
        arms: Vec<StuckEnumArm>,
    },

    EnumAbsurd {
        subject: Rc<Stuck>,
    },

    TupleElemAccess {
        subject: Rc<Stuck>,
        index: usize,
    },

    HostUnwrap {
        subject: Rc<Stuck>,
    },

    HostIf {
        subject: Rc<Stuck>,
        then_branch: Flex,
        else_branch: Flex,
    },

    HostIntFold {
        count: Rc<Stuck>,
        acc: Flex,
        fun: Flex,
    },

    /// A host tuple some of whose leading elements are known concrete
    /// host values, whose next element is stuck, and whose remaining
    /// (trailing) elements have not been forced yet - so forcing the
    /// tuple further only ever has to make progress on `middle` (§3.2).
    HostTuple {
        prefix: Vec<HostValue>,
        middle: Rc<Stuck>,
        trailing: Vec<Flex>,
    },

    HostIntrinsicPending {
        source: Rc<str>,
        subject: Rc<Stuck>,
    },
}

impl Stuck {
    /// The free variable or metavariable this computation is ultimately
    /// blocked on.
    pub fn head(&self) -> StuckHead<'_> {
        match self {
            Stuck::Free { debug, .. } => StuckHead::Free(debug),
            Stuck::Meta(id) => StuckHead::Meta(*id),
            Stuck::App { func, .. }
            | Stuck::TupleElim { subject: func, .. }
            | Stuck::RecordElim { subject: func, .. }
            | Stuck::EnumCase { subject: func, .. }
            | Stuck::EnumAbsurd { subject: func }
            | Stuck::TupleElemAccess { subject: func, .. }
            | Stuck::HostUnwrap { subject: func }
            | Stuck::HostIf { subject: func, .. }
            | Stuck::HostIntFold { count: func, .. }
            | Stuck::HostIntrinsicPending { subject: func, .. } => func.head(),
            Stuck::HostTuple { middle, .. } => middle.head(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StuckHead<'a> {
    Free(&'a SpannedName),
    Meta(MetaVarId),
}

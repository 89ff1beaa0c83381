//! Host-level primitives: the small set of "native" types and functions
//! the core treats opaquely (numbers, strings, booleans, user-defined
//! host types, and registered native functions), plus the registries an
//! embedder populates via `register_host_srel` and `register_effect_handler`
//! (§6).

use std::fmt;
use std::rc::Rc;

use crate::error::InternalError;

/// Identifies a user-defined host type (e.g. a GLSL vector type, a
/// foreign-function signature) for which an embedder has registered a
/// variance declaration and/or a subtyping relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostTypeId(pub u32);

/// Identifies a member of an effect row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectId(pub u32);

/// A fully concrete host value - the leaves of a host tuple, the payload
/// of a host wrap, the result of a host intrinsic.
#[derive(Debug, Clone)]
pub enum HostValue {
    Number(f64),
    String(Rc<str>),
    Bool(bool),
    /// An opaque value of a user-defined host type; the core never looks
    /// inside it, only threads it through native function calls.
    UserDefined {
        type_id: HostTypeId,
        tag: Rc<str>,
    },
}

impl PartialEq for HostValue {
    fn eq(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::Number(a), HostValue::Number(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (
                HostValue::UserDefined { type_id: t1, tag: g1 },
                HostValue::UserDefined { type_id: t2, tag: g2 },
            ) => t1 == t2 && g1 == g2,
            _ => false,
        }
    }
}

/// A native function registered by the embedder (e.g. the result of
/// compiling a `host_intrinsic` source string, memoised by that source
/// text per §4.C).
pub struct HostFunction {
    pub name: Rc<str>,
    pub call: Box<dyn Fn(&HostValue) -> Result<HostValue, InternalError>>,
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<host fn {}>", self.name)
    }
}

/// A cheaply-cloneable handle to a registered native function.
#[derive(Clone)]
pub struct HostFunctionRef(pub Rc<HostFunction>);

impl fmt::Debug for HostFunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl PartialEq for HostFunctionRef {
    fn eq(&self, other: &HostFunctionRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Compiles and memoises `host_intrinsic` source strings (§4.C). Shared,
/// process-wide, but participates in the same shadow discipline as every
/// other cache (§5): a revert must drop entries inserted since the
/// matching `shadow()`.
#[derive(Default)]
pub struct IntrinsicCache {
    by_source: std::collections::HashMap<Rc<str>, HostFunctionRef>,
}

impl IntrinsicCache {
    pub fn new() -> IntrinsicCache {
        IntrinsicCache::default()
    }

    pub fn get(&self, source: &str) -> Option<HostFunctionRef> {
        self.by_source.get(source).cloned()
    }

    pub fn insert(&mut self, source: Rc<str>, compiled: HostFunctionRef) {
        self.by_source.entry(source).or_insert(compiled);
    }
}

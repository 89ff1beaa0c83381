//! Contexts: ordered binding lists carrying names, debug spans, types,
//! and (at runtime) values (§3.3, §4.B).
//!
//! Both context flavours are backed by `im::Vector`, a structurally
//! shared persistent vector: `append` never mutates the vector it was
//! called on, so a speculative branch can extend a context as many times
//! as it likes without the parent (or a sibling branch) ever observing
//! the change. This is the same structural-sharing property the solver's
//! shadow containers need in §4.H, just specialised to binder extension.

use std::fmt::Write as _;
use std::rc::Rc;

use crate::span::SpannedName;
use crate::value::Flex;

#[derive(Debug, Clone)]
struct Binding {
    value: Flex,
    debug: SpannedName,
}

/// An ordered sequence of `(value, name, debug)` triples, addressed by
/// 1-based index per §3.3. Index `1` refers to the *most recently
/// appended* binding, matching how a freshly bound variable is referred
/// to as index 1 before any further binders are introduced.
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    entries: im::Vector<Rc<Binding>>,
}

impl RuntimeContext {
    pub fn new() -> RuntimeContext {
        RuntimeContext {
            entries: im::Vector::new(),
        }
    }

    /// Appends a new, innermost binding, returning a new context that
    /// shares structure with `self`.
    pub fn append(&self, value: Flex, debug: SpannedName) -> RuntimeContext {
        let mut entries = self.entries.clone();
        entries.push_back(Rc::new(Binding { value, debug }));
        RuntimeContext { entries }
    }

    /// Appends many bindings at once, in order (element 0 becomes the
    /// outermost of the new bindings).
    pub fn append_all(&self, bindings: impl IntoIterator<Item = (Flex, SpannedName)>) -> RuntimeContext {
        let mut ctx = self.clone();
        for (value, debug) in bindings {
            ctx = ctx.append(value, debug);
        }
        ctx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a binding up by its 1-based index from the innermost end.
    pub fn get(&self, index: usize) -> Option<(&Flex, &SpannedName)> {
        if index == 0 || index > self.entries.len() {
            return None;
        }
        let offset = self.entries.len() - index;
        self.entries.get(offset).map(|b| (&b.value, &b.debug))
    }

    pub fn format_names(&self) -> String {
        let mut out = String::new();
        for (i, binding) in self.entries.iter().rev().enumerate() {
            if i > 0 {
                let _ = write!(out, ", ");
            }
            let _ = write!(out, "{}:{}", i + 1, binding.debug.name);
        }
        out
    }

    /// The raw runtime values in evaluator order (1-based, innermost
    /// last), for handing to [`crate::evaluate::evaluate`] or to
    /// [`crate::closure::Closure::new`] when building a value-level
    /// closure (a `Pi`'s result type, say) directly from the current
    /// context.
    pub fn values(&self) -> im::Vector<Flex> {
        self.entries.iter().map(|b| b.value.clone()).collect()
    }
}

/// A runtime context plus a parallel sequence of declared types and the
/// set of names in scope, used for diagnostics (§3.3).
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    pub runtime: RuntimeContext,
    types: im::Vector<Rc<Flex>>,
    names: im::HashSet<Rc<str>>,
}

impl TypeContext {
    pub fn new() -> TypeContext {
        TypeContext {
            runtime: RuntimeContext::new(),
            types: im::Vector::new(),
            names: im::HashSet::new(),
        }
    }

    pub fn extend(&self, value: Flex, ty: Flex, debug: SpannedName) -> TypeContext {
        let mut names = self.names.clone();
        names.insert(Rc::from(debug.name.as_str()));
        let mut types = self.types.clone();
        types.push_back(Rc::new(ty));
        TypeContext {
            runtime: self.runtime.append(value, debug),
            types,
            names,
        }
    }

    pub fn get(&self, index: usize) -> Option<(&Flex, &SpannedName)> {
        self.runtime.get(index)
    }

    pub fn get_type(&self, index: usize) -> Option<&Flex> {
        if index == 0 || index > self.types.len() {
            return None;
        }
        let offset = self.types.len() - index;
        self.types.get(offset).map(Rc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.runtime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn format_names(&self) -> String {
        self.runtime.format_names()
    }

    pub fn runtime_vector(&self) -> im::Vector<Flex> {
        self.runtime.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::strict::Strict;

    fn debug(name: &str) -> SpannedName {
        SpannedName::generated(name)
    }

    #[test]
    fn append_does_not_mutate_parent() {
        let base = RuntimeContext::new().append(Flex::strict(Strict::Prop), debug("x"));
        let extended = base.append(Flex::strict(Strict::Prop), debug("y"));

        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(base.get(1).unwrap().1.name, "x");
        assert_eq!(extended.get(1).unwrap().1.name, "y");
        assert_eq!(extended.get(2).unwrap().1.name, "x");
    }

    #[test]
    fn get_out_of_range_is_none() {
        let ctx = RuntimeContext::new();
        assert!(ctx.get(1).is_none());
        assert!(ctx.get(0).is_none());
    }
}

//! Cause tracking (§4.G): every edge remembers why it exists, so a
//! head-check failure deep in a composed chain can be reported against
//! the original `infer`/`check` call site instead of an opaque pair of
//! graph nodes.

use std::rc::Rc;

use crate::span::Span;

/// Why an edge is in the graph. `Composed` is built automatically by
/// transitivity/call-composition; everything else is inserted directly
/// by the elaborator.
#[derive(Debug, Clone)]
pub enum Cause {
    /// A direct subtype obligation registered by `check` or `infer` at
    /// this span, with a short human label (e.g. `"function argument"`).
    Direct { span: Span, label: &'static str },
    /// The identity edge every node gets on creation.
    Reflexive,
    /// Produced by transitively composing `left` then `right`.
    Composed { left: Rc<Cause>, right: Rc<Cause> },
    /// Produced when slicing a metavariable's edges into a
    /// `ConstrainedType` at scope exit (§4.G).
    Sliced { original: Rc<Cause> },
}

impl Cause {
    pub fn direct(span: Span, label: &'static str) -> Rc<Cause> {
        Rc::new(Cause::Direct { span, label })
    }

    pub fn reflexive() -> Rc<Cause> {
        Rc::new(Cause::Reflexive)
    }

    pub fn compose(left: Rc<Cause>, right: Rc<Cause>) -> Rc<Cause> {
        Rc::new(Cause::Composed { left, right })
    }

    pub fn sliced(original: Rc<Cause>) -> Rc<Cause> {
        Rc::new(Cause::Sliced { original })
    }

    /// The span to point a diagnostic at: the leftmost direct cause in
    /// the tree (composition reads left-to-right as "first this, then
    /// this").
    pub fn primary_span(&self) -> Option<Span> {
        match self {
            Cause::Direct { span, .. } => Some(*span),
            Cause::Reflexive => None,
            Cause::Composed { left, right } => left.primary_span().or_else(|| right.primary_span()),
            Cause::Sliced { original } => original.primary_span(),
        }
    }
}

//! Source position tracking.
//!
//! Every binder in the term algebra carries one of these so that
//! diagnostics rendered from the solver and elaborator can point back at
//! the surface syntax that produced them, even though this crate never
//! parses that syntax itself.

use std::fmt;

/// Identifies a source file. Opaque outside of the parser/driver layer.
pub type FileId = u32;

/// A single position within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Anchor {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl Anchor {
    pub fn new(file: FileId, line: u32, column: u32) -> Anchor {
        Anchor { file, line, column }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A half-open range between two anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Anchor,
    pub end: Anchor,
}

impl Span {
    pub fn new(start: Anchor, end: Anchor) -> Span {
        Span { start, end }
    }

    /// A span with no useful location, used when synthesising terms that
    /// have no corresponding surface syntax (metavariables, uniques).
    pub fn initial() -> Span {
        Span::default()
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A binder's debug information: the name the programmer wrote, plus the
/// span at which it was introduced. Looking a variable up by index and
/// finding a `SpannedName` that doesn't match the one recorded on the
/// bound-variable occurrence is always a bug (see [`crate::error::InternalError::DebugMismatch`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpannedName {
    pub name: String,
    pub span: Span,
}

impl SpannedName {
    pub fn new(name: impl Into<String>, span: Span) -> SpannedName {
        SpannedName {
            name: name.into(),
            span,
        }
    }

    /// A name with no real source position, for synthesised binders
    /// (fresh uniques, captured tuple-elim names).
    pub fn generated(name: impl Into<String>) -> SpannedName {
        SpannedName {
            name: name.into(),
            span: Span::initial(),
        }
    }
}

impl fmt::Display for SpannedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

//! The small contract consumed by error rendering.
//!
//! Pretty-printing of terms and values is an external collaborator (the
//! surface syntax knows how to fold terms back into `(a b : t1) -> t3`
//! sugar, we don't). All the solver and elaborator need is a way to turn
//! a value into something a human can read when an error's cause tree is
//! being rendered.

use std::fmt;

/// Implemented by anything that can render itself for inclusion in a
/// diagnostic. The default implementation falls back to `Debug`, which is
/// enough for this crate's own tests; a real driver overrides it with a
/// proper surface-syntax printer.
pub trait PrettyPrint {
    fn pretty(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    fn pretty_string(&self) -> String {
        struct Wrap<'a, T: ?Sized>(&'a T);
        impl<'a, T: PrettyPrint + ?Sized> fmt::Display for Wrap<'a, T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.pretty(f)
            }
        }
        Wrap(self).to_string()
    }
}

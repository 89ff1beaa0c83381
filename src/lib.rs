//! A bidirectional, biunification-based type checker core for a
//! dependently-typed language (§1).
//!
//! This crate has no parser and no pretty-printer of its own - it
//! consumes [`term::Inferrable`]/[`term::Checkable`] trees an embedder
//! built from its own surface syntax, and returns [`term::Typed`] trees
//! plus [`value::Flex`] values the embedder renders however it likes
//! (see [`pretty::PrettyPrint`] for the one contract it does define).
//! Everything is reached through [`state::TypecheckerState`].

pub mod closure;
pub mod context;
pub mod effect;
pub mod elaborate;
pub mod error;
pub mod evaluate;
pub mod host;
pub mod metavariable;
pub mod pretty;
pub mod relation;
pub mod solver;
pub mod span;
pub mod state;
pub mod term;
pub mod transact;
pub mod value;

pub use context::TypeContext;
pub use error::{ConstraintError, InternalError, TypeError};
pub use state::TypecheckerState;
pub use value::Flex;

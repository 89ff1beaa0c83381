//! Checkable terms: consumed by `check` against a goal type (§3.1, §4.E).

use std::rc::Rc;

use crate::span::SpannedName;
use crate::term::inferrable::Inferrable;

#[derive(Debug, Clone)]
pub enum Checkable {
    /// Defers to `infer`, then flows the inferred type into the goal.
    Inferrable(Rc<Inferrable>),

    TupleCons(Vec<Rc<Checkable>>),

    HostTupleCons(Vec<Rc<Checkable>>),

    /// `\param => body` with no parameter annotation; the goal must be a
    /// pi type, supplying the parameter type.
    Lambda {
        param_debug: SpannedName,
        body: Rc<Checkable>,
    },
}

use std::fmt;
use std::rc::Rc;

use crate::value::strict::Strict;
use crate::value::stuck::Stuck;

/// The sum of fully-evaluated and stuck values. Every evaluator, solver,
/// and relation interface passes these around rather than either half on
/// its own (§3.2).
#[derive(Clone)]
pub enum Flex {
    Strict(Rc<Strict>),
    Stuck(Rc<Stuck>),
}

impl Flex {
    pub fn strict(value: Strict) -> Flex {
        Flex::Strict(Rc::new(value))
    }

    pub fn stuck(value: Stuck) -> Flex {
        Flex::Stuck(Rc::new(value))
    }

    pub fn is_stuck(&self) -> bool {
        matches!(self, Flex::Stuck(_))
    }

    pub fn as_strict(&self) -> Option<&Strict> {
        match self {
            Flex::Strict(s) => Some(s),
            Flex::Stuck(_) => None,
        }
    }

    pub fn as_stuck(&self) -> Option<&Stuck> {
        match self {
            Flex::Stuck(s) => Some(s),
            Flex::Strict(_) => None,
        }
    }

    /// Cheap identity used by the solver's node table to dedupe concrete
    /// (non-metavariable) values: two `Flex`s compare equal here iff they
    /// are literally the same shared allocation. This under-approximates
    /// full structural equality (two freshly-built but structurally
    /// identical values would get distinct nodes) but is sound - it never
    /// merges two different values - and is the same trade-off real
    /// implementations of this kind of graph make before investing in a
    /// hash-consing pass. See `DESIGN.md`.
    pub fn identity(&self) -> usize {
        match self {
            Flex::Strict(s) => Rc::as_ptr(s) as usize,
            Flex::Stuck(s) => Rc::as_ptr(s) as usize,
        }
    }
}

impl fmt::Debug for Flex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flex::Strict(s) => write!(f, "{:?}", s),
            Flex::Stuck(s) => write!(f, "{:?}", s),
        }
    }
}

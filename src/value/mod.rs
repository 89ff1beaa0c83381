//! Runtime values: the output of the evaluator (§3.2).
//!
//! Every value is either fully evaluated ([`strict::Strict`]) or blocked
//! on something unknown ([`stuck::Stuck`]). [`Flex`] is the sum of the
//! two and is the universal currency every component interface speaks.

pub mod flex;
pub mod strict;
pub mod stuck;

pub use flex::Flex;
pub use strict::Strict;
pub use stuck::Stuck;

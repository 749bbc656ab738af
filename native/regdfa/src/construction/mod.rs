//! The two ways of turning a syntax tree into a DFA.

pub mod followpos;
pub mod thompson;

pub use thompson::{Fragment, Thompson};

//! Finite automata.
//!
//! This module provides the ε-NFA and DFA representations with:
//! - Epsilon closure computation
//! - Subset construction (NFA to DFA conversion)
//! - DFA verification, totalization and word acceptance

pub mod dfa;
pub mod epsilon_nfa;
pub mod state;
pub mod subset_construction;
pub mod symbol;

pub use dfa::{DFA, DefinitionError, SINK_STATE};
pub use epsilon_nfa::EpsilonNFA;
pub use state::{StateId, StateSet};
pub use subset_construction::subset_construction;
pub use symbol::{END_MARKER, EPSILON, Symbol};

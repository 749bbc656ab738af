//! Deterministic Finite Automaton (DFA) with self-verification and word acceptance.

use crate::error::{Error, Result};
use crate::formlang::state::{StateId, StateSet};
use crate::formlang::symbol::Symbol;
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// Name of the dead state added by [`DFA::totalize`].
///
/// It is the canonical name of the empty state set, which is exactly what the
/// sink stands for in a subset construction.
pub const SINK_STATE: &str = "{}";

/// A violated well-formedness invariant, reported by [`DFA::verify`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("set of states Q is empty")]
    EmptyStateSet,

    #[error("alphabet is empty")]
    EmptyAlphabet,

    #[error("initial state q0 is not defined")]
    MissingStartState,

    #[error("initial state {state} is not in Q")]
    ForeignStartState { state: String },

    #[error("final state {state} is not in Q")]
    ForeignFinalState { state: String },

    #[error("transition missing for state {state} on symbol {symbol:?}")]
    MissingTransition { state: String, symbol: Symbol },

    #[error("transition from {state} on symbol {symbol:?} leads to undefined state {target}")]
    DanglingTransition {
        state: String,
        symbol: Symbol,
        target: String,
    },
}

/// A Deterministic Finite Automaton.
///
/// States are identified by their position in the name table; names are
/// usually the canonical serialization of the NFA states or tree positions
/// the state was built from. The transition function is checked for
/// determinism on insertion and for totality by [`DFA::verify`].
#[derive(Debug, Clone, Default)]
pub struct DFA {
    /// State names; a state's ID is its index
    states: IndexSet<String>,
    /// Start state (None if not set)
    start_state: Option<StateId>,
    /// Final (accepting) states
    final_states: StateSet,
    /// Transitions: (source, symbol) -> destination
    transitions: HashMap<(StateId, Symbol), StateId>,
    /// All symbols, in ascending order
    alphabet: BTreeSet<Symbol>,
}

impl DFA {
    /// Create a new empty DFA.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state with the given name and return its ID.
    /// Adding a name twice returns the existing ID.
    pub fn add_state(&mut self, name: impl Into<String>) -> StateId {
        let (index, _) = self.states.insert_full(name.into());
        index as StateId
    }

    /// Set the start state.
    pub fn set_start_state(&mut self, state: StateId) {
        self.start_state = Some(state);
    }

    /// Add a final (accepting) state.
    pub fn add_final_state(&mut self, state: StateId) {
        self.final_states.insert(state);
    }

    /// Add a symbol to the alphabet.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.alphabet.insert(symbol);
    }

    /// Add a transition.
    ///
    /// Re-adding an identical transition is a no-op; adding a second target
    /// for the same `(source, symbol)` pair fails.
    pub fn add_transition(
        &mut self,
        source: StateId,
        symbol: Symbol,
        destination: StateId,
    ) -> Result<()> {
        if let Some(&existing) = self.transitions.get(&(source, symbol)) {
            if existing == destination {
                return Ok(());
            }
            return Err(Error::NonDeterministicTransition {
                state: self.display_name(source),
                symbol,
                existing: self.display_name(existing),
                attempted: self.display_name(destination),
            });
        }

        self.alphabet.insert(symbol);
        self.transitions.insert((source, symbol), destination);
        Ok(())
    }

    /// Make the transition function total.
    ///
    /// Adds the sink state `sink_name` looping to itself on every symbol and
    /// routes every undefined `(state, symbol)` pair to it. Returns the ID of
    /// the sink. Fails without touching the automaton if `sink_name` is
    /// already taken.
    pub fn totalize(&mut self, sink_name: &str) -> Result<StateId> {
        if self.states.contains(sink_name) {
            return Err(Error::SinkNameTaken {
                name: sink_name.to_owned(),
            });
        }
        let sink = self.add_state(sink_name);
        let symbols: Vec<Symbol> = self.alphabet.iter().copied().collect();

        let mut filled = 0usize;
        for state in 0..self.num_states() {
            for &symbol in &symbols {
                if !self.transitions.contains_key(&(state, symbol)) {
                    self.add_transition(state, symbol, sink)?;
                    filled += 1;
                }
            }
        }

        debug!(
            "totalized DFA with sink {sink_name}: {filled} transitions added, {} states",
            self.num_states()
        );
        Ok(sink)
    }

    /// Get the transition from a state on a symbol.
    pub fn transition(&self, source: StateId, symbol: Symbol) -> Option<StateId> {
        self.transitions.get(&(source, symbol)).copied()
    }

    /// Get the number of states.
    pub fn num_states(&self) -> StateId {
        self.states.len() as StateId
    }

    /// Iterate over `(id, name)` for every state, in ID order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &str)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(id, name)| (id as StateId, name.as_str()))
    }

    /// Get the name of a state.
    pub fn state_name(&self, state: StateId) -> Option<&str> {
        self.states.get_index(state as usize).map(String::as_str)
    }

    /// Look up a state by name.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states.get_index_of(name).map(|index| index as StateId)
    }

    /// Get the start state.
    pub fn start_state(&self) -> Option<StateId> {
        self.start_state
    }

    /// Get the final states.
    pub fn final_states(&self) -> &StateSet {
        &self.final_states
    }

    pub fn is_final(&self, state: StateId) -> bool {
        self.final_states.contains(state)
    }

    /// Get the alphabet.
    pub fn alphabet(&self) -> &BTreeSet<Symbol> {
        &self.alphabet
    }

    /// Get all transitions as an iterator.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, Symbol, StateId)> + '_ {
        self.transitions
            .iter()
            .map(|(&(src, sym), &dst)| (src, sym, dst))
    }

    /// Transition table ordered by state ID, then by symbol.
    pub fn transition_table(&self) -> IndexMap<StateId, IndexMap<Symbol, StateId>> {
        let mut keys: Vec<&(StateId, Symbol)> = self.transitions.keys().collect();
        keys.sort_unstable();

        let mut table: IndexMap<StateId, IndexMap<Symbol, StateId>> = IndexMap::new();
        for key @ &(src, sym) in keys {
            table.entry(src).or_default().insert(sym, self.transitions[key]);
        }

        table
    }

    /// Check every well-formedness invariant and report all violations.
    pub fn verify(&self) -> std::result::Result<(), Vec<DefinitionError>> {
        let mut errors = Vec::new();

        if self.states.is_empty() {
            errors.push(DefinitionError::EmptyStateSet);
        }

        if self.alphabet.is_empty() {
            errors.push(DefinitionError::EmptyAlphabet);
        }

        match self.start_state {
            None => errors.push(DefinitionError::MissingStartState),
            Some(start) if !self.has_state(start) => {
                errors.push(DefinitionError::ForeignStartState {
                    state: self.display_name(start),
                });
            }
            Some(_) => {}
        }

        for state in self.final_states.iter().filter(|&s| !self.has_state(s)) {
            errors.push(DefinitionError::ForeignFinalState {
                state: self.display_name(state),
            });
        }

        for (state, name) in self.states() {
            for &symbol in &self.alphabet {
                match self.transition(state, symbol) {
                    None => errors.push(DefinitionError::MissingTransition {
                        state: name.to_owned(),
                        symbol,
                    }),
                    Some(target) if !self.has_state(target) => {
                        errors.push(DefinitionError::DanglingTransition {
                            state: name.to_owned(),
                            symbol,
                            target: self.display_name(target),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        // Transitions leaving states that were never added.
        let mut foreign: Vec<(StateId, Symbol, StateId)> = self
            .transitions()
            .filter(|&(src, _, _)| !self.has_state(src))
            .collect();
        foreign.sort_unstable();
        for (src, symbol, dst) in foreign {
            errors.push(DefinitionError::DanglingTransition {
                state: self.display_name(src),
                symbol,
                target: self.display_name(dst),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Test whether the automaton accepts `word`.
    ///
    /// Never fails: an automaton that does not verify, or a word containing a
    /// symbol outside the alphabet, is simply rejected.
    ///
    /// The well-formedness check runs on every call without allocating;
    /// [`DFA::verify`] is only consulted to report why a word was refused.
    pub fn accepts(&self, word: &str) -> bool {
        if !self.is_well_defined() {
            let problems = self.verify().err().map_or(0, |errors| errors.len());
            warn!("automaton is not well-defined ({problems} problems), rejecting {word:?}");
            return false;
        }

        let Some(mut current) = self.start_state else {
            return false;
        };

        for symbol in word.chars() {
            if !self.alphabet.contains(&symbol) {
                return false;
            }
            match self.transition(current, symbol) {
                Some(next) => current = next,
                None => return false,
            }
        }

        self.final_states.contains(current)
    }

    /// Same invariants as [`DFA::verify`], stopping at the first violation.
    pub fn is_well_defined(&self) -> bool {
        let Some(start) = self.start_state else {
            return false;
        };
        !self.states.is_empty()
            && !self.alphabet.is_empty()
            && self.has_state(start)
            && self.final_states.iter().all(|s| self.has_state(s))
            && self.transitions.len() == self.states.len() * self.alphabet.len()
            && self.transitions.iter().all(|(&(src, sym), &dst)| {
                self.has_state(src) && self.has_state(dst) && self.alphabet.contains(&sym)
            })
    }

    fn has_state(&self, state: StateId) -> bool {
        state < self.num_states()
    }

    fn display_name(&self, state: StateId) -> String {
        match self.state_name(state) {
            Some(name) => name.to_owned(),
            None => format!("#{state}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0 -a-> 1 -b-> 2(final), partial.
    fn ab_dfa() -> DFA {
        let mut dfa = DFA::new();
        let s0 = dfa.add_state("s0");
        let s1 = dfa.add_state("s1");
        let s2 = dfa.add_state("s2");

        dfa.set_start_state(s0);
        dfa.add_final_state(s2);
        dfa.add_transition(s0, 'a', s1).unwrap();
        dfa.add_transition(s1, 'b', s2).unwrap();
        dfa
    }

    #[test]
    fn test_dfa_basic() {
        let dfa = ab_dfa();

        assert_eq!(dfa.num_states(), 3);
        assert_eq!(dfa.start_state(), Some(0));
        assert_eq!(dfa.state_name(2), Some("s2"));
        assert_eq!(dfa.state_id("s1"), Some(1));
        assert!(dfa.is_final(2));
        assert_eq!(dfa.alphabet().iter().copied().collect::<String>(), "ab");
    }

    #[test]
    fn test_add_state_is_idempotent() {
        let mut dfa = DFA::new();
        let first = dfa.add_state("{1,2}");
        let second = dfa.add_state("{1,2}");
        assert_eq!(first, second);
        assert_eq!(dfa.num_states(), 1);
    }

    #[test]
    fn test_nondeterministic_transition_is_rejected() {
        let mut dfa = ab_dfa();

        // Same target again is fine.
        dfa.add_transition(0, 'a', 1).unwrap();

        let err = dfa.add_transition(0, 'a', 2).unwrap_err();
        assert_eq!(
            err,
            Error::NonDeterministicTransition {
                state: "s0".into(),
                symbol: 'a',
                existing: "s1".into(),
                attempted: "s2".into(),
            }
        );
        assert_eq!(dfa.transition(0, 'a'), Some(1));
    }

    #[test]
    fn test_verify_reports_missing_transitions() {
        let dfa = ab_dfa();
        let errors = dfa.verify().unwrap_err();

        // s0/b, s1/a, s2/a, s2/b
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&DefinitionError::MissingTransition {
            state: "s2".into(),
            symbol: 'b',
        }));
        assert!(!dfa.accepts("ab"));
    }

    #[test]
    fn test_totalize() {
        let mut dfa = ab_dfa();
        let sink = dfa.totalize(SINK_STATE).unwrap();

        assert_eq!(dfa.state_name(sink), Some(SINK_STATE));
        assert!(!dfa.is_final(sink));
        assert_eq!(dfa.transition(sink, 'a'), Some(sink));
        assert_eq!(dfa.transition(sink, 'b'), Some(sink));
        assert_eq!(dfa.transition(0, 'b'), Some(sink));
        assert_eq!(dfa.verify(), Ok(()));

        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("a"));
        assert!(!dfa.accepts("aba"));
        assert!(!dfa.accepts(""));
        assert!(!dfa.accepts("abc"));
    }

    #[test]
    fn test_totalize_rejects_taken_sink_name() {
        let mut dfa = ab_dfa();
        let before = dfa.clone();

        assert_eq!(
            dfa.totalize("s0"),
            Err(Error::SinkNameTaken { name: "s0".into() })
        );
        assert_eq!(dfa.num_states(), before.num_states());
        assert_eq!(dfa.transition_table(), before.transition_table());
        assert!(dfa.verify().is_err());

        // A second call with the same free name collides with the first sink.
        let sink = dfa.totalize(SINK_STATE).unwrap();
        assert_eq!(dfa.state_name(sink), Some(SINK_STATE));
        assert!(matches!(
            dfa.totalize(SINK_STATE),
            Err(Error::SinkNameTaken { .. })
        ));
    }

    #[test]
    fn test_is_well_defined_matches_verify() {
        let mut total = ab_dfa();
        total.totalize(SINK_STATE).unwrap();

        let mut dangling = DFA::new();
        let q0 = dangling.add_state("q0");
        dangling.set_start_state(q0);
        dangling.add_transition(q0, 'x', 1).unwrap();

        let mut foreign_final = total.clone();
        foreign_final.add_final_state(11);

        let mut foreign_source = DFA::new();
        let q0 = foreign_source.add_state("q0");
        foreign_source.set_start_state(q0);
        foreign_source.add_transition(q0, 'x', q0).unwrap();
        foreign_source.add_transition(5, 'x', q0).unwrap();

        for dfa in [
            DFA::new(),
            ab_dfa(),
            total,
            dangling,
            foreign_final,
            foreign_source,
        ] {
            assert_eq!(dfa.is_well_defined(), dfa.verify().is_ok(), "{dfa:?}");
        }
    }

    #[test]
    fn test_verify_collects_everything() {
        let mut dfa = DFA::new();
        dfa.set_start_state(4);
        dfa.add_final_state(7);
        let errors = dfa.verify().unwrap_err();

        assert_eq!(
            errors,
            vec![
                DefinitionError::EmptyStateSet,
                DefinitionError::EmptyAlphabet,
                DefinitionError::ForeignStartState { state: "#4".into() },
                DefinitionError::ForeignFinalState { state: "#7".into() },
            ]
        );
    }

    #[test]
    fn test_verify_reports_dangling_transition() {
        let mut dfa = DFA::new();
        let s0 = dfa.add_state("q0");
        dfa.set_start_state(s0);
        dfa.add_transition(s0, 'x', 9).unwrap();

        let errors = dfa.verify().unwrap_err();
        assert_eq!(
            errors,
            vec![DefinitionError::DanglingTransition {
                state: "q0".into(),
                symbol: 'x',
                target: "#9".into(),
            }]
        );
        assert_eq!(
            errors[0].to_string(),
            "transition from q0 on symbol 'x' leads to undefined state #9"
        );
    }

    #[test]
    fn test_missing_start_state() {
        let mut dfa = DFA::new();
        let s0 = dfa.add_state("q0");
        dfa.add_transition(s0, 'x', s0).unwrap();

        assert_eq!(
            dfa.verify(),
            Err(vec![DefinitionError::MissingStartState])
        );
        assert!(!dfa.accepts("x"));
    }

    #[test]
    fn test_transition_table_is_ordered() {
        let mut dfa = ab_dfa();
        dfa.totalize(SINK_STATE).unwrap();

        let table = dfa.transition_table();
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        for row in table.values() {
            assert_eq!(row.keys().copied().collect::<String>(), "ab");
        }
        assert_eq!(table[&0][&'a'], 1);
    }
}

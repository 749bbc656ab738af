//! Epsilon Non-deterministic Finite Automaton (ε-NFA) implementation.

use crate::formlang::state::{StateId, StateSet};
use crate::formlang::symbol::{EPSILON, Symbol, is_epsilon};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// An Epsilon Non-deterministic Finite Automaton.
///
/// States are numbered `0..num_states` and minted by [`EpsilonNFA::add_state`],
/// so every state id handed out by one automaton is fresh.
#[derive(Debug, Clone, Default)]
pub struct EpsilonNFA {
    /// Number of states (states are numbered 0..num_states)
    num_states: StateId,
    /// Start state (None until set)
    start_state: Option<StateId>,
    /// Final (accepting) states
    final_states: StateSet,
    /// Transitions: (source, symbol) -> set of destination states
    /// For epsilon transitions, symbol == EPSILON
    transitions: HashMap<(StateId, Symbol), StateSet>,
    /// All symbols used (excluding epsilon)
    alphabet: BTreeSet<Symbol>,
}

impl EpsilonNFA {
    /// Create a new empty epsilon-NFA.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh state and return its ID.
    pub fn add_state(&mut self) -> StateId {
        let id = self.num_states;
        self.num_states += 1;
        id
    }

    /// Ensure a state exists, expanding num_states if needed.
    fn ensure_state(&mut self, state: StateId) {
        if state >= self.num_states {
            self.num_states = state + 1;
        }
    }

    /// Add a transition from source to destination on the given symbol.
    pub fn add_transition(&mut self, source: StateId, symbol: Symbol, destination: StateId) {
        self.ensure_state(source);
        self.ensure_state(destination);

        if !is_epsilon(symbol) {
            self.alphabet.insert(symbol);
        }

        self.transitions
            .entry((source, symbol))
            .or_insert_with(|| StateSet::with_capacity(self.num_states as usize))
            .insert(destination);
    }

    /// Add an epsilon transition from source to destination.
    pub fn add_epsilon_transition(&mut self, source: StateId, destination: StateId) {
        self.add_transition(source, EPSILON, destination);
    }

    /// Set the start state.
    pub fn set_start_state(&mut self, state: StateId) {
        self.ensure_state(state);
        self.start_state = Some(state);
    }

    /// Add a final (accepting) state.
    pub fn add_final_state(&mut self, state: StateId) {
        self.ensure_state(state);
        self.final_states.insert(state);
    }

    /// Get the number of states.
    pub fn num_states(&self) -> StateId {
        self.num_states
    }

    /// Get the start state.
    pub fn start_state(&self) -> Option<StateId> {
        self.start_state
    }

    /// Get the final states.
    pub fn final_states(&self) -> &StateSet {
        &self.final_states
    }

    /// Get the alphabet (all symbols except epsilon), in ascending order.
    pub fn alphabet(&self) -> &BTreeSet<Symbol> {
        &self.alphabet
    }

    /// Get the epsilon closure of a set of states.
    ///
    /// Uses an explicit worklist so deeply nested expressions cannot exhaust
    /// the call stack.
    pub fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let mut closure = StateSet::with_capacity(self.num_states as usize);
        let mut stack: Vec<StateId> = states.iter().collect();

        while let Some(s) = stack.pop() {
            if closure.contains(s) {
                continue;
            }
            closure.insert(s);

            if let Some(destinations) = self.transitions.get(&(s, EPSILON)) {
                stack.extend(destinations.iter().filter(|&dest| !closure.contains(dest)));
            }
        }

        closure
    }

    /// Get the states reachable from a set of states on a given symbol.
    /// Returns the epsilon closure of the reached states.
    pub fn move_on_symbol(&self, states: &StateSet, symbol: Symbol) -> StateSet {
        debug_assert!(!is_epsilon(symbol), "use epsilon_closure for epsilon moves");

        let mut reached = StateSet::with_capacity(self.num_states as usize);

        for state in states.iter() {
            if let Some(destinations) = self.transitions.get(&(state, symbol)) {
                reached.union_with(destinations);
            }
        }

        self.epsilon_closure(&reached)
    }

    /// Run the automaton directly on a word, without determinizing it.
    pub fn accepts(&self, word: &str) -> bool {
        let Some(start) = self.start_state else {
            return false;
        };

        let start_set = StateSet::singleton(start, self.num_states as usize);
        let mut current = self.epsilon_closure(&start_set);
        for symbol in word.chars() {
            if !self.alphabet.contains(&symbol) {
                return false;
            }
            current = self.move_on_symbol(&current, symbol);
            if current.is_empty() {
                return false;
            }
        }

        current.intersects(&self.final_states)
    }

    /// Get all transitions as an iterator.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, Symbol, StateId)> + '_ {
        self.transitions
            .iter()
            .flat_map(|(&(src, sym), dests)| dests.iter().map(move |dst| (src, sym, dst)))
    }

    /// Convert to a map representation for debugging, ordered by state and symbol.
    pub fn to_transition_map(&self) -> IndexMap<StateId, IndexMap<Symbol, Vec<StateId>>> {
        let mut keys: Vec<&(StateId, Symbol)> = self.transitions.keys().collect();
        keys.sort_unstable();

        let mut map: IndexMap<StateId, IndexMap<Symbol, Vec<StateId>>> = IndexMap::new();
        for key @ &(src, sym) in keys {
            map.entry(src)
                .or_default()
                .entry(sym)
                .or_default()
                .extend(self.transitions[key].iter());
        }

        map
    }
}

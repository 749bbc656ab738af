//! Subset construction algorithm for converting ε-NFA to DFA.

use crate::error::Result;
use crate::formlang::dfa::{DFA, SINK_STATE};
use crate::formlang::epsilon_nfa::EpsilonNFA;
use crate::formlang::state::{StateId, StateSet};
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::VecDeque;

/// Convert an epsilon-NFA to a total DFA using the powerset construction.
///
/// Each DFA state is named after the sorted set of NFA states it stands for,
/// so identical subsets always collapse into one state whatever order the
/// worklist discovers them in. Undefined transitions are routed to the
/// [`SINK_STATE`].
pub fn subset_construction(nfa: &EpsilonNFA) -> Result<DFA> {
    // Sorted NFA state list -> DFA state ID
    let mut state_mapping: IndexMap<Vec<StateId>, StateId> = IndexMap::new();
    let mut dfa = DFA::new();
    for &symbol in nfa.alphabet() {
        dfa.add_symbol(symbol);
    }

    let Some(start) = nfa.start_state() else {
        // Nothing to determinize; verification reports the empty automaton.
        return Ok(dfa);
    };

    let initial_set = nfa.epsilon_closure(&StateSet::singleton(start, nfa.num_states() as usize));
    let initial_dfa_state = dfa.add_state(initial_set.name());
    state_mapping.insert(initial_set.to_vec(), initial_dfa_state);
    dfa.set_start_state(initial_dfa_state);

    if initial_set.intersects(nfa.final_states()) {
        dfa.add_final_state(initial_dfa_state);
    }

    let mut worklist: VecDeque<(StateId, StateSet)> = VecDeque::new();
    worklist.push_back((initial_dfa_state, initial_set));

    while let Some((current_dfa_state, current_nfa_set)) = worklist.pop_front() {
        for &symbol in nfa.alphabet() {
            let next_nfa_set = nfa.move_on_symbol(&current_nfa_set, symbol);

            if next_nfa_set.is_empty() {
                // Left undefined here; the sink picks it up below.
                continue;
            }

            let next_vec = next_nfa_set.to_vec();
            let next_dfa_state = if let Some(&existing) = state_mapping.get(&next_vec) {
                existing
            } else {
                let new_state = dfa.add_state(next_nfa_set.name());
                state_mapping.insert(next_vec, new_state);
                trace!("discovered DFA state {new_state} = {next_nfa_set}");

                if next_nfa_set.intersects(nfa.final_states()) {
                    dfa.add_final_state(new_state);
                }

                worklist.push_back((new_state, next_nfa_set));
                new_state
            };

            dfa.add_transition(current_dfa_state, symbol, next_dfa_state)?;
        }
    }

    debug!(
        "subset construction: {} NFA states -> {} DFA states",
        nfa.num_states(),
        dfa.num_states()
    );

    dfa.totalize(SINK_STATE)?;
    Ok(dfa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_construction_basic() {
        // NFA: 0 -a-> 1, 0 -a-> 2, 1 -b-> 3(final), 2 -b-> 3(final)
        let mut nfa = EpsilonNFA::new();
        nfa.add_transition(0, 'a', 1);
        nfa.add_transition(0, 'a', 2);
        nfa.add_transition(1, 'b', 3);
        nfa.add_transition(2, 'b', 3);
        nfa.set_start_state(0);
        nfa.add_final_state(3);

        let dfa = subset_construction(&nfa).unwrap();

        assert_eq!(dfa.verify(), Ok(()));
        let names: Vec<&str> = dfa.states().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["{0}", "{1,2}", "{3}", SINK_STATE]);
        assert!(dfa.is_final(2));
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("a"));
        assert!(!dfa.accepts("abb"));
    }

    #[test]
    fn test_subset_construction_with_epsilon() {
        // NFA: 0 -ε-> 1 -a-> 2(final)
        let mut nfa = EpsilonNFA::new();
        nfa.add_epsilon_transition(0, 1);
        nfa.add_transition(1, 'a', 2);
        nfa.set_start_state(0);
        nfa.add_final_state(2);

        let dfa = subset_construction(&nfa).unwrap();

        // The start state is the epsilon closure of {0}.
        let start = dfa.start_state().unwrap();
        assert_eq!(dfa.state_name(start), Some("{0,1}"));
        assert!(dfa.accepts("a"));
        assert!(!dfa.accepts(""));
    }

    #[test]
    fn test_sink_is_added_even_when_total() {
        // 0 -a-> 0 (final): already total.
        let mut nfa = EpsilonNFA::new();
        nfa.add_transition(0, 'a', 0);
        nfa.set_start_state(0);
        nfa.add_final_state(0);

        let dfa = subset_construction(&nfa).unwrap();

        assert_eq!(dfa.num_states(), 2);
        let sink = dfa.state_id(SINK_STATE).unwrap();
        assert_eq!(dfa.transition(sink, 'a'), Some(sink));
        assert!(dfa.accepts(""));
        assert!(dfa.accepts("aaa"));
    }

    #[test]
    fn test_empty_nfa() {
        let nfa = EpsilonNFA::new();
        let dfa = subset_construction(&nfa).unwrap();
        assert!(dfa.start_state().is_none());
        assert!(dfa.verify().is_err());
    }
}

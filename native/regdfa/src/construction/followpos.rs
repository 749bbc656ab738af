//! Direct DFA construction from an annotated syntax tree (followpos method).

use crate::error::Result;
use crate::formlang::dfa::DFA;
use crate::formlang::state::{StateId, StateSet};
use crate::regex::syntax_tree::SyntaxTree;
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::VecDeque;

/// Build a DFA whose states are sets of tree positions.
///
/// The start state is `firstpos(root)` and a state is final when it contains
/// the end marker's position. Symbols with no follow positions get no
/// transition, so the result is usually partial; see [`DFA::totalize`].
pub fn construct(tree: &SyntaxTree) -> Result<DFA> {
    let mut dfa = DFA::new();
    let alphabet = tree.alphabet();
    for &symbol in &alphabet {
        dfa.add_symbol(symbol);
    }

    let end_marker = tree.end_marker_position();
    let mut state_mapping: IndexMap<Vec<StateId>, StateId> = IndexMap::new();
    let mut unmarked: VecDeque<(StateId, StateSet)> = VecDeque::new();

    let start_set = tree.node(tree.root()).firstpos().clone();
    let start = dfa.add_state(start_set.name());
    state_mapping.insert(start_set.to_vec(), start);
    dfa.set_start_state(start);
    if start_set.contains(end_marker) {
        dfa.add_final_state(start);
    }
    unmarked.push_back((start, start_set));

    while let Some((current, positions)) = unmarked.pop_front() {
        for &symbol in &alphabet {
            let mut next = StateSet::default();
            for position in positions.iter() {
                if tree.symbol_at(position) == Some(symbol) {
                    if let Some(follow) = tree.followpos(position) {
                        next.union_with(follow);
                    }
                }
            }

            if next.is_empty() {
                continue;
            }

            let key = next.to_vec();
            let target = match state_mapping.get(&key) {
                Some(&existing) => existing,
                None => {
                    let state = dfa.add_state(next.name());
                    state_mapping.insert(key, state);
                    trace!("discovered DFA state {state} = {next}");
                    if next.contains(end_marker) {
                        dfa.add_final_state(state);
                    }
                    unmarked.push_back((state, next));
                    state
                }
            };

            dfa.add_transition(current, symbol, target)?;
        }
    }

    debug!(
        "followpos construction: {} positions -> {} DFA states",
        tree.leaf_count(),
        dfa.num_states()
    );
    Ok(dfa)
}

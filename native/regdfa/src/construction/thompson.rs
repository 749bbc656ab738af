//! Thompson construction of an ε-NFA from a postfix stream or a syntax tree.

use crate::error::{Error, Result};
use crate::formlang::epsilon_nfa::EpsilonNFA;
use crate::formlang::state::StateId;
use crate::formlang::symbol::Symbol;
use crate::regex::parser::Token;
use crate::regex::syntax_tree::{NodeKind, SyntaxTree};
use log::debug;

/// A partially built automaton: one entry state and one accepting state.
///
/// Fragments only ever reference states of the [`Thompson`] builder that
/// minted them, so two fragments never share a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub start: StateId,
    pub accept: StateId,
}

/// Builds an ε-NFA fragment by fragment.
///
/// Every state is minted from the NFA's own counter, so separate builds are
/// independent of each other.
#[derive(Debug, Default)]
pub struct Thompson {
    nfa: EpsilonNFA,
}

impl Thompson {
    pub fn new() -> Self {
        Self::default()
    }

    /// `start -symbol-> accept`
    pub fn literal(&mut self, symbol: Symbol) -> Fragment {
        let start = self.nfa.add_state();
        let accept = self.nfa.add_state();
        self.nfa.add_transition(start, symbol, accept);
        Fragment { start, accept }
    }

    /// Chain `b` after `a`; `a`'s accepting state is demoted.
    pub fn concat(&mut self, a: Fragment, b: Fragment) -> Fragment {
        self.nfa.add_epsilon_transition(a.accept, b.start);
        Fragment {
            start: a.start,
            accept: b.accept,
        }
    }

    pub fn union(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let start = self.nfa.add_state();
        let accept = self.nfa.add_state();
        self.nfa.add_epsilon_transition(start, a.start);
        self.nfa.add_epsilon_transition(start, b.start);
        self.nfa.add_epsilon_transition(a.accept, accept);
        self.nfa.add_epsilon_transition(b.accept, accept);
        Fragment { start, accept }
    }

    /// Zero or more repetitions.
    pub fn star(&mut self, a: Fragment) -> Fragment {
        let fragment = self.plus(a);
        self.nfa.add_epsilon_transition(fragment.start, fragment.accept);
        fragment
    }

    /// One or more repetitions: like [`Thompson::star`] without the skip edge.
    pub fn plus(&mut self, a: Fragment) -> Fragment {
        let start = self.nfa.add_state();
        let accept = self.nfa.add_state();
        self.nfa.add_epsilon_transition(start, a.start);
        self.nfa.add_epsilon_transition(a.accept, a.start);
        self.nfa.add_epsilon_transition(a.accept, accept);
        Fragment { start, accept }
    }

    /// Zero or one occurrence.
    pub fn question(&mut self, a: Fragment) -> Fragment {
        let start = self.nfa.add_state();
        let accept = self.nfa.add_state();
        self.nfa.add_epsilon_transition(start, a.start);
        self.nfa.add_epsilon_transition(start, accept);
        self.nfa.add_epsilon_transition(a.accept, accept);
        Fragment { start, accept }
    }

    /// Close the build: `fragment` becomes the whole automaton.
    pub fn finish(mut self, fragment: Fragment) -> EpsilonNFA {
        self.nfa.set_start_state(fragment.start);
        self.nfa.add_final_state(fragment.accept);
        debug!(
            "thompson construction: {} NFA states over {:?}",
            self.nfa.num_states(),
            self.nfa.alphabet()
        );
        self.nfa
    }

    /// Build from a postfix stream with an operand stack of fragments.
    pub fn from_postfix(postfix: &[Token]) -> Result<EpsilonNFA> {
        let mut builder = Self::new();
        let mut stack: Vec<Fragment> = Vec::new();

        for &token in postfix {
            let fragment = match token {
                Token::Literal(symbol) => builder.literal(symbol),
                Token::Star | Token::Plus | Token::Question => {
                    let a = stack.pop().ok_or(Error::MalformedPostfix { remaining: 0 })?;
                    match token {
                        Token::Star => builder.star(a),
                        Token::Plus => builder.plus(a),
                        _ => builder.question(a),
                    }
                }
                Token::Concat | Token::Union => {
                    let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                        return Err(Error::MalformedPostfix { remaining: 0 });
                    };
                    if token == Token::Concat {
                        builder.concat(a, b)
                    } else {
                        builder.union(a, b)
                    }
                }
                Token::EndMarker | Token::Open | Token::Close => {
                    return Err(Error::MalformedPostfix {
                        remaining: stack.len(),
                    });
                }
            };
            stack.push(fragment);
        }

        match stack.as_slice() {
            &[fragment] => Ok(builder.finish(fragment)),
            _ => Err(Error::MalformedPostfix {
                remaining: stack.len(),
            }),
        }
    }

    /// Build from the expression part of a syntax tree (the end marker is
    /// not part of the NFA).
    pub fn from_syntax_tree(tree: &SyntaxTree) -> Result<EpsilonNFA> {
        let mut builder = Self::new();
        let expression = tree.expression_root();
        let mut fragments: Vec<Fragment> = Vec::with_capacity(expression + 1);

        // Children precede parents in the arena, so their fragments exist.
        for node in &tree.nodes()[..=expression] {
            let fragment = match node.kind() {
                NodeKind::Literal { symbol, .. } => builder.literal(symbol),
                NodeKind::Concat(a, b) => builder.concat(fragments[a], fragments[b]),
                NodeKind::Union(a, b) => builder.union(fragments[a], fragments[b]),
                NodeKind::Star(a) => builder.star(fragments[a]),
                NodeKind::Plus(a) => builder.plus(fragments[a]),
                NodeKind::Question(a) => builder.question(fragments[a]),
                NodeKind::EndMarker { .. } => {
                    return Err(Error::MalformedPostfix {
                        remaining: fragments.len(),
                    });
                }
            };
            fragments.push(fragment);
        }

        Ok(builder.finish(fragments[expression]))
    }
}

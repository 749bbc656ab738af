//! Symbol types for automata transitions.

/// A transition symbol. Literal symbols are alphanumeric characters.
pub type Symbol = char;

/// Special symbol representing epsilon (empty) transitions.
/// The validator only admits alphanumeric literals, so NUL can never collide
/// with a real symbol.
pub const EPSILON: Symbol = '\0';

/// Symbol appended to every expression to mark where a match ends.
/// It lives only in the syntax tree and never enters an automaton alphabet.
pub const END_MARKER: Symbol = '#';

/// Check if a symbol is an epsilon transition.
#[inline]
pub fn is_epsilon(symbol: Symbol) -> bool {
    symbol == EPSILON
}

/// Check if a character may appear as a literal in an expression.
#[inline]
pub fn is_literal(c: char) -> bool {
    c.is_alphanumeric()
}

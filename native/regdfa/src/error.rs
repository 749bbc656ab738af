//! Errors that can occur while turning an expression into an automaton.

use crate::formlang::Symbol;

/// The source expression is not well formed.
///
/// Always reported before any tree or automaton is built. Offsets are
/// character offsets into the original expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid character {character:?} at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },

    #[error("unbalanced parentheses at offset {offset}")]
    UnbalancedParentheses { offset: usize },

    #[error("misplaced operator {operator:?} at offset {offset}")]
    MisplacedOperator { operator: char, offset: usize },

    /// The expression, or a group inside it, matches nothing at all.
    #[error("empty expression at offset {offset}")]
    Empty { offset: usize },
}

/// Errors that can occur during conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Translation or tree building left an inconsistent operand stack.
    #[error("malformed expression: {remaining} operands left after tree construction")]
    MalformedExpression { remaining: usize },

    /// Thompson construction left an inconsistent fragment stack.
    #[error("malformed postfix stream: {remaining} fragments left after NFA construction")]
    MalformedPostfix { remaining: usize },

    /// A second, different target was added for a `(state, symbol)` pair.
    #[error(
        "non-deterministic transition from {state} on {symbol:?}: already leads to {existing}, not {attempted}"
    )]
    NonDeterministicTransition {
        state: String,
        symbol: Symbol,
        existing: String,
        attempted: String,
    },

    /// The name asked for the sink already belongs to a live state.
    #[error("cannot add sink state {name}: a state with that name already exists")]
    SinkNameTaken { name: String },
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

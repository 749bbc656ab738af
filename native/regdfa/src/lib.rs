//! Conversion of regular expressions into deterministic finite automata.
//!
//! Expressions are built from alphanumeric literals, alternation `|`, the
//! postfix operators `*`, `+` and `?`, and parentheses. Concatenation is
//! implicit.
//!
//! # Example
//!
//! ```
//! let dfa = regdfa::parse_and_convert("(a|b)*abb").unwrap();
//!
//! assert!(dfa.accepts("aababb"));
//! assert!(!dfa.accepts("ab"));
//! assert!(dfa.verify().is_ok());
//! ```

pub mod construction;
pub mod error;
pub mod formlang;
pub mod regex;

pub use construction::Thompson;
pub use error::{Error, Result, ValidationError};
pub use formlang::{DFA, DefinitionError, EpsilonNFA, SINK_STATE, StateId, StateSet, Symbol};
pub use regex::{SyntaxTree, Token};

use formlang::subset_construction;

/// Which algorithm turns an expression into a DFA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Construction {
    /// Thompson's ε-NFA followed by subset construction. Always total.
    #[default]
    Thompson,
    /// Direct construction from followpos sets on the syntax tree.
    Followpos,
}

/// Conversion settings.
///
/// `Converter::default()` runs the Thompson pipeline. The followpos pipeline
/// is completed with a sink state unless [`Converter::totalize`] is turned
/// off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converter {
    construction: Construction,
    totalize: bool,
}

impl Default for Converter {
    fn default() -> Self {
        Self {
            construction: Construction::Thompson,
            totalize: true,
        }
    }
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn construction(mut self, construction: Construction) -> Self {
        self.construction = construction;
        self
    }

    /// Whether a followpos DFA gets a sink state. Thompson DFAs always do.
    pub fn totalize(mut self, totalize: bool) -> Self {
        self.totalize = totalize;
        self
    }

    pub fn convert(&self, expression: &str) -> Result<DFA> {
        match self.construction {
            Construction::Thompson => {
                let postfix = regex::postfix(expression)?;
                let nfa = Thompson::from_postfix(&postfix)?;
                subset_construction(&nfa)
            }
            Construction::Followpos => {
                let tree = parse(expression)?;
                let mut dfa = tree_to_dfa_via_followpos(&tree)?;
                if self.totalize {
                    dfa.totalize(SINK_STATE)?;
                }
                Ok(dfa)
            }
        }
    }
}

/// Validate `expression` and convert it with the default settings.
pub fn parse_and_convert(expression: &str) -> Result<DFA> {
    Converter::default().convert(expression)
}

/// Validate `expression` and build its annotated syntax tree.
pub fn parse(expression: &str) -> Result<SyntaxTree> {
    let postfix = regex::postfix(expression)?;
    SyntaxTree::from_postfix(&postfix)
}

/// Thompson construction over the tree, then subset construction. The
/// result is total.
pub fn tree_to_dfa_via_nfa(tree: &SyntaxTree) -> Result<DFA> {
    let nfa = Thompson::from_syntax_tree(tree)?;
    subset_construction(&nfa)
}

/// Direct followpos construction. The result is partial: pairs with no
/// follow positions have no transition.
pub fn tree_to_dfa_via_followpos(tree: &SyntaxTree) -> Result<DFA> {
    construction::followpos::construct(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converter_defaults() {
        let converter = Converter::new();
        assert_eq!(converter, Converter::default());
        assert_eq!(converter.construction, Construction::Thompson);
        assert!(converter.totalize);
    }

    #[test]
    fn test_followpos_without_totalize_is_partial() {
        let partial = Converter::new()
            .construction(Construction::Followpos)
            .totalize(false)
            .convert("ab")
            .unwrap();
        assert!(partial.verify().is_err());
        assert!(partial.state_id(SINK_STATE).is_none());

        let total = Converter::new()
            .construction(Construction::Followpos)
            .convert("ab")
            .unwrap();
        assert_eq!(total.verify(), Ok(()));
        assert!(total.accepts("ab"));
    }

    #[test]
    fn test_parse_exposes_tree() {
        let tree = parse("a|b").unwrap();
        assert_eq!(tree.leaf_count(), 3);
        assert!(matches!(
            parse("a|"),
            Err(Error::Validation(ValidationError::MisplacedOperator { .. }))
        ));
    }
}

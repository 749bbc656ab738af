//! Expression parsing and syntax trees.

pub mod parser;
pub mod syntax_tree;

pub use parser::{Token, expand_concatenation, postfix, render, to_postfix, validate};
pub use syntax_tree::{Node, NodeId, NodeKind, Position, SyntaxTree};

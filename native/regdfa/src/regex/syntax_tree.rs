//! Syntax tree built from a postfix token stream, annotated for the direct
//! (followpos) DFA construction.
//!
//! Nodes live in an arena and refer to their children by index. Nodes are
//! pushed in postfix order, so every child sits at a lower index than its
//! parent and a single forward pass over the arena visits children first.

use crate::error::{Error, Result};
use crate::formlang::state::StateSet;
use crate::formlang::symbol::{END_MARKER, Symbol};
use crate::regex::parser::Token;
use log::debug;
use std::collections::BTreeSet;
use std::fmt;

/// Index of a node in its tree's arena.
pub type NodeId = usize;

/// 1-based position of a leaf, unique within one tree.
pub type Position = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Literal { symbol: Symbol, position: Position },
    EndMarker { position: Position },
    Concat(NodeId, NodeId),
    Union(NodeId, NodeId),
    Star(NodeId),
    Plus(NodeId),
    Question(NodeId),
}

/// A syntax tree node with its derived attributes.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    nullable: bool,
    firstpos: StateSet,
    lastpos: StateSet,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Whether the subtree matches the empty string.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Positions that can match the first symbol of the subtree.
    pub fn firstpos(&self) -> &StateSet {
        &self.firstpos
    }

    /// Positions that can match the last symbol of the subtree.
    pub fn lastpos(&self) -> &StateSet {
        &self.lastpos
    }

    /// The symbol of a leaf; the end marker reports `#`.
    pub fn symbol(&self) -> Option<Symbol> {
        match self.kind {
            NodeKind::Literal { symbol, .. } => Some(symbol),
            NodeKind::EndMarker { .. } => Some(END_MARKER),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self.kind {
            NodeKind::Literal { position, .. } | NodeKind::EndMarker { position } => Some(position),
            _ => None,
        }
    }

    /// Left (or only) child.
    pub fn left(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Concat(left, _)
            | NodeKind::Union(left, _)
            | NodeKind::Star(left)
            | NodeKind::Plus(left)
            | NodeKind::Question(left) => Some(left),
            _ => None,
        }
    }

    pub fn right(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Concat(_, right) | NodeKind::Union(_, right) => Some(right),
            _ => None,
        }
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        self.left().into_iter().chain(self.right())
    }

    pub fn is_leaf(&self) -> bool {
        self.position().is_some()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Literal { symbol, position } => write!(f, "Literal {symbol:?} @{position}")?,
            NodeKind::EndMarker { position } => write!(f, "EndMarker @{position}")?,
            NodeKind::Concat(..) => f.write_str("Concat")?,
            NodeKind::Union(..) => f.write_str("Union")?,
            NodeKind::Star(_) => f.write_str("Star")?,
            NodeKind::Plus(_) => f.write_str("Plus")?,
            NodeKind::Question(_) => f.write_str("Question")?,
        }
        write!(
            f,
            " nullable={} firstpos={} lastpos={}",
            self.nullable, self.firstpos, self.lastpos
        )
    }
}

/// An expression's syntax tree, augmented with a trailing end marker.
///
/// The root is always `Concat(expression, #)`.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Leaf symbol per position (index = position - 1)
    symbols: Vec<Symbol>,
    /// followpos per position (index = position - 1)
    followpos: Vec<StateSet>,
}

impl SyntaxTree {
    /// Build the tree from a postfix stream and compute every attribute.
    ///
    /// The stream must describe exactly one expression; the end marker and
    /// its concatenation are appended here.
    pub fn from_postfix(postfix: &[Token]) -> Result<Self> {
        let mut arena = Arena::default();
        let mut stack: Vec<NodeId> = Vec::new();

        for &token in postfix {
            let node = match token {
                Token::Literal(symbol) => arena.leaf(symbol),
                Token::Star | Token::Plus | Token::Question => {
                    let child = stack.pop().ok_or(Error::MalformedExpression { remaining: 0 })?;
                    arena.push(match token {
                        Token::Star => NodeKind::Star(child),
                        Token::Plus => NodeKind::Plus(child),
                        _ => NodeKind::Question(child),
                    })
                }
                Token::Concat | Token::Union => {
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        return Err(Error::MalformedExpression { remaining: 0 });
                    };
                    arena.push(if token == Token::Concat {
                        NodeKind::Concat(left, right)
                    } else {
                        NodeKind::Union(left, right)
                    })
                }
                Token::EndMarker | Token::Open | Token::Close => {
                    return Err(Error::MalformedExpression {
                        remaining: stack.len(),
                    });
                }
            };
            stack.push(node);
        }

        let &[expression] = stack.as_slice() else {
            return Err(Error::MalformedExpression {
                remaining: stack.len(),
            });
        };

        let marker = arena.end_marker();
        let root = arena.push(NodeKind::Concat(expression, marker));
        let followpos = arena.followpos();

        debug!(
            "syntax tree: {} nodes, {} positions",
            arena.nodes.len(),
            arena.symbols.len()
        );

        Ok(Self {
            nodes: arena.nodes,
            root,
            symbols: arena.symbols,
            followpos,
        })
    }

    /// The augmented root, `Concat(expression, #)`.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root of the expression itself, without the end marker.
    pub fn expression_root(&self) -> NodeId {
        // The root is always the concatenation pushed last by `from_postfix`.
        match self.nodes[self.root].kind {
            NodeKind::Concat(expression, _) => expression,
            _ => self.root,
        }
    }

    /// Get a node. Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// All nodes, children before parents.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves, the end marker included.
    pub fn leaf_count(&self) -> usize {
        self.symbols.len()
    }

    /// Position of the end marker, always the highest one.
    pub fn end_marker_position(&self) -> Position {
        self.symbols.len() as Position
    }

    /// Symbol at a leaf position.
    pub fn symbol_at(&self, position: Position) -> Option<Symbol> {
        let index = (position as usize).checked_sub(1)?;
        self.symbols.get(index).copied()
    }

    /// Positions that can follow `position` in a match.
    pub fn followpos(&self, position: Position) -> Option<&StateSet> {
        let index = (position as usize).checked_sub(1)?;
        self.followpos.get(index)
    }

    /// Distinct literal symbols, end marker excluded.
    pub fn alphabet(&self) -> BTreeSet<Symbol> {
        let literals = self.symbols.len().saturating_sub(1);
        self.symbols[..literals].iter().copied().collect()
    }
}

/// Prints the tree as an indented outline, one node per line.
impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            writeln!(f, "{:indent$}{node}", "", indent = depth * 2)?;
            // Right first so the left child is printed first.
            stack.extend(node.right().map(|right| (right, depth + 1)));
            stack.extend(node.left().map(|left| (left, depth + 1)));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Arena {
    nodes: Vec<Node>,
    symbols: Vec<Symbol>,
}

impl Arena {
    fn leaf(&mut self, symbol: Symbol) -> NodeId {
        self.symbols.push(symbol);
        let position = self.symbols.len() as Position;
        self.push(NodeKind::Literal { symbol, position })
    }

    fn end_marker(&mut self) -> NodeId {
        self.symbols.push(END_MARKER);
        let position = self.symbols.len() as Position;
        self.push(NodeKind::EndMarker { position })
    }

    /// Push a node, deriving its attributes from its (already pushed) children.
    fn push(&mut self, kind: NodeKind) -> NodeId {
        let union = |a: &StateSet, b: &StateSet| {
            let mut set = a.clone();
            set.union_with(b);
            set
        };

        let (nullable, firstpos, lastpos) = match kind {
            NodeKind::Literal { position, .. } | NodeKind::EndMarker { position } => {
                let set = StateSet::singleton(position, position as usize + 1);
                (false, set.clone(), set)
            }
            NodeKind::Star(child) | NodeKind::Question(child) => {
                let child = &self.nodes[child];
                (true, child.firstpos.clone(), child.lastpos.clone())
            }
            NodeKind::Plus(child) => {
                let child = &self.nodes[child];
                (child.nullable, child.firstpos.clone(), child.lastpos.clone())
            }
            NodeKind::Union(left, right) => {
                let (left, right) = (&self.nodes[left], &self.nodes[right]);
                (
                    left.nullable || right.nullable,
                    union(&left.firstpos, &right.firstpos),
                    union(&left.lastpos, &right.lastpos),
                )
            }
            NodeKind::Concat(left, right) => {
                let (left, right) = (&self.nodes[left], &self.nodes[right]);
                let firstpos = if left.nullable {
                    union(&left.firstpos, &right.firstpos)
                } else {
                    left.firstpos.clone()
                };
                let lastpos = if right.nullable {
                    union(&left.lastpos, &right.lastpos)
                } else {
                    right.lastpos.clone()
                };
                (left.nullable && right.nullable, firstpos, lastpos)
            }
        };

        self.nodes.push(Node {
            kind,
            nullable,
            firstpos,
            lastpos,
        });
        self.nodes.len() - 1
    }

    fn followpos(&self) -> Vec<StateSet> {
        let mut followpos = vec![StateSet::default(); self.symbols.len()];

        for node in &self.nodes {
            let (from, to) = match node.kind {
                NodeKind::Concat(left, right) => (left, right),
                NodeKind::Star(child) | NodeKind::Plus(child) => (child, child),
                _ => continue,
            };
            for position in self.nodes[from].lastpos.iter() {
                followpos[position as usize - 1].union_with(&self.nodes[to].firstpos);
            }
        }

        followpos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::parser::postfix;

    fn tree(expr: &str) -> SyntaxTree {
        SyntaxTree::from_postfix(&postfix(expr).unwrap()).unwrap()
    }

    fn set(members: &[u32]) -> StateSet {
        members.iter().copied().collect()
    }

    #[test]
    fn test_positions_left_to_right() {
        let tree = tree("(a|b)*abb");

        assert_eq!(tree.leaf_count(), 6);
        assert_eq!(tree.end_marker_position(), 6);
        let symbols: String = (1..=6).filter_map(|p| tree.symbol_at(p)).collect();
        assert_eq!(symbols, "ababb#");
        assert_eq!(tree.symbol_at(0), None);
        assert_eq!(tree.symbol_at(7), None);
        assert_eq!(tree.alphabet().into_iter().collect::<String>(), "ab");
    }

    #[test]
    fn test_followpos_classic_example() {
        let tree = tree("(a|b)*abb");
        let root = tree.node(tree.root());

        assert!(!root.nullable());
        assert_eq!(root.firstpos(), &set(&[1, 2, 3]));
        assert_eq!(root.lastpos(), &set(&[6]));

        assert_eq!(tree.followpos(1), Some(&set(&[1, 2, 3])));
        assert_eq!(tree.followpos(2), Some(&set(&[1, 2, 3])));
        assert_eq!(tree.followpos(3), Some(&set(&[4])));
        assert_eq!(tree.followpos(4), Some(&set(&[5])));
        assert_eq!(tree.followpos(5), Some(&set(&[6])));
        assert_eq!(tree.followpos(6), Some(&set(&[])));
    }

    #[test]
    fn test_nullable() {
        let nullable = |expr: &str| {
            let tree = tree(expr);
            tree.node(tree.expression_root()).nullable()
        };

        assert!(!nullable("a"));
        assert!(nullable("a*"));
        assert!(nullable("a?"));
        assert!(!nullable("a+"));
        assert!(nullable("a*+"));
        assert!(nullable("a|b*"));
        assert!(!nullable("a|b"));
        assert!(nullable("a*b?"));
        assert!(!nullable("a*b"));
    }

    #[test]
    fn test_concat_firstpos_lastpos() {
        // a? b c?  ->  positions 1 2 3
        let tree = tree("a?bc?");
        let expression = tree.node(tree.expression_root());

        assert_eq!(expression.firstpos(), &set(&[1, 2]));
        assert_eq!(expression.lastpos(), &set(&[2, 3]));
        // The end marker follows everything that can end the expression.
        assert_eq!(tree.followpos(2), Some(&set(&[3, 4])));
        assert_eq!(tree.followpos(3), Some(&set(&[4])));
    }

    #[test]
    fn test_plus_followpos_loops() {
        let tree = tree("a+");
        assert_eq!(tree.followpos(1), Some(&set(&[1, 2])));
    }

    #[test]
    fn test_question_adds_no_loop() {
        let tree = tree("a?");
        assert_eq!(tree.followpos(1), Some(&set(&[2])));
        assert_eq!(tree.node(tree.root()).firstpos(), &set(&[1, 2]));
    }

    #[test]
    fn test_root_shape() {
        let tree = tree("a|b");
        let root = tree.node(tree.root());

        assert!(matches!(root.kind(), NodeKind::Concat(..)));
        assert_eq!(root.left(), Some(tree.expression_root()));
        let marker = tree.node(root.right().unwrap());
        assert_eq!(marker.kind(), NodeKind::EndMarker { position: 3 });
        assert_eq!(marker.symbol(), Some('#'));
        assert!(matches!(
            tree.node(tree.expression_root()).kind(),
            NodeKind::Union(..)
        ));
        assert_eq!(root.children().count(), 2);
    }

    #[test]
    fn test_children_precede_parents() {
        let tree = tree("(ab|c)*d+");
        for (id, node) in tree.nodes().iter().enumerate() {
            assert!(node.children().all(|child| child < id));
        }
        assert_eq!(tree.root(), tree.nodes().len() - 1);
    }

    #[test]
    fn test_malformed_postfix() {
        let a = Token::Literal('a');
        let b = Token::Literal('b');

        assert_eq!(
            SyntaxTree::from_postfix(&[a, b]).unwrap_err(),
            Error::MalformedExpression { remaining: 2 }
        );
        assert!(SyntaxTree::from_postfix(&[a, Token::Union]).is_err());
        assert!(SyntaxTree::from_postfix(&[Token::Star]).is_err());
        assert!(SyntaxTree::from_postfix(&[]).is_err());
        assert!(SyntaxTree::from_postfix(&[a, Token::EndMarker, Token::Concat]).is_err());
    }

    #[test]
    fn test_display_outline() {
        let expected = "\
Concat nullable=false firstpos={1} lastpos={3}
  Concat nullable=false firstpos={1} lastpos={2}
    Literal 'a' @1 nullable=false firstpos={1} lastpos={1}
    Literal 'b' @2 nullable=false firstpos={2} lastpos={2}
  EndMarker @3 nullable=false firstpos={3} lastpos={3}
";
        assert_eq!(tree("ab").to_string(), expected);
    }
}

//! Expression front end: validation, explicit concatenation and
//! shunting-yard translation to postfix.

use crate::error::{Error, Result, ValidationError};
use crate::formlang::symbol::{END_MARKER, Symbol, is_literal};
use log::debug;
use std::fmt;

/// A lexical unit of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(Symbol),
    /// Marks the end of a match; appended by the syntax tree builder.
    EndMarker,
    Concat,
    Union,
    Star,
    Plus,
    Question,
    Open,
    Close,
}

impl Token {
    fn from_char(c: char) -> Self {
        match c {
            '|' => Token::Union,
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Question,
            '(' => Token::Open,
            ')' => Token::Close,
            c => Token::Literal(c),
        }
    }

    /// Postfix unary operators: `*`, `+` and `?`.
    pub fn is_unary(self) -> bool {
        matches!(self, Token::Star | Token::Plus | Token::Question)
    }

    /// Operator binding strength; operands and parentheses have none.
    pub fn precedence(self) -> u8 {
        match self {
            Token::Star | Token::Plus | Token::Question => 3,
            Token::Concat => 2,
            Token::Union => 1,
            _ => 0,
        }
    }

    fn ends_operand(self) -> bool {
        matches!(
            self,
            Token::Literal(_)
                | Token::EndMarker
                | Token::Close
                | Token::Star
                | Token::Plus
                | Token::Question
        )
    }

    fn starts_operand(self) -> bool {
        matches!(self, Token::Literal(_) | Token::EndMarker | Token::Open)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match *self {
            Token::Literal(c) => c,
            Token::EndMarker => END_MARKER,
            Token::Concat => '.',
            Token::Union => '|',
            Token::Star => '*',
            Token::Plus => '+',
            Token::Question => '?',
            Token::Open => '(',
            Token::Close => ')',
        };
        write!(f, "{c}")
    }
}

/// Render a token stream back to text, e.g. `ab.*#.` for a postfix stream.
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

/// Check that `expr` is a well formed expression.
pub fn validate(expr: &str) -> std::result::Result<(), ValidationError> {
    let mut open: Vec<usize> = Vec::new();
    let mut prev: Option<char> = None;
    let mut last_offset = 0;

    for (offset, c) in expr.chars().enumerate() {
        last_offset = offset;
        match c {
            c if is_literal(c) => {}
            '(' => open.push(offset),
            ')' => {
                if open.pop().is_none() {
                    return Err(ValidationError::UnbalancedParentheses { offset });
                }
                match prev {
                    Some('(') => return Err(ValidationError::Empty { offset: offset - 1 }),
                    Some('|') => {
                        return Err(ValidationError::MisplacedOperator {
                            operator: '|',
                            offset: offset - 1,
                        });
                    }
                    _ => {}
                }
            }
            '*' | '+' | '?' | '|' => {
                if matches!(prev, None | Some('(') | Some('|')) {
                    return Err(ValidationError::MisplacedOperator { operator: c, offset });
                }
            }
            character => return Err(ValidationError::InvalidCharacter { character, offset }),
        }
        prev = Some(c);
    }

    match prev {
        None => Err(ValidationError::Empty { offset: 0 }),
        Some('|') => Err(ValidationError::MisplacedOperator {
            operator: '|',
            offset: last_offset,
        }),
        _ => match open.first() {
            Some(&offset) => Err(ValidationError::UnbalancedParentheses { offset }),
            None => Ok(()),
        },
    }
}

/// Tokenize a validated expression and make concatenation explicit.
pub fn expand_concatenation(expr: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::with_capacity(expr.len() * 2);

    for token in expr.chars().map(Token::from_char) {
        if let Some(&prev) = tokens.last() {
            if prev.ends_operand() && token.starts_operand() {
                tokens.push(Token::Concat);
            }
        }
        tokens.push(token);
    }

    tokens
}

/// Translate an infix token stream to postfix (shunting-yard).
///
/// Unary operators are right-associative and only yield to strictly stronger
/// operators; binary operators are left-associative.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>> {
    let mut output: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();

    for &token in tokens {
        match token {
            Token::Literal(_) | Token::EndMarker => output.push(token),
            Token::Open => operators.push(token),
            Token::Close => loop {
                match operators.pop() {
                    Some(Token::Open) => break,
                    Some(op) => output.push(op),
                    None => {
                        return Err(Error::MalformedExpression {
                            remaining: output.len(),
                        });
                    }
                }
            },
            op => {
                let precedence = op.precedence();
                while let Some(&top) = operators.last() {
                    if top == Token::Open {
                        break;
                    }
                    let yields = if op.is_unary() {
                        top.precedence() > precedence
                    } else {
                        top.precedence() >= precedence
                    };
                    if !yields {
                        break;
                    }
                    output.push(top);
                    operators.pop();
                }
                operators.push(op);
            }
        }
    }

    while let Some(op) = operators.pop() {
        if op == Token::Open {
            return Err(Error::MalformedExpression {
                remaining: operators.len() + 1,
            });
        }
        output.push(op);
    }

    Ok(output)
}

/// Validate `expr` and translate it to postfix.
pub fn postfix(expr: &str) -> Result<Vec<Token>> {
    validate(expr)?;
    let expanded = expand_concatenation(expr);
    let postfix = to_postfix(&expanded)?;
    debug!("{expr:?} -> infix {} -> postfix {}", render(&expanded), render(&postfix));
    Ok(postfix)
}

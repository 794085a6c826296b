//! Boolean expressions over tag names
//!
//! Provides [`Expr`], the shared grammar behind context and label filters.
//!
//! # Grammar
//! - `a, b` → `a or b` (comma is a top-level `or`)
//! - `a or b and c` → `a or (b and c)`
//! - `!a` / `not a` → negation
//! - `( ... )` → grouping
//!
//! Names and keywords are case-insensitive.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Parsed boolean expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A single tag name (lower-cased)
    Name(String),

    /// Negated sub-expression
    Not(Box<Expr>),

    /// All operands must hold
    And(Vec<Expr>),

    /// Any operand must hold
    Or(Vec<Expr>),
}

impl Expr {
    /// Parse expression text
    ///
    /// Returns `Ok(None)` for blank text, which callers treat as "matches anything".
    ///
    /// # Errors
    /// Returns [`ExpressionError`] for unbalanced parentheses, dangling
    /// operators or stray tokens.
    pub fn parse(text: &str) -> Result<Option<Self>, ExpressionError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(None);
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            source: text,
        };
        let expr = parser.parse_list()?;

        match parser.peek() {
            None => Ok(Some(expr)),
            Some(Token::RParen) => Err(ExpressionError::UnbalancedParentheses {
                expression: text.to_string(),
            }),
            Some(other) => Err(ExpressionError::UnexpectedToken {
                token: other.to_string(),
                expression: text.to_string(),
            }),
        }
    }

    /// Evaluate against a set of lower-cased names
    #[must_use]
    pub fn evaluate(&self, names: &BTreeSet<String>) -> bool {
        match self {
            Self::Name(name) => names.contains(name),
            Self::Not(inner) => !inner.evaluate(names),
            Self::And(operands) => operands.iter().all(|e| e.evaluate(names)),
            Self::Or(operands) => operands.iter().any(|e| e.evaluate(names)),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Not(inner) => write!(f, "!{inner}"),
            Self::And(operands) => write_joined(f, operands, " and "),
            Self::Or(operands) => write_joined(f, operands, " or "),
        }
    }
}

fn write_joined(f: &mut Formatter<'_>, operands: &[Expr], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, e) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{e}")?;
    }
    write!(f, ")")
}

/// Split comma-separated names into a lower-cased set, dropping blanks
#[must_use]
pub fn split_names(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Errors for expression parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// Parentheses do not pair up
    #[error("unbalanced parentheses in expression: '{expression}'")]
    UnbalancedParentheses {
        /// Source text
        expression: String,
    },

    /// Operator with nothing to apply to
    #[error("missing operand after '{operator}' in expression: '{expression}'")]
    MissingOperand {
        /// The dangling operator
        operator: String,
        /// Source text
        expression: String,
    },

    /// Token that cannot appear at this position
    #[error("unexpected '{token}' in expression: '{expression}'")]
    UnexpectedToken {
        /// The offending token
        token: String,
        /// Source text
        expression: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Comma,
    Not,
    And,
    Or,
    Word(String),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::Comma => write!(f, ","),
            Self::Not => write!(f, "not"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Word(w) => write!(f, "{w}"),
        }
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            '!' => Some(Token::Not),
            c if c.is_whitespace() => None,
            c => {
                word.push(c);
                continue;
            }
        };

        flush_word(&mut word, &mut tokens);
        if let Some(token) = single {
            tokens.push(token);
        }
    }
    flush_word(&mut word, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }
    let lower = word.to_lowercase();
    word.clear();
    tokens.push(match lower.as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        _ => Token::Word(lower),
    });
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_list(&mut self) -> Result<Expr, ExpressionError> {
        let mut operands = vec![self.parse_or()?];
        while self.eat(&Token::Comma) {
            operands.push(self.parse_or()?);
        }
        Ok(collapse(operands, Expr::Or))
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut operands = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            operands.push(self.parse_and()?);
        }
        Ok(collapse(operands, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut operands = vec![self.parse_unary()?];
        while self.eat(&Token::And) {
            operands.push(self.parse_unary()?);
        }
        Ok(collapse(operands, Expr::And))
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat(&Token::Not) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let previous = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or_else(|| "start".to_string(), ToString::to_string);

        match self.bump() {
            Some(Token::Word(name)) => Ok(Expr::Name(name)),
            Some(Token::LParen) => {
                let inner = self.parse_list()?;
                if self.eat(&Token::RParen) {
                    Ok(inner)
                } else {
                    Err(ExpressionError::UnbalancedParentheses {
                        expression: self.source.to_string(),
                    })
                }
            }
            Some(Token::RParen) | None => Err(ExpressionError::MissingOperand {
                operator: previous,
                expression: self.source.to_string(),
            }),
            Some(token) => Err(ExpressionError::UnexpectedToken {
                token: token.to_string(),
                expression: self.source.to_string(),
            }),
        }
    }
}

fn collapse(mut operands: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        wrap(operands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn eval(text: &str, active: &[&str]) -> bool {
        Expr::parse(text).unwrap().unwrap().evaluate(&names(active))
    }

    #[test]
    fn blank_text_parses_to_none() {
        assert_eq!(Expr::parse("").unwrap(), None);
        assert_eq!(Expr::parse("   ").unwrap(), None);
    }

    #[test]
    fn single_name_is_lowercased() {
        assert_eq!(Expr::parse("Prod").unwrap(), Some(Expr::Name("prod".into())));
    }

    #[test]
    fn comma_acts_as_or() {
        assert!(eval("dev, test", &["test"]));
        assert!(!eval("dev, test", &["prod"]));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a or (b and c)
        assert!(eval("a or b and c", &["a"]));
        assert!(!eval("a or b and c", &["b"]));
        assert!(eval("a or b and c", &["b", "c"]));
    }

    #[test]
    fn parentheses_group() {
        assert!(!eval("(a or b) and c", &["a"]));
        assert!(eval("(a or b) and c", &["a", "c"]));
    }

    #[test]
    fn negation_forms() {
        assert!(eval("!prod", &["dev"]));
        assert!(!eval("!prod", &["prod"]));
        assert!(eval("NOT prod", &["dev"]));
        assert!(eval("!(a and b)", &["a"]));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(eval("a AND b", &["a", "b"]));
        assert!(eval("a Or b", &["b"]));
    }

    #[test]
    fn unbalanced_parentheses_rejected() {
        assert!(matches!(
            Expr::parse("(a or b"),
            Err(ExpressionError::UnbalancedParentheses { .. })
        ));
        assert!(matches!(
            Expr::parse("a or b)"),
            Err(ExpressionError::UnbalancedParentheses { .. })
        ));
    }

    #[test]
    fn dangling_operator_rejected() {
        assert!(matches!(
            Expr::parse("a and"),
            Err(ExpressionError::MissingOperand { .. })
        ));
        assert!(matches!(
            Expr::parse("!"),
            Err(ExpressionError::MissingOperand { .. })
        ));
    }

    #[test]
    fn adjacent_names_rejected() {
        assert!(matches!(
            Expr::parse("a b"),
            Err(ExpressionError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn split_names_trims_and_drops_blanks() {
        assert_eq!(split_names(" A, b ,,c "), names(&["a", "b", "c"]));
        assert!(split_names("").is_empty());
    }
}

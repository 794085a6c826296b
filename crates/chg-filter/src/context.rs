//! Execution contexts and context expressions
//!
//! [`Contexts`] is the set a run executes with; [`ContextExpression`] is the
//! restriction attached to a value or changeset.

use crate::expression::{split_names, Expr, ExpressionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Active contexts of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contexts(BTreeSet<String>);

impl Contexts {
    /// Empty context set (matches every expression)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse comma-separated context names
    #[inline]
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self(split_names(text))
    }

    /// Build from individual names
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Check whether a context is active (case-insensitive)
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name.to_lowercase())
    }

    /// Lower-cased names
    #[inline]
    #[must_use]
    pub fn names(&self) -> &BTreeSet<String> {
        &self.0
    }

    /// Number of active contexts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no context is active
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Contexts {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for Contexts {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(String::as_str).collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Context restriction
///
/// An empty expression matches any run. A non-empty expression matches when
/// the run has no contexts at all, or when the expression holds over the
/// run's contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContextExpression {
    source: String,
    expr: Option<Expr>,
}

impl ContextExpression {
    /// Unrestricted expression
    #[inline]
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse expression text
    ///
    /// # Errors
    /// Returns [`ExpressionError`] when the text is malformed
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        Ok(Self {
            source: text.trim().to_string(),
            expr: Expr::parse(text)?,
        })
    }

    /// True when no restriction is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// Parsed form, if any
    #[inline]
    #[must_use]
    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    /// Check against a run's active contexts
    #[must_use]
    pub fn matches(&self, active: &Contexts) -> bool {
        match &self.expr {
            None => true,
            Some(_) if active.is_empty() => true,
            Some(expr) => expr.evaluate(active.names()),
        }
    }
}

impl FromStr for ContextExpression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ContextExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_parse_lowercases() {
        let c = Contexts::parse("Dev, QA");
        assert!(c.contains("dev"));
        assert!(c.contains("qa"));
        assert_eq!(c.len(), 2);
        assert_eq!(c.to_string(), "dev,qa");
    }

    #[test]
    fn contexts_from_names_drops_blanks() {
        let c = Contexts::from_names(["prod", " ", ""]);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn empty_expression_matches_anything() {
        let e = ContextExpression::any();
        assert!(e.is_empty());
        assert!(e.matches(&Contexts::parse("prod")));
        assert!(e.matches(&Contexts::new()));
    }

    #[test]
    fn empty_run_contexts_match_any_expression() {
        let e = ContextExpression::parse("prod").unwrap();
        assert!(e.matches(&Contexts::new()));
    }

    #[test]
    fn expression_checks_run_contexts() {
        let e = ContextExpression::parse("prod").unwrap();
        assert!(e.matches(&Contexts::parse("PROD")));
        assert!(!e.matches(&Contexts::parse("dev")));
    }

    #[test]
    fn negated_expression() {
        let e = ContextExpression::parse("!test").unwrap();
        assert!(e.matches(&Contexts::parse("prod")));
        assert!(!e.matches(&Contexts::parse("test")));
    }

    #[test]
    fn from_str_reports_errors() {
        assert!("(prod".parse::<ContextExpression>().is_err());
        let e: ContextExpression = " prod and eu ".parse().unwrap();
        assert_eq!(e.to_string(), "prod and eu");
    }
}

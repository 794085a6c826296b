//! Labels and label expressions
//!
//! The direction is the reverse of contexts: a value carries a plain
//! [`Labels`] set and the run carries a [`LabelExpression`].

use crate::expression::{split_names, Expr, ExpressionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Labels attached to a value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Labels(BTreeSet<String>);

impl Labels {
    /// No labels
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse comma-separated labels
    #[inline]
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self(split_names(text))
    }

    /// Build from individual labels
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

    /// Check for a label (case-insensitive)
    #[inline]
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(&label.to_lowercase())
    }

    /// Lower-cased labels
    #[inline]
    #[must_use]
    pub fn names(&self) -> &BTreeSet<String> {
        &self.0
    }

    /// True when no label is attached
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Labels {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for Labels {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(String::as_str).collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Label filter of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelExpression {
    source: String,
    expr: Option<Expr>,
}

impl LabelExpression {
    /// Filter that accepts every label set
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

    /// True when the filter accepts everything
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// Check a value's labels
    ///
    /// Unlabelled values always pass.
    #[must_use]
    pub fn matches(&self, labels: &Labels) -> bool {
        match &self.expr {
            None => true,
            Some(_) if labels.is_empty() => true,
            Some(expr) => expr.evaluate(labels.names()),
        }
    }
}

impl FromStr for LabelExpression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for LabelExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlabelled_value_passes_any_filter() {
        let filter = LabelExpression::parse("release-1 and !hotfix").unwrap();
        assert!(filter.matches(&Labels::new()));
    }

    #[test]
    fn empty_filter_passes_any_labels() {
        assert!(LabelExpression::any().matches(&Labels::parse("a,b")));
    }

    #[test]
    fn filter_evaluates_labels() {
        let filter = LabelExpression::parse("release-1 and !hotfix").unwrap();
        assert!(filter.matches(&Labels::parse("release-1")));
        assert!(!filter.matches(&Labels::parse("release-1, HOTFIX")));
        assert!(!filter.matches(&Labels::parse("release-2")));
    }

    #[test]
    fn labels_display_sorted() {
        assert_eq!(Labels::parse("b, A").to_string(), "a,b");
    }
}

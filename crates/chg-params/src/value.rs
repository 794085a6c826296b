//! Scoped parameter values
//!
//! Provides [`ScopedValue`], the immutable record every tier stores, and
//! [`Restrictions`], the context/label/database attributes a value may carry.

use chg_filter::{ContextExpression, DatabaseSet, ExpressionError, Labels};

/// Opaque parameter payload
///
/// `Null` and `""` are present values; absence is expressed with `Option`.
pub type ParameterValue = serde_json::Value;

/// Render a payload for text substitution
///
/// Strings are inserted as-is, everything else uses its JSON text.
#[must_use]
pub fn render(value: &ParameterValue) -> String {
    match value {
        ParameterValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Case-insensitive key comparison
#[inline]
#[must_use]
pub fn keys_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || (!a.is_ascii() && a.to_lowercase() == b.to_lowercase())
}

/// Context, label and database attributes of a value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions {
    /// Context restriction
    pub contexts: ContextExpression,

    /// Attached labels
    pub labels: Labels,

    /// Target databases
    pub databases: DatabaseSet,
}

impl Restrictions {
    /// No restrictions
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse the textual attribute forms
    ///
    /// Blank text for any attribute means unrestricted for that attribute.
    ///
    /// # Errors
    /// Returns [`ExpressionError`] if the context text is malformed
    pub fn parse(contexts: &str, labels: &str, databases: &str) -> Result<Self, ExpressionError> {
        Ok(Self {
            contexts: ContextExpression::parse(contexts)?,
            labels: Labels::parse(labels),
            databases: DatabaseSet::parse(databases),
        })
    }

    /// With context restriction
    #[inline]
    #[must_use]
    pub fn with_contexts(mut self, contexts: ContextExpression) -> Self {
        self.contexts = contexts;
        self
    }

    /// With labels
    #[inline]
    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// With target databases
    #[inline]
    #[must_use]
    pub fn with_databases(mut self, databases: DatabaseSet) -> Self {
        self.databases = databases;
        self
    }

    /// True when any attribute is present
    #[inline]
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        !self.contexts.is_empty() || !self.labels.is_empty() || self.databases.is_restricted()
    }
}

/// One registered parameter value
///
/// Entries are never mutated after construction. Several entries may share a
/// key; which one a lookup returns is decided by scan order alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedValue {
    key: String,
    value: ParameterValue,
    restrictions: Restrictions,
    filterable: bool,
}

impl ScopedValue {
    /// Create a value
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        value: impl Into<ParameterValue>,
        restrictions: Restrictions,
        filterable: bool,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            restrictions,
            filterable,
        }
    }

    /// Unrestricted, non-filterable value (environment and process properties)
    #[inline]
    #[must_use]
    pub fn system(key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        Self::new(key, value, Restrictions::none(), false)
    }

    /// Key as registered
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Payload
    #[inline]
    #[must_use]
    pub fn value(&self) -> &ParameterValue {
        &self.value
    }

    /// All attributes
    #[inline]
    #[must_use]
    pub fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }

    /// Context restriction
    #[inline]
    #[must_use]
    pub fn valid_contexts(&self) -> &ContextExpression {
        &self.restrictions.contexts
    }

    /// Attached labels
    #[inline]
    #[must_use]
    pub fn valid_labels(&self) -> &Labels {
        &self.restrictions.labels
    }

    /// Target databases
    #[inline]
    #[must_use]
    pub fn valid_databases(&self) -> &DatabaseSet {
        &self.restrictions.databases
    }

    /// Whether the active filter applies by default
    #[inline]
    #[must_use]
    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    /// True when any context, label or database attribute is present
    #[inline]
    #[must_use]
    pub fn has_restrictions(&self) -> bool {
        self.restrictions.is_restricted()
    }

    /// Case-insensitive key match
    #[inline]
    #[must_use]
    pub fn key_matches(&self, key: &str) -> bool {
        keys_equal(&self.key, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_strings_raw() {
        assert_eq!(render(&json!("users")), "users");
        assert_eq!(render(&json!("")), "");
    }

    #[test]
    fn render_other_payloads_as_json() {
        assert_eq!(render(&json!(12)), "12");
        assert_eq!(render(&json!(true)), "true");
        assert_eq!(render(&ParameterValue::Null), "null");
    }

    #[test]
    fn keys_compare_case_insensitively() {
        assert!(keys_equal("table.name", "TABLE.Name"));
        assert!(keys_equal("ÄNDERUNG", "änderung"));
        assert!(!keys_equal("table", "tables"));
    }

    #[test]
    fn system_value_is_unfiltered() {
        let v = ScopedValue::system("HOME", "/root");
        assert!(!v.is_filterable());
        assert!(!v.has_restrictions());
        assert!(v.key_matches("home"));
    }

    #[test]
    fn restrictions_parse_blank_as_none() {
        let r = Restrictions::parse("", " ", "").unwrap();
        assert!(!r.is_restricted());
    }

    #[test]
    fn restrictions_detect_each_attribute() {
        assert!(Restrictions::parse("prod", "", "").unwrap().is_restricted());
        assert!(Restrictions::parse("", "v1", "").unwrap().is_restricted());
        assert!(Restrictions::parse("", "", "h2").unwrap().is_restricted());
    }

    #[test]
    fn restrictions_reject_bad_contexts() {
        assert!(Restrictions::parse("prod and", "", "").is_err());
    }
}

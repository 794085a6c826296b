//! Active filter of a run
//!
//! Provides [`ActiveFilter`], the predicate every candidate value must pass
//! before it can win a lookup.

use crate::value::ScopedValue;
use chg_filter::{Contexts, LabelExpression};

/// Contexts, labels and target database the run executes with
///
/// Unset parts accept every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilter {
    contexts: Option<Contexts>,
    labels: Option<LabelExpression>,
    database: Option<String>,
}

impl ActiveFilter {
    /// Filter with nothing set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With active contexts
    #[inline]
    #[must_use]
    pub fn with_contexts(mut self, contexts: Contexts) -> Self {
        self.contexts = Some(contexts);
        self
    }

    /// With label filter
    #[inline]
    #[must_use]
    pub fn with_labels(mut self, labels: LabelExpression) -> Self {
        self.labels = Some(labels);
        self
    }

    /// With target database short name
    #[inline]
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Active contexts
    #[inline]
    #[must_use]
    pub fn contexts(&self) -> Option<&Contexts> {
        self.contexts.as_ref()
    }

    /// Label filter
    #[inline]
    #[must_use]
    pub fn labels(&self) -> Option<&LabelExpression> {
        self.labels.as_ref()
    }

    /// Target database short name
    #[inline]
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Replace active contexts
    #[inline]
    pub fn set_contexts(&mut self, contexts: Option<Contexts>) {
        self.contexts = contexts;
    }

    /// Replace label filter
    #[inline]
    pub fn set_labels(&mut self, labels: Option<LabelExpression>) {
        self.labels = labels;
    }

    /// Replace target database
    #[inline]
    pub fn set_database(&mut self, database: Option<String>) {
        self.database = database;
    }

    /// Decide whether a value is visible to this run
    ///
    /// Non-filterable values without attributes always pass. Any value that
    /// carries attributes is checked, whatever its filterable flag says.
    #[must_use]
    pub fn matches(&self, value: &ScopedValue) -> bool {
        if !value.is_filterable() && !value.has_restrictions() {
            return true;
        }

        let labels_ok = self
            .labels
            .as_ref()
            .map_or(true, |filter| filter.matches(value.valid_labels()));
        let contexts_ok = self
            .contexts
            .as_ref()
            .map_or(true, |active| value.valid_contexts().matches(active));
        let database_ok = self.database.as_deref().map_or(true, |db| {
            !value.valid_databases().is_restricted() || value.valid_databases().accepts(db)
        });

        labels_ok && contexts_ok && database_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Restrictions;
    use chg_filter::{ContextExpression, DatabaseSet, Labels};

    fn global(restrictions: Restrictions) -> ScopedValue {
        ScopedValue::new("k", "v", restrictions, true)
    }

    fn exclude_everything() -> ActiveFilter {
        ActiveFilter::new()
            .with_contexts(Contexts::parse("nothing-matches"))
            .with_labels(LabelExpression::parse("no-such-label").unwrap())
            .with_database("no-such-db")
    }

    #[test]
    fn unset_filter_accepts_restricted_values() {
        let v = global(Restrictions::parse("prod", "v1", "oracle").unwrap());
        assert!(ActiveFilter::new().matches(&v));
    }

    #[test]
    fn unrestricted_system_value_ignores_filter() {
        let v = ScopedValue::system("HOME", "/root");
        assert!(exclude_everything().matches(&v));
    }

    #[test]
    fn unrestricted_filterable_value_passes_everything() {
        let v = global(Restrictions::none());
        assert!(exclude_everything().matches(&v));
    }

    #[test]
    fn non_filterable_value_with_attributes_is_checked() {
        let v = ScopedValue::new(
            "k",
            "v",
            Restrictions::none().with_contexts(ContextExpression::parse("prod").unwrap()),
            false,
        );
        let dev = ActiveFilter::new().with_contexts(Contexts::parse("dev"));
        let prod = ActiveFilter::new().with_contexts(Contexts::parse("prod"));

        assert!(!dev.matches(&v));
        assert!(prod.matches(&v));
    }

    #[test]
    fn context_restriction() {
        let v = global(Restrictions::none().with_contexts(ContextExpression::parse("prod").unwrap()));

        assert!(!ActiveFilter::new().with_contexts(Contexts::parse("dev")).matches(&v));
        assert!(ActiveFilter::new().with_contexts(Contexts::parse("prod")).matches(&v));
    }

    #[test]
    fn label_restriction() {
        let v = global(Restrictions::none().with_labels(Labels::parse("v1")));

        let v2 = ActiveFilter::new().with_labels(LabelExpression::parse("v2").unwrap());
        let v1 = ActiveFilter::new().with_labels(LabelExpression::parse("v1 or v2").unwrap());
        assert!(!v2.matches(&v));
        assert!(v1.matches(&v));
    }

    #[test]
    fn database_restriction_is_case_insensitive() {
        let v = global(Restrictions::none().with_databases(DatabaseSet::parse("postgresql,oracle")));

        assert!(!ActiveFilter::new().with_database("mysql").matches(&v));
        assert!(ActiveFilter::new().with_database("Oracle").matches(&v));
    }

    #[test]
    fn all_parts_must_pass() {
        let v = global(Restrictions::parse("prod", "", "oracle").unwrap());
        let filter = ActiveFilter::new()
            .with_contexts(Contexts::parse("prod"))
            .with_database("mysql");

        assert!(!filter.matches(&v));
    }

    #[test]
    fn setters_replace_state() {
        let mut filter = exclude_everything();
        filter.set_contexts(None);
        filter.set_labels(None);
        filter.set_database(None);
        assert_eq!(filter, ActiveFilter::new());
    }
}

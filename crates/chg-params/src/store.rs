//! Tiered parameter store
//!
//! Provides [`ParameterStore`], which holds every registered value of a run
//! and answers lookups against the active filter.
//!
//! # Scan order
//!
//! 1. Execution values, when a position is supplied
//! 2. System tier, in insertion order
//! 3. Global tier, in insertion order
//! 4. The local bucket of the position, then of each ancestor up to the root,
//!    each bucket newest first
//!
//! The first entry whose key matches and whose restrictions pass wins. Since
//! nothing is ever removed, the first global registration of a key is the one
//! every later lookup sees.

use crate::config::StoreConfig;
use crate::database::DatabaseProfile;
use crate::error::{ExpandError, ParameterError};
use crate::execution::ExecutionValue;
use crate::expander::{ExpressionExpander, MissingPropertyMode};
use crate::filter::ActiveFilter;
use crate::position::{ancestry, ChangelogPosition};
use crate::value::{render, ParameterValue, Restrictions, ScopedValue};
use chg_filter::{Contexts, LabelExpression};
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// Prefix of defaults-file entries that become parameters
pub const DEFAULTS_PARAMETER_PREFIX: &str = "parameter.";

/// Storage tier of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Process environment and properties
    System,

    /// Visible from every changelog
    Global,

    /// Visible from one changelog and the changelogs it includes
    Local,
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::Global => "global",
            Self::Local => "local",
        };
        f.pad(name)
    }
}

/// Where a registration goes
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    /// Global tier
    Global,

    /// Local bucket of a changelog; `None` is rejected
    Local(Option<&'a dyn ChangelogPosition>),
}

/// One candidate considered by [`ParameterStore::explain`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Tier the entry lives in
    pub tier: Tier,
    /// Scope key for local entries
    pub scope: Option<String>,
    /// Key as registered
    pub key: String,
    /// Payload
    pub value: ParameterValue,
    /// Context restriction text
    pub contexts: String,
    /// Attached labels
    pub labels: String,
    /// Target databases
    pub databases: String,
    /// Filterable flag
    pub filterable: bool,
    /// Whether the active filter accepted it
    pub accepted: bool,
}

/// Full account of how a key resolves
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// Key looked up
    pub key: String,
    /// Execution value that short-circuited the scan
    pub execution: Option<ExecutionValue>,
    /// Every entry with a matching key, in scan order
    pub candidates: Vec<Candidate>,
    /// Index of the winning candidate
    pub winner: Option<usize>,
    /// Resolved value
    pub value: Option<ParameterValue>,
}

#[derive(Clone, Copy)]
struct Entry<'s> {
    tier: Tier,
    scope: Option<&'s str>,
    value: &'s ScopedValue,
}

/// Builder for [`ParameterStore`]
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    config: StoreConfig,
    system_values: Vec<(String, ParameterValue)>,
    database: Option<DatabaseProfile>,
}

impl StoreBuilder {
    /// Create builder with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the system tier from the process environment
    #[inline]
    #[must_use]
    pub fn with_process_environment(mut self) -> Self {
        self.config.seed_environment = true;
        self
    }

    /// Extra system values, registered after the environment
    #[must_use]
    pub fn with_system_values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParameterValue>,
    {
        self.system_values
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// With target database
    #[inline]
    #[must_use]
    pub fn with_database(mut self, profile: DatabaseProfile) -> Self {
        self.database = Some(profile);
        self
    }

    /// Build the store
    #[must_use]
    pub fn build(self) -> ParameterStore {
        let mut store = ParameterStore {
            system: Vec::new(),
            global: Vec::new(),
            local: IndexMap::new(),
            filter: ActiveFilter::new(),
            expander: ExpressionExpander::new(self.config.missing_property_mode),
            deployment_id: self.config.resolve_deployment_id(),
        };

        if self.config.seed_environment {
            store.system.extend(
                std::env::vars_os()
                    .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                    .map(|(k, v)| ScopedValue::system(k, v)),
            );
        }
        store.system.extend(
            self.system_values
                .into_iter()
                .map(|(k, v)| ScopedValue::system(k, v)),
        );
        tracing::debug!(count = store.system.len(), "seeded system parameters");

        if let Some(profile) = self.database {
            for (key, value) in profile.parameters() {
                store.set(key, value);
            }
            tracing::debug!(database = %profile.short_name, "registered database parameters");
            store.filter.set_database(Some(profile.short_name));
        }

        store
    }
}

/// Parameter store of one run
///
/// Mutation takes `&mut self`, lookups take `&self`; there is no internal
/// locking. The store is `Send`, but a store shared between concurrent runs
/// must be synchronized by the caller.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    system: Vec<ScopedValue>,
    global: Vec<ScopedValue>,
    local: IndexMap<String, Vec<ScopedValue>>,
    filter: ActiveFilter,
    expander: ExpressionExpander,
    deployment_id: String,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    /// Empty store: no environment, no database
    #[must_use]
    pub fn new() -> Self {
        StoreBuilder::new().build()
    }

    /// Start a builder
    #[inline]
    #[must_use]
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a value
    ///
    /// Earlier entries are never replaced; see the module docs for which
    /// entry a lookup returns.
    ///
    /// # Errors
    /// Returns [`ParameterError::MissingChangelog`] for a local scope without
    /// a position
    pub fn register(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParameterValue>,
        restrictions: Restrictions,
        scope: Scope<'_>,
    ) -> Result<(), ParameterError> {
        let key = key.into();
        match scope {
            Scope::Global => self.push_global(key, value.into(), restrictions),
            Scope::Local(None) => return Err(ParameterError::missing_changelog(key)),
            Scope::Local(Some(position)) => {
                let scope_key = position.scope_key();
                tracing::debug!(key = %key, scope = scope_key, "registered local parameter");
                self.local
                    .entry(scope_key.to_string())
                    .or_default()
                    .push(ScopedValue::new(key, value, restrictions, true));
            }
        }
        Ok(())
    }

    /// Unrestricted global value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) {
        self.set_global(key, value, Restrictions::none());
    }

    /// Global value with restrictions
    pub fn set_global(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParameterValue>,
        restrictions: Restrictions,
    ) {
        self.push_global(key.into(), value.into(), restrictions);
    }

    fn push_global(&mut self, key: String, value: ParameterValue, restrictions: Restrictions) {
        tracing::debug!(key = %key, "registered global parameter");
        self.global
            .push(ScopedValue::new(key, value, restrictions, true));
    }

    /// Unrestricted local value
    ///
    /// # Errors
    /// Returns [`ParameterError::MissingChangelog`] without a position
    pub fn set_local(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParameterValue>,
        position: Option<&dyn ChangelogPosition>,
    ) -> Result<(), ParameterError> {
        self.register(key, value, Restrictions::none(), Scope::Local(position))
    }

    /// Register from the textual attribute forms of a changelog property
    ///
    /// `databases` is a comma separated list; blank text for any attribute
    /// means unrestricted. `global` picks the tier.
    ///
    /// # Errors
    /// Returns [`ParameterError::InvalidRestriction`] for malformed context
    /// text and [`ParameterError::MissingChangelog`] for a local value
    /// without a position
    #[allow(clippy::too_many_arguments)]
    pub fn set_with_attributes(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParameterValue>,
        contexts: &str,
        labels: &str,
        databases: &str,
        global: bool,
        position: Option<&dyn ChangelogPosition>,
    ) -> Result<(), ParameterError> {
        let restrictions = Restrictions::parse(contexts, labels, databases)?;
        let scope = if global {
            Scope::Global
        } else {
            Scope::Local(position)
        };
        self.register(key, value, restrictions, scope)
    }

    /// Register command-line style overrides as unrestricted globals
    pub fn add_overrides<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParameterValue>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Register `parameter.*` entries of a defaults source
    ///
    /// The prefix is stripped; other entries are ignored. Returns how many
    /// entries were registered.
    pub fn add_defaults_file_parameters<I, K, V>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParameterValue>,
    {
        let mut count = 0;
        for (key, value) in entries {
            if let Some(name) = key.as_ref().strip_prefix(DEFAULTS_PARAMETER_PREFIX) {
                self.set(name, value);
                count += 1;
            }
        }
        tracing::debug!(count, "registered defaults file parameters");
        count
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    fn execution_value(key: &str, position: Option<&dyn ChangelogPosition>) -> Option<ExecutionValue> {
        position.and(ExecutionValue::find_by_name(key))
    }

    fn entries<'s>(&'s self, position: Option<&dyn ChangelogPosition>) -> impl Iterator<Item = Entry<'s>> + 's {
        let levels: Vec<(&'s str, &'s Vec<ScopedValue>)> = ancestry(position)
            .filter_map(|p| self.local.get_key_value(p.scope_key()))
            .map(|(scope, values)| (scope.as_str(), values))
            .collect();

        let system = self.system.iter().map(|value| Entry {
            tier: Tier::System,
            scope: None,
            value,
        });
        let global = self.global.iter().map(|value| Entry {
            tier: Tier::Global,
            scope: None,
            value,
        });
        let local = levels.into_iter().flat_map(|(scope, values)| {
            values.iter().rev().map(move |value| Entry {
                tier: Tier::Local,
                scope: Some(scope),
                value,
            })
        });

        system.chain(global).chain(local)
    }

    fn find(&self, key: &str, position: Option<&dyn ChangelogPosition>) -> Option<Entry<'_>> {
        self.entries(position)
            .find(|entry| entry.value.key_matches(key) && self.filter.matches(entry.value))
    }

    /// Resolve a key
    ///
    /// Absence is `None`; a registered `Null` payload is a present value. An
    /// execution name with nothing to report is absent, and stored values of
    /// that name stay hidden.
    #[must_use]
    pub fn resolve(
        &self,
        key: &str,
        position: Option<&dyn ChangelogPosition>,
    ) -> Option<Cow<'_, ParameterValue>> {
        if let (Some(exec), Some(pos)) = (Self::execution_value(key, position), position) {
            tracing::trace!(key, execution = %exec, "resolved execution value");
            return exec.compute(pos, &self.deployment_id).map(Cow::Owned);
        }

        let entry = self.find(key, position)?;
        tracing::trace!(key, tier = %entry.tier, scope = entry.scope, "resolved parameter");
        Some(Cow::Borrowed(entry.value.value()))
    }

    /// Resolve and render as substitution text
    ///
    /// A `Null` payload has no text and is `None`, so [`Self::expand`] treats
    /// it like a missing name.
    #[must_use]
    pub fn resolve_text(&self, key: &str, position: Option<&dyn ChangelogPosition>) -> Option<String> {
        self.resolve(key, position)
            .filter(|value| !value.is_null())
            .map(|value| render(&value))
    }

    /// Whether `resolve` would return a value
    #[inline]
    #[must_use]
    pub fn has_value(&self, key: &str, position: Option<&dyn ChangelogPosition>) -> bool {
        self.resolve(key, position).is_some()
    }

    /// Look only at the position's own local bucket
    ///
    /// Uses the same filter and newest-first order as [`Self::resolve`].
    #[must_use]
    pub fn local_value(&self, key: &str, position: &dyn ChangelogPosition) -> Option<&ParameterValue> {
        self.local
            .get(position.scope_key())?
            .iter()
            .rev()
            .find(|v| v.key_matches(key) && self.filter.matches(v))
            .map(ScopedValue::value)
    }

    /// Expand `${...}` placeholders against this store
    ///
    /// # Errors
    /// Returns [`ExpandError::UnresolvedParameter`] under
    /// [`MissingPropertyMode::Error`] when a name is absent
    pub fn expand(&self, text: &str, position: Option<&dyn ChangelogPosition>) -> Result<String, ExpandError> {
        let location = position.map(|p| p.file_path());
        self.expander
            .expand(text, location, |name| self.resolve_text(name, position))
    }

    /// Every candidate for `key` and which one wins
    #[must_use]
    pub fn explain(&self, key: &str, position: Option<&dyn ChangelogPosition>) -> Explanation {
        let execution = Self::execution_value(key, position);

        let candidates: Vec<Candidate> = self
            .entries(position)
            .filter(|entry| entry.value.key_matches(key))
            .map(|entry| Candidate {
                tier: entry.tier,
                scope: entry.scope.map(str::to_string),
                key: entry.value.key().to_string(),
                value: entry.value.value().clone(),
                contexts: entry.value.valid_contexts().to_string(),
                labels: entry.value.valid_labels().to_string(),
                databases: entry.value.valid_databases().to_string(),
                filterable: entry.value.is_filterable(),
                accepted: self.filter.matches(entry.value),
            })
            .collect();

        let winner = if execution.is_some() {
            None
        } else {
            candidates.iter().position(|c| c.accepted)
        };

        Explanation {
            key: key.to_string(),
            execution,
            value: self.resolve(key, position).map(Cow::into_owned),
            candidates,
            winner,
        }
    }

    // ------------------------------------------------------------------
    // Filter and policy
    // ------------------------------------------------------------------

    /// Active filter
    #[inline]
    #[must_use]
    pub fn active_filter(&self) -> &ActiveFilter {
        &self.filter
    }

    /// Replace the active filter
    #[inline]
    pub fn set_active_filter(&mut self, filter: ActiveFilter) {
        self.filter = filter;
    }

    /// Active contexts
    #[inline]
    #[must_use]
    pub fn contexts(&self) -> Option<&Contexts> {
        self.filter.contexts()
    }

    /// Replace active contexts
    #[inline]
    pub fn set_contexts(&mut self, contexts: Option<Contexts>) {
        self.filter.set_contexts(contexts);
    }

    /// Label filter
    #[inline]
    #[must_use]
    pub fn labels(&self) -> Option<&LabelExpression> {
        self.filter.labels()
    }

    /// Replace label filter
    #[inline]
    pub fn set_labels(&mut self, labels: Option<LabelExpression>) {
        self.filter.set_labels(labels);
    }

    /// Target database short name
    #[inline]
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.filter.database()
    }

    /// Replace target database
    #[inline]
    pub fn set_database(&mut self, database: Option<String>) {
        self.filter.set_database(database);
    }

    /// Missing-property policy of [`Self::expand`]
    #[inline]
    #[must_use]
    pub fn missing_property_mode(&self) -> MissingPropertyMode {
        self.expander.mode()
    }

    /// Replace missing-property policy
    #[inline]
    pub fn set_missing_property_mode(&mut self, mode: MissingPropertyMode) {
        self.expander = ExpressionExpander::new(mode);
    }

    /// Deployment id of the run
    #[inline]
    #[must_use]
    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Entries in one tier
    #[must_use]
    pub fn tier_len(&self, tier: Tier) -> usize {
        match tier {
            Tier::System => self.system.len(),
            Tier::Global => self.global.len(),
            Tier::Local => self.local.values().map(Vec::len).sum(),
        }
    }

    /// True when a tier holds nothing
    #[inline]
    #[must_use]
    pub fn tier_is_empty(&self, tier: Tier) -> bool {
        self.tier_len(tier) == 0
    }

    /// Entries across every tier
    #[must_use]
    pub fn len(&self) -> usize {
        [Tier::System, Tier::Global, Tier::Local]
            .into_iter()
            .map(|tier| self.tier_len(tier))
            .sum()
    }

    /// True when nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scope keys with a local bucket, in first-registration order
    pub fn local_scopes(&self) -> impl Iterator<Item = &str> {
        self.local.keys().map(String::as_str)
    }
}

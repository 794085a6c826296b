//! Target-database restrictions
//!
//! Provides [`DatabaseSet`] for deciding whether a value applies to the
//! active database short name.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Accepts every database
pub const ALL: &str = "all";

/// Rejects every database
pub const NONE: &str = "none";

/// Database restriction attached to a value
///
/// # Examples
/// - `Any` → no restriction was declared
/// - `Only(["postgresql", "oracle"])` → one of those two
/// - `Only(["!mysql"])` → anything but MySQL
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseSet {
    /// No restriction declared
    #[default]
    Any,

    /// Declared list of lower-cased short names (never empty)
    Only(Vec<String>),
}

impl DatabaseSet {
    /// Parse a comma-separated list; blank text is unrestricted
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::from_names(text.split(','))
    }

    /// Build from individual names; no names is unrestricted
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim().to_lowercase();
            if !name.is_empty() && !list.contains(&name) {
                list.push(name);
            }
        }

        if list.is_empty() {
            Self::Any
        } else {
            Self::Only(list)
        }
    }

    /// True when a list was declared
    #[inline]
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Only(list) if !list.is_empty())
    }

    /// Declared names (empty when unrestricted)
    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Self::Any => &[],
            Self::Only(list) => list,
        }
    }

    /// Check a database short name (case-insensitive)
    #[must_use]
    pub fn accepts(&self, database: &str) -> bool {
        definition_matches(self.names(), database, true)
    }
}

impl Display for DatabaseSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "{ALL}"),
            Self::Only(list) => write!(f, "{}", list.join(",")),
        }
    }
}

/// Match a database short name against a declared list
///
/// # Rules
/// 1. empty list → `if_empty`
/// 2. contains `all` → accepted
/// 3. contains `none` → rejected
/// 4. contains `!name` → rejected
/// 5. no positive entries, or `name` listed → accepted
/// 6. otherwise rejected
#[must_use]
pub(crate) fn definition_matches(definition: &[String], database: &str, if_empty: bool) -> bool {
    if definition.is_empty() {
        return if_empty;
    }

    let database = database.trim().to_lowercase();
    let lowered: Vec<String> = definition.iter().map(|d| d.trim().to_lowercase()).collect();

    if lowered.iter().any(|d| d == ALL) {
        return true;
    }
    if lowered.iter().any(|d| d == NONE) {
        return false;
    }
    if lowered
        .iter()
        .any(|d| d.strip_prefix('!').is_some_and(|n| n == database))
    {
        return false;
    }

    let mut positives = lowered.iter().filter(|d| !d.starts_with('!')).peekable();
    if positives.peek().is_none() {
        return true;
    }
    positives.any(|d| *d == database)
}

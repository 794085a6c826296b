//! Error types for the parameter store
//!
//! Provides error handling for:
//! - Registration (local values without a changelog, malformed restrictions)
//! - Expansion (placeholders that must resolve but do not)
//! - Configuration values given as text

use chg_filter::ExpressionError;

/// Errors during parameter registration and configuration
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    /// Local registration without a changelog position
    #[error("changelog position is required when setting local parameter '{key}'")]
    MissingChangelog {
        /// Key that was being registered
        key: String,
    },

    /// Context or label text could not be parsed
    #[error("invalid parameter restriction: {0}")]
    InvalidRestriction(#[from] ExpressionError),

    /// Unrecognised missing-property mode
    #[error("unknown missing property mode: '{0}' (expected preserve, empty or error)")]
    UnknownMissingPropertyMode(String),
}

impl ParameterError {
    /// Create missing changelog error for key
    pub fn missing_changelog(key: impl Into<String>) -> Self {
        Self::MissingChangelog { key: key.into() }
    }
}

/// Errors during placeholder expansion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    /// Placeholder name resolved to nothing under the error policy
    #[error("could not resolve expression `${{{}}}`{}", .name, in_file(.location))]
    UnresolvedParameter {
        /// Placeholder name as written
        name: String,
        /// Changelog file the text came from
        location: Option<String>,
    },
}

impl ExpandError {
    /// Create unresolved parameter error
    pub fn unresolved(name: impl Into<String>, location: Option<&str>) -> Self {
        Self::UnresolvedParameter {
            name: name.into(),
            location: location.map(str::to_string),
        }
    }

    /// Placeholder name that failed
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::UnresolvedParameter { name, .. } => name,
        }
    }
}

fn in_file(location: &Option<String>) -> String {
    location
        .as_deref()
        .map(|l| format!(" in file {l}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_message_includes_location() {
        let err = ExpandError::unresolved("schema", Some("db/root.xml"));
        assert_eq!(
            err.to_string(),
            "could not resolve expression `${schema}` in file db/root.xml"
        );
        assert_eq!(err.name(), "schema");
    }

    #[test]
    fn unresolved_message_without_location() {
        let err = ExpandError::unresolved("schema", None);
        assert_eq!(err.to_string(), "could not resolve expression `${schema}`");
    }

    #[test]
    fn restriction_error_converts() {
        let inner = chg_filter::ContextExpression::parse("(a").unwrap_err();
        let err: ParameterError = inner.into();
        assert!(matches!(err, ParameterError::InvalidRestriction(_)));
    }
}

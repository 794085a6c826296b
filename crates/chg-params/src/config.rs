//! Store configuration

use crate::expander::MissingPropertyMode;
use serde::{Deserialize, Serialize};

/// Parameter store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Policy for placeholders that resolve to nothing
    pub missing_property_mode: MissingPropertyMode,

    /// Fixed deployment id; generated when unset
    pub deployment_id: Option<String>,

    /// Copy the process environment into the system tier
    pub seed_environment: bool,
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With missing-property policy
    #[inline]
    #[must_use]
    pub fn with_missing_property_mode(mut self, mode: MissingPropertyMode) -> Self {
        self.missing_property_mode = mode;
        self
    }

    /// With fixed deployment id
    #[inline]
    #[must_use]
    pub fn with_deployment_id(mut self, id: impl Into<String>) -> Self {
        self.deployment_id = Some(id.into());
        self
    }

    /// With environment seeding on or off
    #[inline]
    #[must_use]
    pub fn with_seed_environment(mut self, seed: bool) -> Self {
        self.seed_environment = seed;
        self
    }

    /// Configured deployment id, or a freshly generated one
    #[must_use]
    pub fn resolve_deployment_id(&self) -> String {
        self.deployment_id
            .clone()
            .unwrap_or_else(generate_deployment_id)
    }
}

/// Last ten digits of the current epoch milliseconds
#[must_use]
pub fn generate_deployment_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().to_string();
    let start = millis.len().saturating_sub(10);
    millis[start..].to_string()
}

//! Target database profile
//!
//! Describes the database a run targets. A store built with a profile gets
//! the `database.*` globals and filters values by the profile's short name.

use crate::value::ParameterValue;
use serde::{Deserialize, Serialize};

/// Default name of the changelog tracking table
pub const DEFAULT_CHANGELOG_TABLE: &str = "SCHEMA_CHANGELOG";

/// Default name of the changelog lock table
pub const DEFAULT_CHANGELOG_LOCK_TABLE: &str = "SCHEMA_CHANGELOG_LOCK";

/// Capabilities and naming of the target database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseProfile {
    /// Short name used for database filtering (`postgresql`, `h2`, ...)
    pub short_name: String,
    /// Product name reported by the driver
    pub product_name: String,
    /// Product version, if it could be read
    pub product_version: Option<String>,
    /// Major version, if it could be read
    pub major_version: Option<u32>,
    /// Minor version, if it could be read
    pub minor_version: Option<u32>,
    /// Clause appended to auto-increment columns
    pub auto_increment_clause: Option<String>,
    /// Function returning the current timestamp
    pub current_date_time_function: Option<String>,
    /// Changelog tracking table
    pub changelog_table_name: String,
    /// Changelog lock table
    pub changelog_lock_table_name: String,
    /// Default catalog
    pub default_catalog_name: Option<String>,
    /// Default schema
    pub default_schema_name: Option<String>,
    /// Schema holding the tracking tables
    pub tracking_schema_name: Option<String>,
    /// Line comment marker
    pub line_comment: String,
    /// Whether updates are considered safe, if it could be determined
    pub is_safe_to_run_update: Option<bool>,
    /// Connection needs a password
    pub requires_password: bool,
    /// Connection needs a username
    pub requires_username: bool,
    /// Foreign key checks can be disabled
    pub supports_foreign_key_disable: bool,
    /// `INITIALLY DEFERRED` columns are supported
    pub supports_initially_deferrable_columns: bool,
    /// `ON DELETE RESTRICT` is supported
    pub supports_restrict_foreign_keys: bool,
    /// Schemas are supported
    pub supports_schemas: bool,
    /// Sequences are supported
    pub supports_sequences: bool,
    /// Tablespaces are supported
    pub supports_tablespaces: bool,
    /// Not-null constraints can be named
    pub supports_not_null_constraint_names: bool,
}

impl Default for DatabaseProfile {
    fn default() -> Self {
        Self {
            short_name: String::new(),
            product_name: String::new(),
            product_version: None,
            major_version: None,
            minor_version: None,
            auto_increment_clause: None,
            current_date_time_function: None,
            changelog_table_name: DEFAULT_CHANGELOG_TABLE.to_string(),
            changelog_lock_table_name: DEFAULT_CHANGELOG_LOCK_TABLE.to_string(),
            default_catalog_name: None,
            default_schema_name: None,
            tracking_schema_name: None,
            line_comment: "--".to_string(),
            is_safe_to_run_update: None,
            requires_password: true,
            requires_username: true,
            supports_foreign_key_disable: false,
            supports_initially_deferrable_columns: false,
            supports_restrict_foreign_keys: true,
            supports_schemas: true,
            supports_sequences: true,
            supports_tablespaces: false,
            supports_not_null_constraint_names: false,
        }
    }
}

fn optional<T: Into<ParameterValue>>(value: Option<T>) -> ParameterValue {
    value.map_or(ParameterValue::Null, Into::into)
}

impl DatabaseProfile {
    /// Create profile with defaults for everything but the names
    #[must_use]
    pub fn new(short_name: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            product_name: product_name.into(),
            ..Self::default()
        }
    }

    /// With default schema
    #[inline]
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema_name = Some(schema.into());
        self
    }

    /// With product version numbers
    #[inline]
    #[must_use]
    pub fn with_version(mut self, product_version: impl Into<String>, major: u32, minor: u32) -> Self {
        self.product_version = Some(product_version.into());
        self.major_version = Some(major);
        self.minor_version = Some(minor);
        self
    }

    /// `""` without a default schema, otherwise `"." + schema`
    #[must_use]
    pub fn default_schema_name_prefix(&self) -> String {
        match self.default_schema_name.as_deref() {
            Some(schema) if !schema.trim().is_empty() => format!(".{schema}"),
            _ => String::new(),
        }
    }

    /// The `database.*` parameters this profile contributes
    ///
    /// Versions and the update-safety flag are left out when unknown; other
    /// unset entries are present with a `Null` payload.
    #[must_use]
    pub fn parameters(&self) -> Vec<(&'static str, ParameterValue)> {
        let mut params = vec![
            ("database.autoIncrementClause", optional(self.auto_increment_clause.clone())),
            (
                "database.currentDateTimeFunction",
                optional(self.current_date_time_function.clone()),
            ),
            (
                "database.changeLogLockTableName",
                self.changelog_lock_table_name.clone().into(),
            ),
            ("database.changeLogTableName", self.changelog_table_name.clone().into()),
        ];

        if let Some(major) = self.major_version {
            params.push(("database.databaseMajorVersion", major.into()));
        }
        if let Some(minor) = self.minor_version {
            params.push(("database.databaseMinorVersion", minor.into()));
        }
        params.push(("database.databaseProductName", self.product_name.clone().into()));
        if let Some(version) = &self.product_version {
            params.push(("database.databaseProductVersion", version.clone().into()));
        }

        params.extend([
            ("database.defaultCatalogName", optional(self.default_catalog_name.clone())),
            ("database.defaultSchemaName", optional(self.default_schema_name.clone())),
            ("database.defaultSchemaNamePrefix", self.default_schema_name_prefix().into()),
            ("database.lineComment", self.line_comment.clone().into()),
            ("database.trackingSchemaName", optional(self.tracking_schema_name.clone())),
            ("database.typeName", self.short_name.clone().into()),
        ]);

        if let Some(safe) = self.is_safe_to_run_update {
            params.push(("database.isSafeToRunUpdate", safe.into()));
        }

        params.extend([
            ("database.requiresPassword", self.requires_password.into()),
            ("database.requiresUsername", self.requires_username.into()),
            ("database.supportsForeignKeyDisable", self.supports_foreign_key_disable.into()),
            (
                "database.supportsInitiallyDeferrableColumns",
                self.supports_initially_deferrable_columns.into(),
            ),
            ("database.supportsRestrictForeignKeys", self.supports_restrict_foreign_keys.into()),
            ("database.supportsSchemas", self.supports_schemas.into()),
            ("database.supportsSequences", self.supports_sequences.into()),
            ("database.supportsTablespaces", self.supports_tablespaces.into()),
            (
                "database.supportsNotNullConstraintNames",
                self.supports_not_null_constraint_names.into(),
            ),
        ]);

        params
    }
}

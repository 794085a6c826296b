//! CHG Changelog Parameters
//!
//! Scoped parameter store for schema migration changelogs.
//!
//! # Overview
//!
//! - **ParameterStore**: system, global and per-changelog local tiers
//! - **ActiveFilter**: the contexts, labels and database a run executes with
//! - **ExecutionValue**: names computed from the current changelog position
//! - **ExpressionExpander**: `${name}` substitution over store lookups
//!
//! # Example
//!
//! ```rust
//! use chg_params::{ChangelogNode, ParameterStore, Restrictions, Scope};
//! use chg_filter::Contexts;
//!
//! let root = ChangelogNode::new("db/changelog.xml");
//!
//! let mut store = ParameterStore::new();
//! store.set("schema", "app");
//! store
//!     .register("table", "users_prod", Restrictions::parse("prod", "", "").unwrap(), Scope::Global)
//!     .unwrap();
//! store.set_local("table", "users", Some(&root)).unwrap();
//!
//! store.set_contexts(Some(Contexts::parse("dev")));
//! let sql = store.expand("select * from ${schema}.${table}", Some(&root)).unwrap();
//! assert_eq!(sql, "select * from app.users");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod database;
pub mod error;
pub mod execution;
pub mod expander;
pub mod filter;
pub mod position;
pub mod store;
pub mod value;

// Re-exports
pub use config::{generate_deployment_id, StoreConfig};
pub use database::DatabaseProfile;
pub use error::{ExpandError, ParameterError};
pub use execution::ExecutionValue;
pub use expander::{ExpressionExpander, MissingPropertyMode};
pub use filter::ActiveFilter;
pub use position::{ancestry, ChangelogNode, ChangelogPosition, ChangesetInfo};
pub use store::{Candidate, Explanation, ParameterStore, Scope, StoreBuilder, Tier};
pub use value::{render, ParameterValue, Restrictions, ScopedValue};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for parameter resolution
    pub use crate::{
        ActiveFilter, ChangelogNode, ChangelogPosition, DatabaseProfile, ExpandError,
        MissingPropertyMode, ParameterError, ParameterStore, ParameterValue, Restrictions, Scope,
        StoreConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

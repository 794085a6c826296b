//! CHG Filter Expressions
//!
//! Matching predicates for context, label and target-database restrictions.
//!
//! # Overview
//!
//! - **Contexts / ContextExpression**: the run's contexts and a value's context restriction
//! - **Labels / LabelExpression**: a value's labels and the run's label filter
//! - **DatabaseSet**: a value's target-database list
//!
//! # Example
//!
//! ```rust
//! use chg_filter::{ContextExpression, Contexts, DatabaseSet};
//!
//! let restriction = ContextExpression::parse("prod or staging").unwrap();
//! assert!(restriction.matches(&Contexts::parse("prod")));
//! assert!(!restriction.matches(&Contexts::parse("dev")));
//!
//! let dbs = DatabaseSet::parse("postgresql, oracle");
//! assert!(dbs.accepts("Oracle"));
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod dbms;
pub mod expression;
pub mod label;

// Re-exports
pub use context::{ContextExpression, Contexts};
pub use dbms::DatabaseSet;
pub use expression::{Expr, ExpressionError};
pub use label::{LabelExpression, Labels};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for filter matching
    pub use crate::{ContextExpression, Contexts, DatabaseSet, LabelExpression, Labels};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

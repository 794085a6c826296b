//! Testing utilities for CHG workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use chg_filter::{Contexts, LabelExpression};
use chg_params::{
    ChangelogNode, ChangelogPosition, DatabaseProfile, ParameterStore, ParameterValue, StoreConfig,
};
use std::sync::Arc;

pub const TEST_DEPLOYMENT_ID: &str = "0000000042";

pub fn test_config() -> StoreConfig {
    StoreConfig::new().with_deployment_id(TEST_DEPLOYMENT_ID)
}

pub fn store_without_env() -> ParameterStore {
    ParameterStore::builder().with_config(test_config()).build()
}

pub fn store_with_system(values: &[(&str, &str)]) -> ParameterStore {
    ParameterStore::builder()
        .with_config(test_config())
        .with_system_values(values.iter().map(|(k, v)| (k.to_string(), v.to_string())))
        .build()
}

pub fn postgres_profile() -> DatabaseProfile {
    DatabaseProfile::new("postgresql", "PostgreSQL")
        .with_version("16.2", 16, 2)
        .with_default_schema("public")
}

pub fn store_for_database(profile: DatabaseProfile) -> ParameterStore {
    ParameterStore::builder()
        .with_config(test_config())
        .with_database(profile)
        .build()
}

/// Root, child and grandchild changelogs sharing their parents
pub struct ChangelogTree {
    pub root: Arc<ChangelogNode>,
    pub child: Arc<ChangelogNode>,
    pub grandchild: ChangelogNode,
}

pub fn changelog_tree() -> ChangelogTree {
    let root = Arc::new(ChangelogNode::new("db/root.xml"));
    let child = Arc::new(ChangelogNode::included_from(&root, "db/child.xml"));
    let grandchild = ChangelogNode::included_from(&child, "db/grandchild.xml");
    ChangelogTree {
        root,
        child,
        grandchild,
    }
}

pub fn with_contexts(store: &mut ParameterStore, contexts: &str) {
    store.set_contexts(Some(Contexts::parse(contexts)));
}

pub fn with_labels(store: &mut ParameterStore, labels: &str) {
    store.set_labels(Some(LabelExpression::parse(labels).unwrap()));
}

#[track_caller]
pub fn assert_resolves(
    store: &ParameterStore,
    key: &str,
    position: Option<&dyn ChangelogPosition>,
    expected: impl Into<ParameterValue>,
) {
    let expected = expected.into();
    let actual = store.resolve(key, position).map(|v| v.into_owned());
    assert_eq!(actual, Some(expected), "resolving '{key}'");
}

#[track_caller]
pub fn assert_absent(store: &ParameterStore, key: &str, position: Option<&dyn ChangelogPosition>) {
    let actual = store.resolve(key, position).map(|v| v.into_owned());
    assert_eq!(actual, None, "expected '{key}' to be absent");
}

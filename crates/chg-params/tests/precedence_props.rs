use chg_params::{ChangelogNode, ParameterStore, ParameterValue};
use chg_test_utils::{changelog_tree, store_without_env};
use proptest::prelude::*;
use std::sync::Arc;

fn key() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9._]{0,10}").unwrap()
}

fn resolved(store: &ParameterStore, key: &str, position: Option<&ChangelogNode>) -> Option<ParameterValue> {
    let position = position.map(|p| p as &dyn chg_params::ChangelogPosition);
    store.resolve(key, position).map(|v| v.into_owned())
}

proptest! {
    #[test]
    fn prop_first_global_wins(key in key(), values in proptest::collection::vec(any::<i64>(), 1..8)) {
        let mut store = store_without_env();
        for value in &values {
            store.set(key.clone(), *value);
        }

        prop_assert_eq!(resolved(&store, &key.to_uppercase(), None), Some(ParameterValue::from(values[0])));
    }

    #[test]
    fn prop_last_local_wins_within_level(key in key(), values in proptest::collection::vec(any::<i64>(), 1..8)) {
        let node = ChangelogNode::new("db/root.xml");
        let mut store = store_without_env();
        for value in &values {
            store.set_local(key.clone(), *value, Some(&node)).unwrap();
        }

        prop_assert_eq!(resolved(&store, &key, Some(&node)), values.last().map(|v| ParameterValue::from(*v)));
    }

    #[test]
    fn prop_any_global_outranks_every_local(
        key in key(),
        locals in proptest::collection::vec(any::<i64>(), 0..5),
        global in any::<i64>(),
    ) {
        let tree = changelog_tree();
        let mut store = store_without_env();
        for value in &locals {
            store.set_local(key.clone(), *value, Some(&tree.grandchild)).unwrap();
        }
        store.set(key.clone(), global);

        prop_assert_eq!(resolved(&store, &key, Some(&tree.grandchild)), Some(ParameterValue::from(global)));
    }

    #[test]
    fn prop_nearest_level_with_value_wins(key in key(), levels in proptest::collection::vec(any::<bool>(), 1..6)) {
        // levels[0] is the root; true means that changelog registers a value
        let mut chain: Vec<Arc<ChangelogNode>> = Vec::new();
        for i in 0..levels.len() {
            let path = format!("level{i}.xml");
            let node = match chain.last() {
                None => ChangelogNode::new(path),
                Some(parent) => ChangelogNode::included_from(parent, path),
            };
            chain.push(Arc::new(node));
        }

        let mut store = store_without_env();
        for (i, registers) in levels.iter().enumerate() {
            if *registers {
                store.set_local(key.clone(), i as i64, Some(&*chain[i])).unwrap();
            }
        }

        let innermost = chain.last().map(|node| &**node);
        let expected = levels.iter().rposition(|r| *r).map(|i| ParameterValue::from(i as i64));
        prop_assert_eq!(resolved(&store, &key, innermost), expected);
    }

    #[test]
    fn prop_system_outranks_global(key in key(), system in any::<i64>(), global in any::<i64>()) {
        let mut store = ParameterStore::builder()
            .with_system_values([(key.clone(), system)])
            .build();
        store.set(key.clone(), global);

        prop_assert_eq!(resolved(&store, &key, None), Some(ParameterValue::from(system)));
    }
}

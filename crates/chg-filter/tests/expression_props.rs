use chg_filter::{ContextExpression, Contexts, DatabaseSet, LabelExpression, Labels};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_-]{0,8}")
        .unwrap()
        .prop_filter("keyword", |s| !matches!(s.as_str(), "and" | "or" | "not" | "all" | "none"))
}

proptest! {
    #[test]
    fn prop_negation_inverts_match(ctx in name(), active in proptest::collection::vec(name(), 1..5)) {
        let active = Contexts::from_names(&active);
        let plain = ContextExpression::parse(&ctx).unwrap();
        let negated = ContextExpression::parse(&format!("!{ctx}")).unwrap();

        prop_assert_ne!(plain.matches(&active), negated.matches(&active));
    }

    #[test]
    fn prop_context_match_ignores_case(ctx in name()) {
        let upper = ctx.to_uppercase();
        let expr = ContextExpression::parse(&upper).unwrap();

        prop_assert!(expr.matches(&Contexts::parse(&ctx)));
    }

    #[test]
    fn prop_comma_list_equals_or(a in name(), b in name(), active in name()) {
        let active = Labels::parse(&active);
        let comma = LabelExpression::parse(&format!("{a}, {b}")).unwrap();
        let or = LabelExpression::parse(&format!("{a} or {b}")).unwrap();

        prop_assert_eq!(comma.matches(&active), or.matches(&active));
    }

    #[test]
    fn prop_listed_database_accepted_in_any_case(dbs in proptest::collection::vec(name(), 1..4), pick in 0..4usize) {
        let set = DatabaseSet::from_names(&dbs);
        let chosen = &dbs[pick % dbs.len()];

        prop_assert!(set.accepts(&chosen.to_uppercase()));
    }
}

#[test]
fn blank_restrictions_are_unrestricted() {
    assert!(ContextExpression::parse("").unwrap().is_empty());
    assert!(LabelExpression::parse("  ").unwrap().is_empty());
    assert!(!DatabaseSet::parse("").is_restricted());
}

//! Property-based tests for structural prototype matching using proptest.
//!
//! Properties verified:
//! - A mapping matches itself
//! - A mapping matches its wildcarded skeleton
//! - The empty prototype matches everything with score zero
//! - Fields the prototype does not mention never change the score
//! - Concrete prototypes outscore their skeletons

use morphbus_core::{match_score, matches, Prototype};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

fn mapping() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,3}", value(), 0..5)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Replace every non-mapping leaf with a wildcard.
fn skeleton(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let field = match value {
                Value::Object(nested) => Value::Object(skeleton(nested)),
                _ => Value::Null,
            };
            (key.clone(), field)
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_mapping_matches_itself(map in mapping()) {
        let score = match_score(&map, &map);
        prop_assert!(score.is_some());
        prop_assert!(score.unwrap_or_default() >= map.len());
    }

    #[test]
    fn prop_mapping_matches_its_skeleton(map in mapping()) {
        let prototype = Prototype::from_map(skeleton(&map));
        prop_assert!(matches(&map, &prototype));
    }

    #[test]
    fn prop_empty_prototype_matches_everything(map in mapping()) {
        prop_assert_eq!(match_score(&map, &Map::new()), Some(0));
    }

    #[test]
    fn prop_unmentioned_fields_do_not_change_score(map in mapping(), extra in value()) {
        let mut widened = map.clone();
        widened.insert("unmentioned_field".to_string(), extra);
        prop_assert_eq!(match_score(&widened, &map), match_score(&map, &map));
    }

    #[test]
    fn prop_concrete_prototype_outscores_skeleton(map in mapping()) {
        let concrete = match_score(&map, &map);
        let broad = match_score(&map, &skeleton(&map));
        prop_assert!(concrete >= broad);
    }
}

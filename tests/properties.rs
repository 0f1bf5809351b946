use proptest::prelude::*;
use serde_json::Value;

use jed::fold::FoldIndex;
use jed::history::History;
use jed::syntax::{strip_markup, to_markup};
use jed::validate::{validate, ValidationStatus};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Stripping the markup tags and unescaping the three entities must
    /// reconstruct any input exactly.
    #[test]
    fn highlight_preserves_content(input in ".*") {
        prop_assert_eq!(strip_markup(&to_markup(&input)), input);
    }

    /// Same invariant over text that actually looks like JSON.
    #[test]
    fn highlight_preserves_documents(value in arb_json()) {
        let pretty = serde_json::to_string_pretty(&value).unwrap();
        prop_assert_eq!(strip_markup(&to_markup(&pretty)), pretty);
    }

    /// No fold range may start and end on the same line, even over bracket
    /// soup that never parses.
    #[test]
    fn fold_ranges_span_lines(input in "[\\{\\}\\[\\]a, \n]{0,64}") {
        let index = FoldIndex::scan(&input);
        for (start, end) in index.ranges() {
            prop_assert!(end > start);
            prop_assert!(index.is_foldable(start));
        }
    }

    /// Pretty-printed documents fold cleanly too.
    #[test]
    fn fold_ranges_on_documents(value in arb_json()) {
        let pretty = serde_json::to_string_pretty(&value).unwrap();
        let index = FoldIndex::scan(&pretty);
        for (start, end) in index.ranges() {
            prop_assert!(end > start);
        }
    }

    /// parse -> serialize(indent 2) -> parse reproduces the same value.
    #[test]
    fn round_trip_through_format(value in arb_json()) {
        let pretty = serde_json::to_string_pretty(&value).unwrap();
        match validate(&pretty) {
            ValidationStatus::Valid { value: reparsed, .. } => {
                prop_assert_eq!(reparsed, value);
            }
            other => prop_assert!(false, "expected Valid, got {:?}", other),
        }
    }

    /// The history log never grows past its cap, and eviction drops the
    /// oldest snapshots first.
    #[test]
    fn history_stays_bounded(extra in 1usize..60) {
        let mut history = History::new();
        let total = 50 + extra;
        for i in 0..total {
            history.push(&format!("edit {}", i));
        }
        prop_assert_eq!(history.len(), 50);

        while history.can_undo() {
            history.undo();
        }
        let expected = format!("edit {}", total - 50);
        prop_assert_eq!(history.current(), Some(expected.as_str()));
    }
}

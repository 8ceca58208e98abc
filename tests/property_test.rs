//! Property tests for the string-hash engine.

use expr_match::ir::{ExpressionPart, GroupId, Predicate, OPTIMIZE_NONE};
use expr_match::{EngineConfig, ExprError, MatchResult, MatchingEngine, StringHashEngine};
use proptest::prelude::*;
use serde_json::json;
use uuid::Uuid;

fn engine() -> StringHashEngine {
    StringHashEngine::with_config(EngineConfig::single_threaded()).expect("Failed to create engine")
}

fn part(predicate: Predicate) -> ExpressionPart {
    ExpressionPart::new(Uuid::new_v4(), GroupId::new(1, OPTIMIZE_NONE), predicate)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn equality_matches_only_its_literal(
        registered in "[a-z0-9]{1,16}",
        incoming in "[a-z0-9]{1,16}",
    ) {
        let engine = engine();
        let eq = part(Predicate::equals("field", registered.as_str()));
        engine.add(&eq).unwrap();

        let result = MatchResult::new();
        engine.match_event(&json!({ "field": registered }), &result).unwrap();
        prop_assert!(result.contains(eq.evaluable_id));

        let result = MatchResult::new();
        engine.match_event(&json!({ "field": incoming }), &result).unwrap();
        prop_assert_eq!(result.contains(eq.evaluable_id), incoming == registered);
    }

    #[test]
    fn inequality_never_reports_equal_literal(
        literal in "[a-zA-Z ]{0,24}",
        others in proptest::collection::vec("[a-zA-Z ]{0,24}", 0..8),
    ) {
        let engine = engine();
        let same = part(Predicate::not_equals("field", literal.as_str()));
        engine.add(&same).unwrap();
        for other in &others {
            engine.add(&part(Predicate::not_equals("field", other.as_str()))).unwrap();
        }

        let result = MatchResult::new();
        engine.match_event(&json!({ "field": literal }), &result).unwrap();
        prop_assert!(!result.contains(same.evaluable_id));
    }

    #[test]
    fn add_then_remove_restores_empty_index(
        entries in proptest::collection::vec(("[a-c]{1,3}", "[a-z]{0,6}", any::<bool>()), 1..32),
    ) {
        let engine = engine();
        let parts: Vec<ExpressionPart> = entries
            .iter()
            .map(|(ident, literal, negated)| {
                if *negated {
                    part(Predicate::not_equals(ident.as_str(), literal.as_str()))
                } else {
                    part(Predicate::equals(ident.as_str(), literal.as_str()))
                }
            })
            .collect();

        for p in &parts {
            engine.add(p).unwrap();
        }
        prop_assert_eq!(engine.stats().total_parts(), parts.len());

        for p in &parts {
            engine.remove(p).unwrap();
        }
        prop_assert_eq!(engine.stats().total_parts(), 0);
        prop_assert!(engine.observed_paths().is_empty());

        for p in &parts {
            prop_assert_eq!(engine.remove(p), Err(ExprError::PartNotFound));
        }
    }

    #[test]
    fn search_ignores_identifier(
        declared in "[a-z]{1,8}",
        searched in "[a-z]{1,8}",
        value in "[a-z0-9]{0,12}",
    ) {
        let engine = engine();
        let eq = part(Predicate::equals(declared.as_str(), value.as_str()));
        engine.add(&eq).unwrap();

        let result = MatchResult::new();
        engine.search(&searched, &json!(value), &result);
        prop_assert!(result.contains(eq.evaluable_id));
    }
}

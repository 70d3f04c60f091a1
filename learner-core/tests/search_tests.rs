//! Tests for search payload normalisation as seen by request handlers

use learner_core::{normalize, SearchQuery, DEFAULT_LIMIT, MAX_LIMIT};
use serde_json::{json, Map, Value};

fn as_map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_full_payload_is_copied() {
    let raw = as_map(json!({
        "query": "physics",
        "queryFields": ["name", "description"],
        "facets": [{"board": "count"}, {"medium": "count"}],
        "fields": ["identifier", "name"],
        "filters": {"status": ["Live"]},
        "sort_by": {"createdOn": "desc"},
        "offset": 10,
        "limit": 20,
        "groupQuery": [{"groupBy": "subject"}],
        "softConstraints": {"board": 100, "medium": 10}
    }));

    let search = normalize(&raw);
    assert_eq!(search.query.as_deref(), Some("physics"));
    assert_eq!(search.query_fields.as_ref().map(Vec::len), Some(2));
    assert_eq!(search.facets.as_ref().map(Vec::len), Some(2));
    assert_eq!(search.fields, Some(vec!["identifier".to_string(), "name".to_string()]));
    assert_eq!(search.sort_by.get("createdOn").and_then(Option::as_deref), Some("desc"));
    assert_eq!(search.offset, 10);
    assert_eq!(search.limit, 20);
    assert_eq!(search.group_query.len(), 1);
    assert_eq!(search.soft_constraints.get("board"), Some(&100));
    assert_eq!(search.filters(), Some(&json!({"status": ["Live"]})));
    assert!(search.exists().is_none());
}

#[test]
fn test_null_facet_types_are_preserved() {
    // A null facet type requests a plain terms facet and must reach the query layer
    let search = normalize(&as_map(json!({
        "facets": [{"board": null}, {"medium": "count"}],
        "sort_by": {"name": null}
    })));
    let facets = search.facets.as_ref().unwrap();
    assert_eq!(facets.len(), 2);
    assert!(facets[0].contains_key("board"));
    assert_eq!(facets[0]["board"], None);
    assert_eq!(facets[1]["medium"].as_deref(), Some("count"));
    assert_eq!(search.sort_by.len(), 1);
    assert_eq!(search.sort_by["name"], None);

    let value = serde_json::to_value(&search).unwrap();
    assert_eq!(value["facets"][0]["board"], Value::Null);
}

#[test]
fn test_paging_invariants_hold() {
    for (offset, limit) in [(0, 1), (0, 20_000), (9_000, 5_000), (9_999, 9_999), (5_000, 5_000)] {
        let search = normalize(&as_map(json!({"offset": offset, "limit": limit})));
        assert!(search.limit >= 0);
        assert!(search.limit <= MAX_LIMIT);
        assert!(search.offset + search.limit <= MAX_LIMIT, "offset {} limit {}", offset, limit);
    }
}

#[test]
fn test_spec_examples() {
    assert_eq!(normalize(&as_map(json!({"limit": 20000}))).limit, 10_000);
    assert_eq!(normalize(&as_map(json!({"offset": 9000, "limit": 5000}))).limit, 1_000);

    let search = normalize(&as_map(json!({"softConstraints": {"topic": 3}})));
    assert_eq!(search.soft_constraints.len(), 1);
    assert_eq!(search.soft_constraints["topic"], 3);
}

#[test]
fn test_negative_values_are_floored() {
    let search = normalize(&as_map(json!({"offset": -5, "limit": -1})));
    assert_eq!(search.offset, 0);
    assert_eq!(search.limit, 0);
}

#[test]
fn test_normalised_query_serializes_for_query_layer() {
    let search = normalize(&as_map(json!({"query": "math", "limit": 5})));
    let value = serde_json::to_value(&search).unwrap();
    assert_eq!(value["query"], json!("math"));
    assert_eq!(value["limit"], json!(5));
    assert!(value.get("queryFields").is_none());

    let back: SearchQuery = serde_json::from_value(value).unwrap();
    assert_eq!(back, search);
}

#[test]
fn test_default_query() {
    let search = normalize(&Map::new());
    assert_eq!(search.limit, DEFAULT_LIMIT);
    assert_eq!(search.offset, 0);
    assert!(search.sort_by.is_empty());
    assert!(search.soft_constraints.is_empty());
    assert!(search.group_query.is_empty());
}

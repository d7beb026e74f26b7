#![cfg(feature = "toplevel")]

use std::sync::Arc;

use schemawrap::engine::{ErrorNode, Field, LoadOptions, Loaded, Schema, Validator};
use schemawrap::toplevel::{DefinitionError, ToplevelSchema, DEFAULT_SENTINEL};
use serde_json::{json, Value};

fn article_schema() -> Schema {
    Schema::new([
        (
            "id",
            Field::int()
                .strict()
                .required()
                .validate(Validator::range_with(Some(1.0), None, true, true)),
        ),
        ("timestamp", Field::datetime().required()),
        (
            "author",
            Field::string().required().validate(Validator::length(2, 64)),
        ),
        (
            "text",
            Field::string()
                .required()
                .validate(Validator::length(10, 100_000)),
        ),
    ])
    .expect("article schema should build")
}

fn articles_schema() -> ToplevelSchema {
    ToplevelSchema::new([(
        DEFAULT_SENTINEL,
        Field::nested_many(Arc::new(article_schema()))
            .required()
            .validate(Validator::length(1, 10)),
    )])
    .expect("articles schema should build")
}

fn now_iso() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn article(id: i64, author: &str) -> Value {
    json!({
        "id": id,
        "timestamp": now_iso(),
        "author": author,
        "text": "qweqwertyasdg",
    })
}

fn first_sentinel_message(schema: &ToplevelSchema, raw: &Value) -> Option<String> {
    let report = schema.validate(raw, &LoadOptions::new());
    report
        .field(schema.sentinel())
        .and_then(ErrorNode::messages)
        .and_then(|messages| messages.first().cloned())
}

#[cfg(feature = "logging")]
fn init() {
    use schemawrap::logging::{init_logging, LogFormat, LogLevel};
    init_logging(LogFormat::Text, LogLevel::Debug);
}

#[cfg(not(feature = "logging"))]
fn init() {}

#[test]
fn doesnt_allow_empty() {
    init();
    let err = ToplevelSchema::new(Vec::<(&str, Field)>::new()).unwrap_err();
    assert!(err
        .to_string()
        .contains("ToplevelSchema should have exactly one field with name: _toplevel"));
}

#[test]
fn doesnt_allow_wrong_name() {
    init();
    let err = ToplevelSchema::new([(
        "wrong_name",
        Field::list(Field::int().strict().validate(Validator::range(0.0, 100.0))),
    )])
    .unwrap_err();
    assert!(matches!(err, DefinitionError::WrongFieldName { .. }));
    assert!(err
        .to_string()
        .contains("The only field in ToplevelSchema should have name: _toplevel"));
}

#[test]
fn doesnt_allow_any_other_fields() {
    init();
    let err = ToplevelSchema::new([
        (
            DEFAULT_SENTINEL,
            Field::list(Field::int().strict().validate(Validator::range(0.0, 100.0))),
        ),
        ("other_field", Field::boolean()),
    ])
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("ToplevelSchema can contain only one field"));
}

#[test]
fn validate_empty_list() {
    init();
    let schema = articles_schema();
    assert_eq!(
        first_sentinel_message(&schema, &json!([])).as_deref(),
        Some("Length must be between 1 and 10.")
    );
    assert_eq!(
        schema.validate(&json!([]), &LoadOptions::new()).to_json(),
        json!({"_toplevel": ["Length must be between 1 and 10."]})
    );
}

#[test]
fn validate_too_long_list() {
    init();
    let schema = articles_schema();
    let raw = Value::Array(
        (1..=101)
            .map(|i| article(i, &format!("author_{i}")))
            .collect(),
    );
    assert_eq!(
        first_sentinel_message(&schema, &raw).as_deref(),
        Some("Length must be between 1 and 10.")
    );
}

#[test]
fn validate_broken_item() {
    init();
    let schema = articles_schema();
    let report = schema.validate(&json!([article(1, "")]), &LoadOptions::new());

    let items = report
        .field(DEFAULT_SENTINEL)
        .and_then(ErrorNode::nested)
        .expect("item errors should be nested under the sentinel");
    assert_eq!(
        items.index(0).map(|node| node.nested().map(|r| r.to_json())),
        Some(Some(json!({"author": ["Length must be between 2 and 64."]})))
    );
    assert_eq!(
        report.to_json(),
        json!({"_toplevel": {"0": {"author": ["Length must be between 2 and 64."]}}})
    );
}

#[test]
fn validate_works() {
    init();
    let schema = articles_schema();
    let report = schema.validate(&json!([article(1, "author")]), &LoadOptions::new());
    assert!(report.is_empty(), "unexpected errors: {report}");
}

#[test]
fn load() {
    init();
    let schema = articles_schema();
    let data = schema
        .load(&json!([article(1, "author")]), &LoadOptions::new())
        .expect("valid articles should load");

    let items = data.as_list().expect("loaded value should be a list");
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0].get("timestamp"), Some(Loaded::DateTime(_))));
    assert_eq!(items[0].get("id"), Some(&Loaded::Int(1)));
    assert!(!data.contains_key_deep(DEFAULT_SENTINEL));
}

#[test]
fn load_failure_keeps_sentinel_in_report() {
    init();
    let schema = articles_schema();
    let err = schema
        .load(&json!([{"id": "1"}]), &LoadOptions::new())
        .unwrap_err();
    let items = err
        .report()
        .field(DEFAULT_SENTINEL)
        .and_then(ErrorNode::nested)
        .expect("errors should sit under the sentinel");
    assert_eq!(
        items.index(0).map(|node| node.nested().map(|r| r.to_json())),
        Some(Some(json!({
            "id": ["Not a valid integer."],
            "timestamp": ["Missing data for required field."],
            "author": ["Missing data for required field."],
            "text": ["Missing data for required field."]
        })))
    );
}

#[test]
fn non_list_input_is_reported_not_raised() {
    init();
    let schema = articles_schema();
    let report = schema.validate(&json!({"id": 1}), &LoadOptions::new());
    assert_eq!(
        report.to_json(),
        json!({"_toplevel": {"_schema": ["Invalid input type."]}})
    );
}

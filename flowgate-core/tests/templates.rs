use std::collections::BTreeMap;

use flowgate_core::template::{parse_template, resolve, resolve_string, TemplateError};
use flowgate_core::{Binding, BindingTable, ParamLocation, ResolutionError, ValueTemplate};
use serde_json::json;

fn table() -> BindingTable {
    let mut params = BTreeMap::new();
    params.insert(
        ParamLocation::Path,
        json!({"order_id": "A-1"}).as_object().cloned().unwrap(),
    );
    let mut t = BindingTable::with_params(params);
    t.bind(
        "fetch_order",
        Binding::Json(json!({"product_id": 42, "tags": ["x"], "customer": {"name": "Ada"}, "gift": false, "coupon": null})),
    );
    t.bind(
        "raw",
        Binding::Opaque {
            content_type: Some("text/plain".to_string()),
            bytes: b"plain body".to_vec(),
        },
    );
    t
}

#[test]
fn parses_literals_and_placeholders() {
    let t = parse_template("https://x/${ path_params.order_id }/items").unwrap();
    let refs: Vec<String> = t.references().map(|r| r.to_string()).collect();
    assert_eq!(refs, vec!["path_params.order_id".to_string()]);
    assert_eq!(t.literal_prefix(), Some("https://x/"));
    assert!(parse_template("no placeholders").unwrap().is_literal());
}

#[test]
fn rejects_malformed_placeholders() {
    assert!(matches!(
        parse_template("https://x/${path_params.id"),
        Err(TemplateError::Unclosed { offset: 10 })
    ));
    assert!(matches!(
        parse_template("${ }"),
        Err(TemplateError::EmptyPlaceholder { .. })
    ));
    assert!(matches!(
        parse_template("${a..b}"),
        Err(TemplateError::InvalidSegment { .. })
    ));
    assert!(matches!(
        parse_template("${a.b c}"),
        Err(TemplateError::InvalidSegment { .. })
    ));
}

#[test]
fn single_placeholder_keeps_json_type() {
    let t = parse_template("${fetch_order.product_id}").unwrap();
    assert_eq!(resolve(&t, &table()).unwrap(), json!(42));
    let t = parse_template("${fetch_order.customer}").unwrap();
    assert_eq!(resolve(&t, &table()).unwrap(), json!({"name": "Ada"}));
}

#[test]
fn inline_placeholders_are_stringified() {
    let t = parse_template(
        "p=${fetch_order.product_id}&g=${fetch_order.gift}&c=${fetch_order.coupon}&t=${fetch_order.tags}",
    )
    .unwrap();
    assert_eq!(
        resolve_string(&t, &table()).unwrap(),
        r#"p=42&g=false&c=null&t=["x"]"#
    );
}

#[test]
fn missing_field_is_unresolved() {
    let t = parse_template("${fetch_order.missing}").unwrap();
    let err = resolve(&t, &table()).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::UnresolvedReference {
            reference: "fetch_order.missing".to_string()
        }
    );
}

#[test]
fn walking_into_a_scalar_is_a_type_mismatch() {
    let t = parse_template("${fetch_order.product_id.inner}").unwrap();
    let err = resolve(&t, &table()).unwrap_err();
    assert!(matches!(err, ResolutionError::TypeMismatch { ref segment, .. } if segment == "inner"));
}

#[test]
fn opaque_bodies_are_whole_value_only() {
    let whole = parse_template("${raw}").unwrap();
    assert_eq!(resolve(&whole, &table()).unwrap(), json!("plain body"));
    let field = parse_template("${raw.id}").unwrap();
    assert!(matches!(
        resolve(&field, &table()),
        Err(ResolutionError::TypeMismatch { .. })
    ));
}

#[test]
fn body_prunes_omitted_optional_params() {
    let body = ValueTemplate::parse(&json!({
        "order": "${path_params.order_id}",
        "note": "${body_params.note}",
        "items": ["${body_params.extra}", 1],
        "product": "${fetch_order.product_id}"
    }))
    .unwrap();
    let out = body.resolve(&table()).unwrap().unwrap();
    assert_eq!(out, json!({"order": "A-1", "items": [1], "product": 42}));
}

#[test]
fn body_fails_on_missing_field_of_a_supplied_param() {
    let mut params = BTreeMap::new();
    params.insert(
        ParamLocation::Body,
        json!({"address": {"street": "s"}}).as_object().cloned().unwrap(),
    );
    let table = BindingTable::with_params(params);

    let body = ValueTemplate::parse(&json!({"city": "${body_params.address.city}"})).unwrap();
    let err = body.resolve(&table).unwrap_err();
    assert_eq!(err.reference(), "body_params.address.city");

    let body = ValueTemplate::parse(&json!({"street": "${body_params.address.street}"})).unwrap();
    assert_eq!(body.resolve(&table).unwrap(), Some(json!({"street": "s"})));
}

#[test]
fn body_does_not_prune_step_references() {
    let body = ValueTemplate::parse(&json!({"x": "${fetch_order.nope}"})).unwrap();
    assert!(matches!(
        body.resolve(&table()),
        Err(ResolutionError::UnresolvedReference { .. })
    ));
}

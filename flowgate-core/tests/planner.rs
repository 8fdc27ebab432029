use std::collections::BTreeMap;

use flowgate_core::{
    compile_plan, CompileError, OperationSpec, ParamLocation, ParamSpec, ParamType, SourceDecl,
    StepDecl,
};
use serde_json::json;

fn op() -> OperationSpec {
    OperationSpec {
        operation_id: "get_enriched_order_details".to_string(),
        method: "GET".to_string(),
        path: "/orders/{order_id}".to_string(),
        parameters: vec![ParamSpec {
            name: "order_id".to_string(),
            location: ParamLocation::Path,
            required: true,
            param_type: ParamType::String,
        }],
        body_required: false,
        security: None,
    }
}

fn step(id: &str, url: &str) -> StepDecl {
    StepDecl {
        step_id: id.to_string(),
        method: "GET".to_string(),
        url: url.to_string(),
        headers: BTreeMap::new(),
        body: None,
    }
}

fn source(steps: Vec<StepDecl>) -> SourceDecl {
    SourceDecl {
        source_type: "http".to_string(),
        steps,
        response_step: None,
    }
}

#[test]
fn compiles_two_step_chain() {
    let plan = compile_plan(
        &op(),
        &source(vec![
            step("fetch_order", "https://o.example.com/orders/${path_params.order_id}"),
            step("get_product_details", "https://c.example.com/p/${fetch_order.product_id}"),
        ]),
    )
    .unwrap();
    let ids: Vec<&str> = plan.steps().iter().map(|s| s.step_id.as_str()).collect();
    assert_eq!(ids, vec!["fetch_order", "get_product_details"]);
    assert_eq!(plan.response_step().step_id, "get_product_details");
}

#[test]
fn forward_reference_fails_to_compile() {
    let err = compile_plan(
        &op(),
        &source(vec![
            step("a", "https://x.example.com/${b.id}"),
            step("b", "https://x.example.com/b"),
        ]),
    )
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::ForwardReference {
            step_id: "a".to_string(),
            referenced: "b".to_string()
        }
    );
}

#[test]
fn self_reference_is_a_forward_reference() {
    let err = compile_plan(&op(), &source(vec![step("a", "https://x.example.com/${a.id}")]))
        .unwrap_err();
    assert!(matches!(err, CompileError::ForwardReference { .. }));
}

#[test]
fn reference_to_missing_step_is_reported() {
    let err = compile_plan(&op(), &source(vec![step("a", "https://x.example.com/${ghost.id}")]))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownStepReference { ref referenced, .. } if referenced == "ghost"));
}

#[test]
fn unknown_parameter_fails_to_compile() {
    let err = compile_plan(
        &op(),
        &source(vec![step("a", "https://x.example.com/?q=${query_params.undeclared}")]),
    )
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownParameter {
            step_id: "a".to_string(),
            namespace: "query_params".to_string(),
            name: "undeclared".to_string()
        }
    );
}

#[test]
fn body_and_header_references_are_checked() {
    let mut s = step("a", "https://x.example.com/");
    s.body = Some(json!({"nested": ["${body_params.missing}"]}));
    let err = compile_plan(&op(), &source(vec![s])).unwrap_err();
    assert!(matches!(err, CompileError::UnknownParameter { ref namespace, .. } if namespace == "body_params"));

    let mut s = step("a", "https://x.example.com/");
    s.headers.insert("X-Trace".to_string(), "${later.id}".to_string());
    let err = compile_plan(&op(), &source(vec![s, step("later", "https://x.example.com/")]))
        .unwrap_err();
    assert!(matches!(err, CompileError::ForwardReference { .. }));
}

#[test]
fn structural_errors() {
    assert_eq!(
        compile_plan(&op(), &source(vec![])).unwrap_err(),
        CompileError::EmptyPlan
    );

    let err = compile_plan(
        &op(),
        &source(vec![step("a", "https://x.example.com"), step("a", "https://x.example.com")]),
    )
    .unwrap_err();
    assert_eq!(err, CompileError::DuplicateStepId("a".to_string()));

    let err = compile_plan(&op(), &source(vec![step("path_params", "https://x.example.com")]))
        .unwrap_err();
    assert_eq!(err, CompileError::ReservedStepId("path_params".to_string()));

    let err = compile_plan(&op(), &source(vec![step("bad id", "https://x.example.com")]))
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidStepId(_)));

    let mut s = step("a", "https://x.example.com");
    s.method = "FETCH".to_string();
    assert!(matches!(
        compile_plan(&op(), &source(vec![s])).unwrap_err(),
        CompileError::InvalidMethod { .. }
    ));

    assert!(matches!(
        compile_plan(&op(), &source(vec![step("a", "  ")])).unwrap_err(),
        CompileError::EmptyUrl { .. }
    ));
    assert!(matches!(
        compile_plan(&op(), &source(vec![step("a", "ftp://x")])).unwrap_err(),
        CompileError::MalformedUrl { .. }
    ));
    assert!(matches!(
        compile_plan(&op(), &source(vec![step("a", "https://x/${path_params")])).unwrap_err(),
        CompileError::MalformedTemplate { .. }
    ));
}

#[test]
fn unsupported_source_type_and_response_step() {
    let mut src = source(vec![step("a", "https://x.example.com")]);
    src.source_type = "postgres".to_string();
    assert_eq!(
        compile_plan(&op(), &src).unwrap_err(),
        CompileError::UnsupportedSourceType("postgres".to_string())
    );

    let mut src = source(vec![step("a", "https://x.example.com")]);
    src.response_step = Some("zzz".to_string());
    assert_eq!(
        compile_plan(&op(), &src).unwrap_err(),
        CompileError::UnknownResponseStep("zzz".to_string())
    );
}

#[test]
fn url_may_start_with_a_placeholder() {
    let mut spec = op();
    spec.parameters.push(ParamSpec {
        name: "base".to_string(),
        location: ParamLocation::Header,
        required: true,
        param_type: ParamType::String,
    });
    let plan = compile_plan(
        &spec,
        &source(vec![step("a", "${header_params.base}/orders")]),
    )
    .unwrap();
    assert_eq!(plan.len(), 1);
}

#[test]
fn compilation_is_deterministic() {
    let src = source(vec![
        step("fetch_order", "https://o.example.com/orders/${path_params.order_id}"),
        step("next", "https://c.example.com/p/${fetch_order.product_id}"),
    ]);
    let a = compile_plan(&op(), &src).unwrap();
    let b = compile_plan(&op(), &src).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a.to_source()).unwrap(),
        serde_json::to_string(&b.to_source()).unwrap()
    );
}

use std::path::Path;

use flowgate_core::{CompileMode, CompiledOperation};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::settings::load_path;
use crate::OutputArgs;

#[derive(Serialize)]
struct OperationView {
    operation_id: String,
    method: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    security: Option<String>,
    response_step: String,
    steps: Vec<StepView>,
}

#[derive(Serialize)]
struct StepView {
    step_id: String,
    method: String,
    url: String,
}

impl From<&CompiledOperation> for OperationView {
    fn from(op: &CompiledOperation) -> Self {
        Self {
            operation_id: op.spec.operation_id.clone(),
            method: op.spec.method.to_ascii_uppercase(),
            path: op.spec.path.clone(),
            security: op.spec.security.clone(),
            response_step: op.plan.response_step().step_id.clone(),
            steps: op
                .plan
                .steps()
                .iter()
                .map(|s| StepView {
                    step_id: s.step_id.clone(),
                    method: s.method.clone(),
                    url: s.url.as_str().to_string(),
                })
                .collect(),
        }
    }
}

pub fn inspect_cmd(path: &Path, output: OutputArgs) -> i32 {
    let outcome = match load_path(path, CompileMode::Strict) {
        Ok(o) => o,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return if e.is_validation() {
                exit_codes::VALIDATION_FAILED
            } else {
                exit_codes::RUNTIME_ERROR
            };
        }
    };

    let views: Vec<OperationView> = outcome
        .config
        .operations()
        .map(|op| OperationView::from(op.as_ref()))
        .collect();

    if output.format != OutputFormat::Text {
        print_result(output.format, output.quiet, &views);
        return exit_codes::SUCCESS;
    }
    if output.quiet {
        return exit_codes::SUCCESS;
    }
    for op in &views {
        println!(
            "{} {} {} (security: {})",
            op.operation_id,
            op.method,
            op.path,
            op.security.as_deref().unwrap_or("none")
        );
        for (i, step) in op.steps.iter().enumerate() {
            let marker = if step.step_id == op.response_step { " [response]" } else { "" };
            println!("  {}. {} {} {}{marker}", i + 1, step.step_id, step.method, step.url);
        }
    }
    exit_codes::SUCCESS
}

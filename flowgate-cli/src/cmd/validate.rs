use std::path::Path;

use flowgate_core::CompileMode;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::settings::{load_path, SettingsError};
use crate::OutputArgs;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    operations: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

/// One line per failing operation, or the single document-level error.
pub(crate) fn error_lines(err: &SettingsError) -> Vec<String> {
    match err {
        SettingsError::Config(config_err) if !config_err.compile_errors().is_empty() => config_err
            .compile_errors()
            .iter()
            .map(ToString::to_string)
            .collect(),
        other => vec![other.to_string()],
    }
}

pub fn validate_cmd(path: &Path, output: OutputArgs) -> i32 {
    match load_path(path, CompileMode::Strict) {
        Ok(outcome) => {
            let result = ValidateResult {
                valid: true,
                operations: outcome.config.len(),
                errors: vec![],
            };
            if output.format == OutputFormat::Text && !output.quiet {
                println!("ok: {} operation(s) compiled", result.operations);
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(e) if !e.is_validation() => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::RUNTIME_ERROR
        }
        Err(e) => {
            let result = ValidateResult {
                valid: false,
                operations: 0,
                errors: error_lines(&e),
            };
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!("error: validation failed");
                for e in &result.errors {
                    eprintln!("- {e}");
                }
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::VALIDATION_FAILED
        }
    }
}

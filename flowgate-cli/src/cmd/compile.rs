use std::path::Path;

use flowgate_core::load_openapi_str;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::settings::{compile_mode, read_file, SettingsError};
use crate::OutputArgs;

#[derive(Serialize)]
struct CompileFailure {
    valid: bool,
    errors: Vec<String>,
}

pub fn compile_cmd(path: &Path, output_file: Option<&Path>, skip_invalid: bool, output: OutputArgs) -> i32 {
    let content = match read_file(path) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let outcome = match load_openapi_str(&content, compile_mode(skip_invalid)) {
        Ok(o) => o,
        Err(e) => {
            let errors = super::validate::error_lines(&SettingsError::Config(e));
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!("error: compilation failed");
                for e in &errors {
                    eprintln!("- {e}");
                }
            } else {
                print_result(output.format, output.quiet, &CompileFailure { valid: false, errors });
            }
            return exit_codes::VALIDATION_FAILED;
        }
    };

    if !output.quiet {
        for skipped in &outcome.skipped {
            eprintln!("warning: skipped {skipped}");
        }
    }

    let blob = match serde_json::to_string_pretty(&outcome.config.to_document()) {
        Ok(b) => b,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to serialise configuration: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };

    match output_file {
        None => {
            println!("{blob}");
            exit_codes::SUCCESS
        }
        Some(out) => match std::fs::write(out, format!("{blob}\n")) {
            Ok(()) => {
                if !output.quiet && output.format == OutputFormat::Text {
                    eprintln!(
                        "ok: wrote {} operation(s) to {}",
                        outcome.config.len(),
                        out.display()
                    );
                }
                exit_codes::SUCCESS
            }
            Err(e) => {
                print_error(
                    output.format,
                    output.quiet,
                    &format!("failed to write {}: {e}", out.display()),
                );
                exit_codes::RUNTIME_ERROR
            }
        },
    }
}

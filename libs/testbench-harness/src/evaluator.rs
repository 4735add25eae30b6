/// Result Evaluator - Classification and Output Comparison
///
/// **Core Responsibility:**
/// Turn a raw `ExecutionResult` into a verdict for one test case.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP or the execution service
/// - Knows nothing about test case storage
/// - Pure function: (execution result, expected output) → evaluation
///
/// **Classification Order:**
/// 1. Compile stage exited non-zero → CompileError
/// 2. Run stage exited non-zero or was killed by a signal → RuntimeError
/// 3. Otherwise a clean run; stdout is compared against the expected output
///
/// **Normalization Rules (Applied to Both Sides):**
/// - Any run of whitespace (spaces, tabs, newlines, \r) collapses to one space
/// - Leading and trailing whitespace is trimmed
/// - Case sensitivity: YES (exact match required)
///
/// **Diagnostics:**
/// stderr from a clean run and compiler warnings are kept as notes for the
/// user to read. They never change the verdict.
///
/// **Actual Output:**
/// `actual_output` is the run's stdout with leading and trailing whitespace
/// trimmed, not the raw stream. Inner whitespace is kept as produced; only the
/// comparison collapses it.

use testbench_common::types::{ErrorKind, ExecutionResult};

use crate::error::HarnessError;

/// Advisory compiler/runtime noise that is not worth flagging as a problem
pub const BENIGN_DIAGNOSTICS: &[&str] = &["uses unchecked or unsafe operations", "Recompile with -Xlint"];

/// Verdict for one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// What was compared (clean run) or the error trace (failed run)
    pub actual_output: String,
    /// Informational lines shown after the output
    pub notes: Vec<String>,
    pub passed: bool,
    pub error_kind: Option<ErrorKind>,
}

impl Evaluation {
    /// Output plus notes, as stored on the test case and shown to the user
    pub fn display_text(&self) -> String {
        let mut lines: Vec<&str> = Vec::with_capacity(self.notes.len() + 1);
        if !self.actual_output.is_empty() {
            lines.push(&self.actual_output);
        }
        lines.extend(self.notes.iter().map(String::as_str));
        lines.join("\n")
    }

    /// The compile/runtime failure as an error, if there was one
    pub fn error(&self) -> Option<HarnessError> {
        match self.error_kind? {
            ErrorKind::CompileError => Some(HarnessError::CompileError(self.actual_output.clone())),
            ErrorKind::RuntimeError => Some(HarnessError::RuntimeError(self.actual_output.clone())),
        }
    }
}

/// Collapse whitespace runs to a single space and trim
pub fn normalize_output(output: &str) -> String {
    output.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

pub fn is_benign(diagnostic: &str) -> bool {
    BENIGN_DIAGNOSTICS.iter().any(|marker| diagnostic.contains(marker))
}

/// Classify `result` and, for a clean run, compare its stdout with `expected_output`
pub fn evaluate(result: &ExecutionResult, expected_output: &str) -> Evaluation {
    let mut evaluation = trace(result);
    if evaluation.error_kind.is_none() {
        evaluation.passed = outputs_match(&evaluation.actual_output, expected_output);
    }
    evaluation
}

/// Classify `result` without comparing anything (free-form runs)
pub fn trace(result: &ExecutionResult) -> Evaluation {
    let stdout = result
        .run
        .as_ref()
        .map(|run| run.stdout.trim())
        .unwrap_or_default();

    // 1. Compile failure
    if let Some(compile) = &result.compile {
        if matches!(compile.exit_code, Some(code) if code != 0) {
            let mut lines = Vec::new();
            if !stdout.is_empty() {
                lines.push(stdout.to_string());
            }
            let diagnostics = compile.output.trim();
            lines.push(if diagnostics.is_empty() {
                format!("Compile error: exit code {}", compile.exit_code.unwrap_or_default())
            } else {
                format!("Compile error: {}", diagnostics)
            });
            return failed(lines.join("\n"), ErrorKind::CompileError);
        }
    }

    let Some(run) = &result.run else {
        return failed(
            "Error: execution service returned no run result".to_string(),
            ErrorKind::RuntimeError,
        );
    };

    // 2. Runtime failure
    let exited_badly = matches!(run.exit_code, Some(code) if code != 0);
    if exited_badly || run.signal.is_some() {
        let mut lines = Vec::new();
        if !stdout.is_empty() {
            lines.push(stdout.to_string());
        }
        let stderr = run.stderr.trim();
        if !stderr.is_empty() {
            lines.push(format!("Error: {}", stderr));
        }
        if let Some(code) = run.exit_code.filter(|code| *code != 0) {
            lines.push(format!("Exit code: {}", code));
        }
        if let Some(signal) = &run.signal {
            lines.push(format!("Signal: {}", signal));
        }
        return failed(lines.join("\n"), ErrorKind::RuntimeError);
    }

    // 3. Clean run
    let mut notes = Vec::new();
    let stderr = run.stderr.trim();
    if !stderr.is_empty() {
        notes.push(if is_benign(stderr) {
            format!("Note: {}", stderr)
        } else {
            format!("Stderr: {}", stderr)
        });
    }
    if let Some(compile) = &result.compile {
        let warnings = compile.output.trim();
        if !warnings.is_empty() {
            notes.push(format!("Compile warning: {}", warnings));
        }
    }

    Evaluation {
        actual_output: stdout.to_string(),
        notes,
        passed: false,
        error_kind: None,
    }
}

fn failed(actual_output: String, kind: ErrorKind) -> Evaluation {
    Evaluation {
        actual_output,
        notes: Vec::new(),
        passed: false,
        error_kind: Some(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testbench_common::types::{CompileStage, RunStage};

    /// Helper to create a clean run with the given stdout
    fn make_run(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            compile: None,
            run: Some(RunStage {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: Some(0),
                signal: None,
            }),
        }
    }

    fn make_failed_run(stdout: &str, stderr: &str, exit_code: Option<i64>, signal: Option<&str>) -> ExecutionResult {
        ExecutionResult {
            compile: Some(CompileStage {
                output: String::new(),
                exit_code: Some(0),
            }),
            run: Some(RunStage {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                exit_code,
                signal: signal.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("6"), "6");
        assert_eq!(normalize_output("  6  \n"), "6");
        assert_eq!(normalize_output("1\n2\r\n3"), "1 2 3");
        assert_eq!(normalize_output("a \t  b"), "a b");
        assert_eq!(normalize_output(""), "");
        assert_eq!(normalize_output(" \n\t "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = ["", "x", "  a  b ", "\n\n1\r\n2\t3\n", "tabs\tand   spaces", " \u{a0}nbsp "];
        for sample in samples {
            let once = normalize_output(sample);
            assert_eq!(normalize_output(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_clean_run_passes() {
        let evaluation = evaluate(&make_run("6"), "6");
        assert!(evaluation.passed);
        assert_eq!(evaluation.error_kind, None);
        assert_eq!(evaluation.actual_output, "6");
    }

    #[test]
    fn test_actual_output_is_trimmed_stdout() {
        let evaluation = evaluate(&make_run("\n  1  2\n3 \n\n"), "1 2 3");
        assert!(evaluation.passed);
        assert_eq!(evaluation.actual_output, "1  2\n3");
    }

    #[test]
    fn test_whitespace_differences_ignored() {
        assert!(evaluate(&make_run("1 2\n3\n"), "1\n2 3").passed);
        assert!(evaluate(&make_run("  hello  \n"), "hello").passed);
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!evaluate(&make_run("hello"), "Hello").passed);
    }

    #[test]
    fn test_mismatch_fails_without_error_kind() {
        let evaluation = evaluate(&make_run("5"), "6");
        assert!(!evaluation.passed);
        assert_eq!(evaluation.error_kind, None);
        assert!(evaluation.error().is_none());
    }

    #[test]
    fn test_runtime_error_regardless_of_stdout() {
        let result = make_failed_run("6", "segfault", Some(1), None);
        let evaluation = evaluate(&result, "6");

        assert!(!evaluation.passed);
        assert_eq!(evaluation.error_kind, Some(ErrorKind::RuntimeError));
        assert_eq!(evaluation.actual_output, "6\nError: segfault\nExit code: 1");
        assert!(matches!(evaluation.error(), Some(HarnessError::RuntimeError(_))));
    }

    #[test]
    fn test_signal_is_runtime_error() {
        let result = make_failed_run("", "", None, Some("SIGKILL"));
        let evaluation = evaluate(&result, "");

        assert!(!evaluation.passed);
        assert_eq!(evaluation.error_kind, Some(ErrorKind::RuntimeError));
        assert_eq!(evaluation.actual_output, "Signal: SIGKILL");
    }

    #[test]
    fn test_compile_error_wins() {
        let result = ExecutionResult {
            compile: Some(CompileStage {
                output: "main.cpp:3:5: error: expected ';'\n".to_string(),
                exit_code: Some(1),
            }),
            run: None,
        };
        let evaluation = evaluate(&result, "6");

        assert!(!evaluation.passed);
        assert_eq!(evaluation.error_kind, Some(ErrorKind::CompileError));
        assert_eq!(evaluation.actual_output, "Compile error: main.cpp:3:5: error: expected ';'");
    }

    #[test]
    fn test_compile_error_without_output() {
        let result = ExecutionResult {
            compile: Some(CompileStage {
                output: String::new(),
                exit_code: Some(2),
            }),
            run: None,
        };
        let evaluation = evaluate(&result, "");
        assert_eq!(evaluation.error_kind, Some(ErrorKind::CompileError));
        assert_eq!(evaluation.actual_output, "Compile error: exit code 2");
    }

    #[test]
    fn test_benign_stderr_does_not_flip_verdict() {
        let mut result = make_run("6");
        if let Some(run) = result.run.as_mut() {
            run.stderr = "Note: Main.java uses unchecked or unsafe operations.".to_string();
        }
        let evaluation = evaluate(&result, "6");

        assert!(evaluation.passed);
        assert_eq!(evaluation.error_kind, None);
        assert_eq!(evaluation.notes.len(), 1);
        assert!(evaluation.display_text().contains("uses unchecked or unsafe operations"));
    }

    #[test]
    fn test_clean_run_stderr_is_informational() {
        let mut result = make_run("6");
        if let Some(run) = result.run.as_mut() {
            run.stderr = "debug: n=3".to_string();
        }
        let evaluation = evaluate(&result, "6");

        assert!(evaluation.passed);
        assert_eq!(evaluation.display_text(), "6\nStderr: debug: n=3");
    }

    #[test]
    fn test_compile_warning_is_a_note() {
        let result = ExecutionResult {
            compile: Some(CompileStage {
                output: "warning: unused variable 'x'".to_string(),
                exit_code: Some(0),
            }),
            ..make_run("6")
        };
        let evaluation = evaluate(&result, "6");

        assert!(evaluation.passed);
        assert_eq!(evaluation.notes, vec!["Compile warning: warning: unused variable 'x'".to_string()]);
    }

    #[test]
    fn test_missing_run_stage() {
        let evaluation = evaluate(&ExecutionResult::default(), "6");
        assert!(!evaluation.passed);
        assert_eq!(evaluation.error_kind, Some(ErrorKind::RuntimeError));
    }

    #[test]
    fn test_is_benign() {
        assert!(is_benign("Note: Recompile with -Xlint:unchecked for details."));
        assert!(!is_benign("Exception in thread \"main\""));
    }
}

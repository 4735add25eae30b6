use crate::types::{CompileStage, ExecutionResult, RunStage, RuntimeDescriptor};
use serde::{Deserialize, Serialize};

/// Execution service wire contract - defines only the shapes, not the transport.
/// Keeps the HTTP client and any fake service used in tests from drifting apart.

pub const RUNTIMES_PATH: &str = "runtimes";
pub const EXECUTE_PATH: &str = "execute";

/// Default public instance
pub const DEFAULT_BASE_URL: &str = "https://emkc.org/api/v2/piston";

pub fn runtimes_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), RUNTIMES_PATH)
}

pub fn execute_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), EXECUTE_PATH)
}

/// One entry of `GET /runtimes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PistonRuntime {
    pub language: String,
    pub version: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

impl From<PistonRuntime> for RuntimeDescriptor {
    fn from(runtime: PistonRuntime) -> Self {
        RuntimeDescriptor::new(runtime.language, runtime.version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PistonFile {
    pub name: String,
    pub content: String,
}

/// Body of `POST /execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PistonExecuteRequest {
    pub language: String,
    pub version: String,
    pub files: Vec<PistonFile>,
    pub stdin: String,
}

impl PistonExecuteRequest {
    pub fn single_file(runtime: &RuntimeDescriptor, file_name: &str, content: &str, stdin: &str) -> Self {
        Self {
            language: runtime.language.clone(),
            version: runtime.version.clone(),
            files: vec![PistonFile {
                name: file_name.to_string(),
                content: content.to_string(),
            }],
            stdin: stdin.to_string(),
        }
    }
}

/// Output of one stage (compile or run) as the service reports it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PistonStage {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    /// Interleaved stdout + stderr
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub signal: Option<String>,
}

/// Reply of `POST /execute`. Error replies only carry `message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PistonExecuteResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile: Option<PistonStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<PistonStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PistonExecuteResponse {
    /// Drop the wire details the harness does not care about
    pub fn into_execution_result(self) -> ExecutionResult {
        ExecutionResult {
            compile: self.compile.map(|stage| CompileStage {
                output: if stage.output.is_empty() {
                    format!("{}{}", stage.stdout, stage.stderr)
                } else {
                    stage.output
                },
                exit_code: stage.code,
            }),
            run: self.run.map(|stage| RunStage {
                stdout: stage.stdout,
                stderr: stage.stderr,
                exit_code: stage.code,
                signal: stage.signal,
            }),
        }
    }
}

/// Error body the service sends with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PistonErrorBody {
    pub message: String,
}

/// Execution Client - Talking to the Execution Service
///
/// **Responsibility:**
/// Fetch the runtime catalog and submit one program + stdin, returning the
/// service's reply as an `ExecutionResult`.
///
/// **Knows nothing about:**
/// - Pass/fail (evaluator's job)
/// - Which runtime version to pick (resolver's job)
///
/// **Failure Policy:**
/// No retries. Transport failures become `HarnessError::Network`, error
/// replies become `HarnessError::ExecutionService`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use testbench_common::piston::{
    execute_url, runtimes_url, PistonErrorBody, PistonExecuteRequest, PistonExecuteResponse, PistonRuntime,
};
use testbench_common::types::{ExecutionResult, RuntimeDescriptor};
use tracing::{debug, instrument};

use crate::error::{HarnessError, Result};

/// Seam between the harness and the sandboxed code runner
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Every (language, version) pair the service currently offers
    async fn runtimes(&self) -> Result<Vec<RuntimeDescriptor>>;

    async fn execute(
        &self,
        runtime: &RuntimeDescriptor,
        file_name: &str,
        program: &str,
        stdin: &str,
    ) -> Result<ExecutionResult>;
}

/// HTTP client for a Piston-compatible execution service
#[derive(Debug, Clone)]
pub struct PistonClient {
    http: Client,
    base_url: String,
}

impl PistonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ExecutionService for PistonClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn runtimes(&self) -> Result<Vec<RuntimeDescriptor>> {
        let response = self.http.get(runtimes_url(&self.base_url)).send().await?;
        let response = ensure_success(response).await?;

        let catalog: Vec<PistonRuntime> = response.json().await?;
        debug!(runtimes = catalog.len(), "Fetched runtime catalog");

        Ok(catalog.into_iter().map(RuntimeDescriptor::from).collect())
    }

    #[instrument(
        skip(self, program, stdin),
        fields(runtime = %runtime.language, version = %runtime.version, source_size = program.len())
    )]
    async fn execute(
        &self,
        runtime: &RuntimeDescriptor,
        file_name: &str,
        program: &str,
        stdin: &str,
    ) -> Result<ExecutionResult> {
        let request = PistonExecuteRequest::single_file(runtime, file_name, program, stdin);

        let response = self
            .http
            .post(execute_url(&self.base_url))
            .json(&request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let response = ensure_success(response).await?;

        let reply: PistonExecuteResponse = response.json().await?;

        // Some deployments answer 200 with only a message
        if reply.run.is_none() && reply.compile.is_none() {
            if let Some(message) = reply.message {
                return Err(HarnessError::ExecutionService { status, message });
            }
        }

        let result = reply.into_execution_result();
        debug!(
            compiled = result.compile.is_some(),
            ran = result.run.is_some(),
            exit_code = ?result.run.as_ref().and_then(|run| run.exit_code),
            "Execution reply received"
        );
        Ok(result)
    }
}

/// Turn a non-2xx reply into `ExecutionService`, keeping the service's message when it sent one
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<PistonErrorBody>(&body)
        .map(|error| error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.trim().to_string()
            }
        });

    Err(HarnessError::ExecutionService {
        status: status.as_u16(),
        message,
    })
}

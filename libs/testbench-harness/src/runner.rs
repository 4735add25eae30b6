/// Batch Runner - Test Case Lifecycle and Run Orchestration
///
/// **Core Responsibility:**
/// Drive one session's test cases through Idle → Running → Passed/Failed by
/// pushing the submission through adapt → resolve → execute → evaluate.
///
/// **Single Run:**
/// 1. Case must exist and have both input and expected output
/// 2. Case must not already be Running
/// 3. Hidden cases need full access
/// 4. Cooldown gate must be open
///
/// **Batch Run:**
/// - Full access checked up front, nothing runs without it
/// - Every runnable case runs in id order, with a fixed pause between cases
/// - Never stops early; one failure does not skip the rest
/// - All passing marks the problem solved, exactly once per batch
/// - Any failing hidden case reveals hidden results
///
/// **Service Failures:**
/// Written into the case's actual output, case marked Failed, error returned.
/// No retries. A run dropped mid-flight leaves its case Failed, never Running.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use testbench_common::config::HarnessConfig;
use testbench_common::types::{
    is_hidden_id, ErrorKind, ExecutionResult, ProblemState, SessionContext, Submission, TestCase, TestStatus,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::adapter::adapt;
use crate::collaborators::{AccessPolicyProvider, HttpAccessPolicy, HttpSolvedMarker, SolvedMarker, StaticAccessPolicy};
use crate::cooldown::CooldownGate;
use crate::error::{HarnessError, Result};
use crate::evaluator::{evaluate, trace, Evaluation};
use crate::executor::{ExecutionService, PistonClient};
use crate::reports::{IssueType, ReportSink, TestCaseReport};
use crate::resolver::resolve;
use crate::store::{TestCaseField, TestCaseStore};

pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);

/// Outcome of a single-case run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub id: u32,
    pub evaluation: Evaluation,
    /// The case is hidden and did not pass
    pub reveal_hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    AllPassed,
    RevealHidden,
}

/// Per-case line of a batch report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    pub id: u32,
    pub status: TestStatus,
    pub actual_output: String,
    pub error_kind: Option<ErrorKind>,
    /// Service failure that prevented evaluation
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub cases: Vec<CaseResult>,
    pub all_passed: bool,
    pub signals: Vec<Signal>,
    /// Solved marking runs in the background; await it to observe completion
    pub solved_task: Option<JoinHandle<()>>,
}

impl BatchReport {
    pub fn has_signal(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }

    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|case| case.status == TestStatus::Passed).count()
    }
}

pub struct BatchRunner {
    context: SessionContext,
    store: TestCaseStore,
    cooldown: CooldownGate,
    service: Arc<dyn ExecutionService>,
    access: Arc<dyn AccessPolicyProvider>,
    solved: Option<Arc<dyn SolvedMarker>>,
    batch_delay: Duration,
    hidden_revealed: bool,
}

impl BatchRunner {
    pub fn new(
        context: SessionContext,
        service: Arc<dyn ExecutionService>,
        access: Arc<dyn AccessPolicyProvider>,
    ) -> Self {
        Self {
            context,
            store: TestCaseStore::new(),
            cooldown: CooldownGate::default(),
            service,
            access,
            solved: None,
            batch_delay: DEFAULT_BATCH_DELAY,
            hidden_revealed: false,
        }
    }

    /// Wire HTTP collaborators from configuration. Without an access endpoint
    /// the session is restricted; without a solved endpoint nothing is marked.
    pub fn from_config(config: &HarnessConfig, context: SessionContext, http: Client) -> Self {
        let service = Arc::new(PistonClient::with_client(http.clone(), config.piston_url.clone()));
        let access: Arc<dyn AccessPolicyProvider> = match &config.access_endpoint {
            Some(endpoint) => Arc::new(HttpAccessPolicy::new(http.clone(), endpoint.clone())),
            None => Arc::new(StaticAccessPolicy::restricted()),
        };

        let mut runner = Self::new(context, service, access)
            .with_cooldown(config.cooldown())
            .with_batch_delay(config.batch_delay());
        if let Some(endpoint) = &config.solved_endpoint {
            runner = runner.with_solved_marker(Arc::new(HttpSolvedMarker::new(http, endpoint.clone())));
        }
        runner
    }

    pub fn with_solved_marker(mut self, marker: Arc<dyn SolvedMarker>) -> Self {
        self.solved = Some(marker);
        self
    }

    pub fn with_access_policy(mut self, access: Arc<dyn AccessPolicyProvider>) -> Self {
        self.access = access;
        self
    }

    pub fn with_cooldown(mut self, window: Duration) -> Self {
        self.cooldown = CooldownGate::new(window);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn store(&self) -> &TestCaseStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TestCaseStore {
        &mut self.store
    }

    pub fn hidden_revealed(&self) -> bool {
        self.hidden_revealed
    }

    pub fn load_problem(&mut self, problem: &ProblemState) -> Result<()> {
        self.store
            .load_from_problem(&problem.input_test_cases, &problem.output_test_cases)?;
        self.hidden_revealed = false;
        Ok(())
    }

    /// Cases the user may see: visible ones, plus hidden ones once revealed or with full access
    pub async fn listed_cases(&self) -> Result<Vec<TestCase>> {
        let show_hidden = self.hidden_revealed
            || self.access.check_access(&self.context.context_id).await?.can_access_all;
        Ok(self
            .store
            .cases()
            .iter()
            .filter(|case| show_hidden || self.store.is_visible(case.id))
            .cloned()
            .collect())
    }

    /// Run one test case. Compile and runtime errors come back as a failed
    /// evaluation; `Evaluation::error` turns them into a `HarnessError`.
    pub async fn run_one(&mut self, id: u32, submission: &Submission) -> Result<RunOutcome> {
        let case = self
            .store
            .get(id)
            .ok_or_else(|| HarnessError::Validation(format!("no test case with id {}", id)))?;
        if !case.is_runnable() {
            return Err(HarnessError::Validation(format!(
                "test case {} needs both input and expected output",
                id
            )));
        }
        if case.status == TestStatus::Running {
            return Err(HarnessError::AlreadyRunning(id));
        }

        let hidden = is_hidden_id(id);
        if hidden {
            let policy = self.access.check_access(&self.context.context_id).await?;
            if !policy.can_access_all {
                return Err(HarnessError::AccessDenied(format!(
                    "test case {} is hidden",
                    id
                )));
            }
        }

        self.acquire_cooldown()?;

        let span = info_span!("run_one", session_id = %self.context.session_id, test_id = id);
        let evaluation = self.execute_case(id, submission).instrument(span).await?;

        let reveal_hidden = hidden && !evaluation.passed;
        if reveal_hidden {
            self.hidden_revealed = true;
        }

        Ok(RunOutcome {
            id,
            evaluation,
            reveal_hidden,
        })
    }

    /// Run every runnable case in id order
    pub async fn run_all(&mut self, submission: &Submission) -> Result<BatchReport> {
        let policy = self.access.check_access(&self.context.context_id).await?;
        if !policy.can_access_all {
            return Err(HarnessError::AccessDenied(
                "submitting all test cases requires full access".to_string(),
            ));
        }

        let ids = self.store.runnable_ids();
        if let Some(running) = ids
            .iter()
            .find(|id| self.store.get(**id).map(|case| case.status) == Some(TestStatus::Running))
        {
            return Err(HarnessError::AlreadyRunning(*running));
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("run_all", session_id = %self.context.session_id, %run_id);
        let cases = self.run_batch(&ids, submission).instrument(span).await;

        let all_passed = !cases.is_empty() && cases.iter().all(|case| case.status == TestStatus::Passed);
        let hidden_failed = cases
            .iter()
            .any(|case| is_hidden_id(case.id) && case.status != TestStatus::Passed);

        let mut signals = Vec::new();
        if all_passed {
            signals.push(Signal::AllPassed);
        }
        if hidden_failed {
            signals.push(Signal::RevealHidden);
            self.hidden_revealed = true;
        }

        let solved_task = if all_passed { self.spawn_mark_solved() } else { None };

        info!(
            session_id = %self.context.session_id,
            %run_id,
            total = cases.len(),
            all_passed,
            "Batch run complete"
        );

        Ok(BatchReport {
            run_id,
            cases,
            all_passed,
            signals,
            solved_task,
        })
    }

    /// Free-form run against arbitrary stdin, returning the full trace
    pub async fn run_code(&mut self, submission: &Submission, stdin: &str) -> Result<Evaluation> {
        self.acquire_cooldown()?;

        let span = info_span!("run_code", session_id = %self.context.session_id, stdin_size = stdin.len());
        let result = execute_submission(self.service.as_ref(), submission, stdin)
            .instrument(span)
            .await?;
        Ok(trace(&result))
    }

    /// File a report about a case's current state
    pub async fn report_case(
        &self,
        id: u32,
        issue_type: IssueType,
        description: &str,
        sink: &dyn ReportSink,
    ) -> Result<TestCaseReport> {
        let case = self
            .store
            .get(id)
            .ok_or_else(|| HarnessError::Validation(format!("no test case with id {}", id)))?;
        let report = TestCaseReport::from_case(
            &self.context.question_id,
            case,
            self.context.user_id.clone(),
            issue_type,
            description,
        )?;
        sink.submit(&report).await?;
        Ok(report)
    }

    async fn run_batch(&mut self, ids: &[u32], submission: &Submission) -> Vec<CaseResult> {
        let mut results = Vec::with_capacity(ids.len());

        for (index, id) in ids.iter().copied().enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let outcome = self.execute_case(id, submission).await;
            let error = match &outcome {
                Ok(_) => None,
                Err(e) => {
                    warn!(test_id = id, error = %e, "Test case could not be evaluated");
                    Some(e.to_string())
                }
            };

            let (status, actual_output) = self
                .store
                .get(id)
                .map(|case| (case.status, case.actual_output.clone()))
                .unwrap_or((TestStatus::Failed, String::new()));

            results.push(CaseResult {
                id,
                status,
                actual_output,
                error_kind: outcome.ok().and_then(|evaluation| evaluation.error_kind),
                error,
            });
        }

        results
    }

    /// Run one stored case and record its verdict on the store
    async fn execute_case(&mut self, id: u32, submission: &Submission) -> Result<Evaluation> {
        let (input, expected) = match self.store.get(id) {
            Some(case) => (case.input.clone(), case.expected_output.clone()),
            None => return Err(HarnessError::Validation(format!("no test case with id {}", id))),
        };

        self.store.update(id, TestCaseField::Status(TestStatus::Running))?;
        let guard = RunningGuard::new(&mut self.store, id);
        let started = std::time::Instant::now();

        match execute_submission(self.service.as_ref(), submission, &input).await {
            Ok(result) => {
                let evaluation = evaluate(&result, &expected);
                let status = if evaluation.passed { TestStatus::Passed } else { TestStatus::Failed };
                guard.finish(evaluation.display_text(), status)?;

                info!(
                    test_id = id,
                    status = ?status,
                    error_kind = ?evaluation.error_kind,
                    execution_ms = started.elapsed().as_millis() as u64,
                    "Test case evaluated"
                );
                Ok(evaluation)
            }
            Err(e) => {
                guard.finish(format!("Error: {}", e), TestStatus::Failed)?;
                Err(e)
            }
        }
    }

    fn acquire_cooldown(&mut self) -> Result<()> {
        if self.cooldown.try_acquire() {
            return Ok(());
        }
        let remaining = self.cooldown.remaining().unwrap_or_default();
        let remaining_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        Err(HarnessError::CooldownActive { remaining_secs })
    }

    fn spawn_mark_solved(&self) -> Option<JoinHandle<()>> {
        let marker = self.solved.clone()?;
        let user_id = self.context.user_id.clone()?;
        let question_id = self.context.question_id.clone();

        Some(tokio::spawn(async move {
            match marker.mark_solved(&user_id, &question_id).await {
                Ok(()) => info!(user_id = %user_id, question_id = %question_id, "Marked problem solved"),
                Err(e) => warn!(user_id = %user_id, question_id = %question_id, error = %e, "Failed to mark problem solved"),
            }
        }))
    }
}

/// adapt → resolve → execute
async fn execute_submission(
    service: &dyn ExecutionService,
    submission: &Submission,
    stdin: &str,
) -> Result<ExecutionResult> {
    let program = adapt(submission.language, &submission.source_code);
    let runtime = resolve(service, submission.language.piston_name()).await?;

    debug!(
        language = %submission.language,
        runtime = %runtime,
        wrapped = program.wrapped,
        source_size = program.content.len(),
        "Submitting program"
    );
    service
        .execute(&runtime, program.file_name, &program.content, stdin)
        .await
}

/// Holds a case in Running; if the run is dropped before `finish`, the case
/// is failed instead of staying Running forever
struct RunningGuard<'a> {
    store: &'a mut TestCaseStore,
    id: u32,
    finished: bool,
}

impl<'a> RunningGuard<'a> {
    fn new(store: &'a mut TestCaseStore, id: u32) -> Self {
        Self {
            store,
            id,
            finished: false,
        }
    }

    fn finish(mut self, actual_output: String, status: TestStatus) -> Result<()> {
        self.finished = true;
        self.store.update(self.id, TestCaseField::ActualOutput(actual_output))?;
        self.store.update(self.id, TestCaseField::Status(status))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(test_id = self.id, "Run dropped before completion");
        let _ = self
            .store
            .update(self.id, TestCaseField::ActualOutput("Error: run was cancelled".to_string()));
        let _ = self.store.update(self.id, TestCaseField::Status(TestStatus::Failed));
    }
}

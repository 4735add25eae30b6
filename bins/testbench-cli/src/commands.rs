// CLI commands for running submissions against the execution service
use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use testbench_common::config::HarnessConfig;
use testbench_common::types::{Language, ProblemState, SessionContext, Submission, TestStatus};
use testbench_harness::adapter::adapt;
use testbench_harness::collaborators::StaticAccessPolicy;
use testbench_harness::reports::{HttpReportSink, IssueType};
use testbench_harness::resolver::{resolve, select_runtime};
use testbench_harness::templates::starter_template;
use testbench_harness::{BatchRunner, ExecutionService, PistonClient, Signal, TestCaseField};
use tracing::{info, warn};

pub fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::load(path)?.with_env_overrides(),
        None => HarnessConfig::load_default(),
    }
}

fn load_problem(path: &Path) -> Result<ProblemState> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read problem file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse problem file {}", path.display()))
}

fn load_submission(language: Language, path: &Path) -> Result<Submission> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file {}", path.display()))?;
    Ok(Submission::new(language, source))
}

fn problem_runner(
    config: &HarnessConfig,
    problem: &ProblemState,
    user: Option<String>,
    all_access: bool,
) -> Result<BatchRunner> {
    let context = SessionContext::new(user, problem.question_id.as_str(), problem.question_id.as_str());
    let mut runner = BatchRunner::from_config(config, context, Client::new());
    if all_access {
        runner = runner.with_access_policy(Arc::new(StaticAccessPolicy::full()));
    }
    runner.load_problem(problem)?;
    Ok(runner)
}

fn status_mark(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "✓",
        TestStatus::Failed => "✗",
        TestStatus::Running => "…",
        TestStatus::Idle => "-",
    }
}

/// List the catalog, or the runtime a language resolves to
pub async fn list_runtimes(config: &HarnessConfig, language: Option<Language>) -> Result<()> {
    let client = PistonClient::new(config.piston_url.clone());

    if let Some(language) = language {
        let runtime = resolve(&client, language.piston_name()).await?;
        println!("{} → {}", language, runtime);
        return Ok(());
    }

    let catalog = client.runtimes().await?;
    println!("📦 {} runtimes available at {}", catalog.len(), config.piston_url);
    for language in Language::ALL {
        match select_runtime(&catalog, language.piston_name()) {
            Some(runtime) => println!("  {:<12} {}", language.as_str(), runtime.version),
            None => println!("  {:<12} (not available)", language.as_str()),
        }
    }
    Ok(())
}

pub fn print_template(language: Language) {
    print!("{}", starter_template(language));
}

pub fn adapt_source(language: Language, source: &Path) -> Result<()> {
    let submission = load_submission(language, source)?;
    let program = adapt(language, &submission.source_code);

    eprintln!(
        "→ {} ({})",
        program.file_name,
        if program.wrapped { "wrapped with input driver" } else { "submitted as written" }
    );
    print!("{}", program.content);
    Ok(())
}

/// Free-form run: show everything the program produced
pub async fn exec(config: &HarnessConfig, language: Language, source: &Path, stdin: Option<&Path>) -> Result<()> {
    let submission = load_submission(language, source)?;
    let stdin = match stdin {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read stdin file {}", path.display()))?,
        None => String::new(),
    };

    let context = SessionContext::new(None, "", "");
    let mut runner = BatchRunner::from_config(config, context, Client::new());
    let evaluation = runner.run_code(&submission, &stdin).await?;
    info!(language = %language, error_kind = ?evaluation.error_kind, "Program finished");

    println!("{}", evaluation.display_text());
    if let Some(kind) = evaluation.error_kind {
        bail!("Program failed: {:?}", kind);
    }
    Ok(())
}

pub async fn run_case(
    config: &HarnessConfig,
    problem: &Path,
    language: Language,
    source: &Path,
    case: u32,
    all_access: bool,
) -> Result<()> {
    let problem = load_problem(problem)?;
    let submission = load_submission(language, source)?;
    let mut runner = problem_runner(config, &problem, None, all_access)?;

    println!("🚀 Running test case {} ({})", case, language);
    let outcome = runner.run_one(case, &submission).await?;
    info!(
        test_id = case,
        language = %language,
        passed = outcome.evaluation.passed,
        error_kind = ?outcome.evaluation.error_kind,
        "Test case finished"
    );

    let status = if outcome.evaluation.passed { TestStatus::Passed } else { TestStatus::Failed };
    println!("  {} Test case {}", status_mark(status), case);
    if let Some(test_case) = runner.store().get(case) {
        println!("  Expected: {}", test_case.expected_output);
        println!("  Actual:   {}", test_case.actual_output);
    }

    if !outcome.evaluation.passed {
        bail!("Test case {} failed", case);
    }
    Ok(())
}

pub async fn submit(
    config: &HarnessConfig,
    problem: &Path,
    language: Language,
    source: &Path,
    user: Option<String>,
    all_access: bool,
) -> Result<()> {
    let problem = load_problem(problem)?;
    let submission = load_submission(language, source)?;
    let mut runner = problem_runner(config, &problem, user, all_access)?;

    println!("🚀 Submitting {} against {} test cases", language, runner.store().len());
    let mut report = runner.run_all(&submission).await?;
    info!(
        run_id = %report.run_id,
        language = %language,
        passed = report.passed_count(),
        total = report.cases.len(),
        all_passed = report.all_passed,
        "Submission finished"
    );

    for case in &report.cases {
        println!("  {} Test case {}", status_mark(case.status), case.id);
        if case.status != TestStatus::Passed {
            for line in case.actual_output.lines() {
                println!("      {}", line);
            }
        }
    }
    println!();
    println!("  Run id: {}", report.run_id);
    println!("  Passed: {}/{}", report.passed_count(), report.cases.len());

    if report.has_signal(Signal::RevealHidden) {
        warn!(run_id = %report.run_id, "Hidden test cases failed, revealing them");
        println!("  ⚠ Hidden test cases failed; their results are now visible");
    }

    if let Some(task) = report.solved_task.take() {
        task.await.context("Solved marking task panicked")?;
    }

    if !report.all_passed {
        bail!("{} of {} test cases passed", report.passed_count(), report.cases.len());
    }
    println!("✅ All test cases passed");
    Ok(())
}

pub async fn report(
    config: &HarnessConfig,
    problem: &Path,
    case: u32,
    issue: IssueType,
    description: &str,
    actual_output: Option<String>,
    user: Option<String>,
) -> Result<()> {
    let Some(endpoint) = config.reports_endpoint.clone() else {
        bail!("No reports endpoint configured (set reports_endpoint or REPORTS_ENDPOINT)");
    };

    let problem = load_problem(problem)?;
    let mut runner = problem_runner(config, &problem, user, false)?;
    if let Some(actual) = actual_output {
        runner.store_mut().update(case, TestCaseField::ActualOutput(actual))?;
    }

    let sink = HttpReportSink::new(Client::new(), endpoint);
    let report = runner.report_case(case, issue, description, &sink).await?;

    println!(
        "📝 Reported test case {} of question {} ({})",
        report.test_case_index, report.question_id, report.issue_type
    );
    Ok(())
}

// Test-case reports filed by users who think a case is wrong
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use testbench_common::types::TestCase;
use tracing::info;

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    WrongExpectedOutput,
    InvalidInput,
    Unclear,
    Other,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::WrongExpectedOutput => "wrong_expected_output",
            IssueType::InvalidInput => "invalid_input",
            IssueType::Unclear => "unclear",
            IssueType::Other => "other",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "wrong_expected_output" => Ok(IssueType::WrongExpectedOutput),
            "invalid_input" => Ok(IssueType::InvalidInput),
            "unclear" => Ok(IssueType::Unclear),
            "other" => Ok(IssueType::Other),
            other => Err(format!("unknown issue type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
}

/// Snapshot of a test case plus the user's complaint about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseReport {
    pub question_id: String,
    pub test_case_index: u32,
    pub user_id: Option<String>,
    pub issue_type: IssueType,
    pub description: String,
    pub test_input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl TestCaseReport {
    pub fn from_case(
        question_id: &str,
        case: &TestCase,
        user_id: Option<String>,
        issue_type: IssueType,
        description: impl Into<String>,
    ) -> Result<Self> {
        if question_id.trim().is_empty() {
            return Err(HarnessError::Validation("report needs a question id".to_string()));
        }
        if case.id == 0 {
            return Err(HarnessError::Validation("report needs a test case index".to_string()));
        }

        Ok(Self {
            question_id: question_id.to_string(),
            test_case_index: case.id,
            user_id,
            issue_type,
            description: description.into(),
            test_input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            actual_output: case.actual_output.clone(),
            status: ReportStatus::Pending,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(&self, report: &TestCaseReport) -> Result<()>;
}

/// `POST {endpoint}` with the report flattened next to `"action": "submit_report"`
#[derive(Debug, Clone)]
pub struct HttpReportSink {
    http: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct SubmitReportRequest<'a> {
    action: &'static str,
    #[serde(flatten)]
    report: &'a TestCaseReport,
}

impl HttpReportSink {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn submit(&self, report: &TestCaseReport) -> Result<()> {
        let body = SubmitReportRequest {
            action: "submit_report",
            report,
        };
        self.http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        info!(
            question_id = %report.question_id,
            test_id = report.test_case_index,
            issue = %report.issue_type,
            "Test case report submitted"
        );
        Ok(())
    }
}

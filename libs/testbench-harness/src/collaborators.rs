// Session collaborators: access policy and solved marking
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use testbench_common::types::AccessPolicy;
use tracing::debug;

use crate::error::{HarnessError, Result};

/// Decides whether the session may run hidden test cases and batches
#[async_trait]
pub trait AccessPolicyProvider: Send + Sync {
    async fn check_access(&self, context_id: &str) -> Result<AccessPolicy>;
}

/// Records a fully passing batch for the user
#[async_trait]
pub trait SolvedMarker: Send + Sync {
    async fn mark_solved(&self, user_id: &str, question_id: &str) -> Result<()>;
}

/// Fixed policy, used by the CLI and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAccessPolicy(pub AccessPolicy);

impl StaticAccessPolicy {
    pub fn full() -> Self {
        Self(AccessPolicy::full())
    }

    pub fn restricted() -> Self {
        Self(AccessPolicy::restricted())
    }
}

#[async_trait]
impl AccessPolicyProvider for StaticAccessPolicy {
    async fn check_access(&self, _context_id: &str) -> Result<AccessPolicy> {
        Ok(self.0)
    }
}

/// `GET {endpoint}?context_id=...` answering `{"can_access_all": bool}`
#[derive(Debug, Clone)]
pub struct HttpAccessPolicy {
    http: Client,
    endpoint: String,
}

impl HttpAccessPolicy {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AccessPolicyProvider for HttpAccessPolicy {
    async fn check_access(&self, context_id: &str) -> Result<AccessPolicy> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("context_id", context_id)])
            .send()
            .await?
            .error_for_status()?;

        let policy: AccessPolicy = response.json().await?;
        debug!(context_id, can_access_all = policy.can_access_all, "Access policy checked");
        Ok(policy)
    }
}

/// `POST {endpoint}` with `{"action": "mark_solved", "user_id", "question_id"}`
#[derive(Debug, Clone)]
pub struct HttpSolvedMarker {
    http: Client,
    endpoint: String,
}

impl HttpSolvedMarker {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SolvedMarker for HttpSolvedMarker {
    async fn mark_solved(&self, user_id: &str, question_id: &str) -> Result<()> {
        let body = json!({
            "action": "mark_solved",
            "user_id": user_id,
            "question_id": question_id,
        });

        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(HarnessError::Network(format!(
                "mark solved failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

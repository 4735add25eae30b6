use thiserror::Error;

/// Every failure the harness surfaces to its caller
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The runtime catalog has no entry for the language
    #[error("no runtime available for language '{0}'")]
    RuntimeNotFound(String),

    #[error("compilation failed: {0}")]
    CompileError(String),

    /// Non-zero exit status or termination by signal
    #[error("runtime error: {0}")]
    RuntimeError(String),

    /// Transport failure talking to the execution service or a collaborator
    #[error("network error: {0}")]
    Network(String),

    /// The execution service answered, but with an error
    #[error("execution service rejected the request (status {status}): {message}")]
    ExecutionService { status: u16, message: String },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("please wait {remaining_secs}s before running again")]
    CooldownActive { remaining_secs: u64 },

    #[error("test case {0} is already running")]
    AlreadyRunning(u32),
}

impl HarnessError {
    /// Failures that come from the execution service rather than from the request itself
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            HarnessError::RuntimeNotFound(_)
                | HarnessError::Network(_)
                | HarnessError::ExecutionService { .. }
        )
    }
}

impl From<reqwest::Error> for HarnessError {
    fn from(err: reqwest::Error) -> Self {
        HarnessError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_human_readable() {
        assert_eq!(
            HarnessError::RuntimeNotFound("c++".into()).to_string(),
            "no runtime available for language 'c++'"
        );
        assert_eq!(
            HarnessError::CooldownActive { remaining_secs: 4 }.to_string(),
            "please wait 4s before running again"
        );
        assert_eq!(
            HarnessError::ExecutionService { status: 400, message: "bad version".into() }.to_string(),
            "execution service rejected the request (status 400): bad version"
        );
    }

    #[test]
    fn test_service_failures() {
        assert!(HarnessError::Network("reset".into()).is_service_failure());
        assert!(HarnessError::RuntimeNotFound("go".into()).is_service_failure());
        assert!(!HarnessError::AccessDenied("hidden".into()).is_service_failure());
        assert!(!HarnessError::CooldownActive { remaining_secs: 1 }.is_service_failure());
    }
}

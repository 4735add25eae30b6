use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Ids below this are always visible; everything from here on is hidden
/// unless the access policy grants full access.
pub const FIRST_HIDDEN_ID: u32 = 3;

/// Languages the harness can submit to the execution service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Cpp,
    Java,
    JavaScript,
    C,
    CSharp,
    Go,
    Rust,
    TypeScript,
    Php,
    Ruby,
    Swift,
    Kotlin,
    Scala,
}

impl Language {
    pub const ALL: [Language; 14] = [
        Language::Python,
        Language::Cpp,
        Language::Java,
        Language::JavaScript,
        Language::C,
        Language::CSharp,
        Language::Go,
        Language::Rust,
        Language::TypeScript,
        Language::Php,
        Language::Ruby,
        Language::Swift,
        Language::Kotlin,
        Language::Scala,
    ];

    /// Canonical lowercase name, as used in config and on the wire to our own clients
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::C => "c",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Scala => "scala",
        }
    }

    /// Name the execution service lists this language under in its runtime catalog
    pub fn piston_name(&self) -> &'static str {
        match self {
            Language::Cpp => "c++",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let language = match s.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => Language::Python,
            "cpp" | "c++" => Language::Cpp,
            "java" => Language::Java,
            "javascript" | "js" | "node" => Language::JavaScript,
            "c" => Language::C,
            "csharp" | "c#" | "cs" => Language::CSharp,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            "typescript" | "ts" => Language::TypeScript,
            "php" => Language::Php,
            "ruby" | "rb" => Language::Ruby,
            "swift" => Language::Swift,
            "kotlin" | "kt" => Language::Kotlin,
            "scala" => Language::Scala,
            other => return Err(format!("unsupported language: {}", other)),
        };
        Ok(language)
    }
}

/// Where a test case came from. Database cases can never be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Database,
    UserAdded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    #[default]
    Idle,
    Running,
    Passed,
    Failed,
}

impl TestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TestStatus::Passed | TestStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u32,
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub actual_output: String,
    #[serde(default)]
    pub status: TestStatus,
    pub origin: Origin,
}

impl TestCase {
    pub fn new(id: u32, input: impl Into<String>, expected_output: impl Into<String>, origin: Origin) -> Self {
        Self {
            id,
            input: input.into(),
            expected_output: expected_output.into(),
            actual_output: String::new(),
            status: TestStatus::Idle,
            origin,
        }
    }

    pub fn is_hidden(&self) -> bool {
        is_hidden_id(self.id)
    }

    /// Both input and expected output must carry something besides whitespace
    pub fn is_runnable(&self) -> bool {
        !self.input.trim().is_empty() && !self.expected_output.trim().is_empty()
    }
}

pub fn is_hidden_id(id: u32) -> bool {
    id >= FIRST_HIDDEN_ID
}

/// Source code supplied for one run; never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub language: Language,
    pub source_code: String,
}

impl Submission {
    pub fn new(language: Language, source_code: impl Into<String>) -> Self {
        Self {
            language,
            source_code: source_code.into(),
        }
    }
}

/// A concrete (language, version) pair the execution service can run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDescriptor {
    pub language: String,
    pub version: String,
}

impl RuntimeDescriptor {
    pub fn new(language: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for RuntimeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.language, self.version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub can_access_all: bool,
}

impl AccessPolicy {
    pub fn full() -> Self {
        Self { can_access_all: true }
    }

    pub fn restricted() -> Self {
        Self { can_access_all: false }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStage {
    pub output: String,
    pub exit_code: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStage {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i64>,
    pub signal: Option<String>,
}

/// Normalized reply of the execution service, before any pass/fail judgement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub compile: Option<CompileStage>,
    pub run: Option<RunStage>,
}

/// Failure classes detected by the evaluator on a completed execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CompileError,
    RuntimeError,
}

/// Stored problem state: parallel input/output arrays
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemState {
    #[serde(alias = "questionId")]
    pub question_id: String,
    #[serde(alias = "inputTestCases")]
    pub input_test_cases: Vec<String>,
    #[serde(alias = "outputTestCases")]
    pub output_test_cases: Vec<String>,
}

/// Identity of one harness session, constructed at login and dropped at logout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    /// Anonymous sessions never mark anything solved
    pub user_id: Option<String>,
    pub question_id: String,
    /// Key the access policy is evaluated against
    pub context_id: String,
}

impl SessionContext {
    pub fn new(user_id: Option<String>, question_id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            question_id: question_id.into(),
            context_id: context_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_round_trips_through_display() {
        for language in Language::ALL {
            assert_eq!(language.to_string().parse::<Language>(), Ok(language));
        }
    }

    #[test]
    fn test_language_aliases() {
        assert_eq!("c++".parse::<Language>(), Ok(Language::Cpp));
        assert_eq!("C#".parse::<Language>(), Ok(Language::CSharp));
        assert_eq!(" golang ".parse::<Language>(), Ok(Language::Go));
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_piston_names() {
        assert_eq!(Language::Cpp.piston_name(), "c++");
        assert_eq!(Language::Python.piston_name(), "python");
        assert_eq!(Language::CSharp.piston_name(), "csharp");
    }

    #[test]
    fn test_language_serde_is_lowercase() {
        let json = serde_json::to_string(&Language::JavaScript).unwrap();
        assert_eq!(json, "\"javascript\"");
        let parsed: Language = serde_json::from_str("\"csharp\"").unwrap();
        assert_eq!(parsed, Language::CSharp);
    }

    #[test]
    fn test_hidden_ids() {
        assert!(!is_hidden_id(1));
        assert!(!is_hidden_id(2));
        assert!(is_hidden_id(3));
        assert!(TestCase::new(7, "1", "1", Origin::UserAdded).is_hidden());
    }

    #[test]
    fn test_runnable_requires_input_and_expected() {
        assert!(TestCase::new(1, "1 2", "3", Origin::Database).is_runnable());
        assert!(!TestCase::new(1, "  ", "3", Origin::Database).is_runnable());
        assert!(!TestCase::new(1, "1 2", "\n", Origin::Database).is_runnable());
    }

    #[test]
    fn test_problem_state_accepts_camel_case() {
        let problem: ProblemState = serde_json::from_str(
            r#"{"questionId":"42","inputTestCases":["1 2"],"outputTestCases":["3"]}"#,
        )
        .unwrap();
        assert_eq!(problem.question_id, "42");
        assert_eq!(problem.input_test_cases, vec!["1 2"]);
        assert_eq!(problem.output_test_cases, vec!["3"]);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly-typed language enum
/// Closed set - requests naming anything else are rejected
/// before any call to the execution provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Java,
    Cpp,
    C,
}

impl Language {
    /// Returns all language variants
    /// This is the single source of truth for supported languages
    pub fn all_variants() -> &'static [Language] {
        &[
            Language::Python,
            Language::Javascript,
            Language::Java,
            Language::Cpp,
            Language::C,
        ]
    }

    /// Parse a language from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Language> {
        match s.to_lowercase().as_str() {
            "python" => Some(Language::Python),
            "javascript" | "js" => Some(Language::Javascript),
            "java" => Some(Language::Java),
            "cpp" | "c++" => Some(Language::Cpp),
            "c" => Some(Language::C),
            _ => None,
        }
    }

    /// Source file extension used when shipping code to a provider
    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Javascript => "js",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::Javascript => write!(f, "javascript"),
            Language::Java => write!(f, "java"),
            Language::Cpp => write!(f, "cpp"),
            Language::C => write!(f, "c"),
        }
    }
}

/// Test Case Definition (Immutable Input)
/// Test cases are immutable - the engine must not mutate them
/// Ordering matters - grading is sequential and indices are 1-based
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// One request to the external execution provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub language: Language,
    pub source_code: String,
    pub stdin: String,
}

/// Normalized outcome of a single provider execution
///
/// Every provider shape is flattened into this struct before the
/// grading engine sees it. `stdout` is the raw standard-output text;
/// trimming is a comparison-time policy, never applied here.
/// `stderr` is run-stage error text, falling back to compile-stage
/// error text when the run never happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// True only when the run exit code was 0 AND stderr is empty
    pub succeeded: bool,
    pub timed_out: bool,
    pub compile_failed: bool,
    pub time_ms: u64,
}

/// Verdict for a single test case or an entire submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseVerdict {
    /// Output matched expected output
    Accepted,
    /// Output did not match expected
    WrongAnswer,
    /// Program crashed or exited non-zero
    RuntimeError,
    /// Exceeded the run time limit
    TimeLimitExceeded,
    /// Source failed to compile
    CompilationError,
    /// Judge-side failure (provider unreachable or malformed reply)
    InternalError,
}

impl CaseVerdict {
    /// Get short code for verdict
    pub fn code(&self) -> &'static str {
        match self {
            CaseVerdict::Accepted => "AC",
            CaseVerdict::WrongAnswer => "WA",
            CaseVerdict::RuntimeError => "RE",
            CaseVerdict::TimeLimitExceeded => "TLE",
            CaseVerdict::CompilationError => "CE",
            CaseVerdict::InternalError => "IE",
        }
    }

    /// Execution-failure verdicts halt grading; WrongAnswer does not
    pub fn halts_grading(&self) -> bool {
        matches!(
            self,
            CaseVerdict::RuntimeError
                | CaseVerdict::TimeLimitExceeded
                | CaseVerdict::CompilationError
                | CaseVerdict::InternalError
        )
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, CaseVerdict::Accepted)
    }
}

impl fmt::Display for CaseVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Per-Case Result
/// Captures individual test case grading outcome
/// `expected_output` is only populated for wrong answers so callers
/// can render a side-by-side diff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    /// Test case number (1-indexed)
    pub case_number: u32,
    pub verdict: CaseVerdict,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    pub time_ms: u64,
}

impl CaseResult {
    pub fn accepted(case_number: u32, stdout: String, time_ms: u64) -> Self {
        Self {
            case_number,
            verdict: CaseVerdict::Accepted,
            stdout,
            stderr: String::new(),
            expected_output: None,
            time_ms,
        }
    }

    pub fn wrong_answer(case_number: u32, stdout: String, expected: String, time_ms: u64) -> Self {
        Self {
            case_number,
            verdict: CaseVerdict::WrongAnswer,
            stdout,
            stderr: String::new(),
            expected_output: Some(expected),
            time_ms,
        }
    }

    pub fn failed(case_number: u32, verdict: CaseVerdict, stderr: String, time_ms: u64) -> Self {
        Self {
            case_number,
            verdict,
            stdout: String::new(),
            stderr,
            expected_output: None,
            time_ms,
        }
    }
}

/// Aggregated report for one graded submission
///
/// ## Scoring Semantics:
/// - `passed_count <= total_count` always
/// - `total_count` is the declared number of test cases, even when
///   grading halted early
/// - `overall_verdict` is Accepted iff every declared case passed
/// - attempt counters are carried forward from caller-held session
///   state; the engine itself is stateless across submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub passed_count: u32,
    pub total_count: u32,
    pub per_case: Vec<CaseResult>,
    pub overall_verdict: CaseVerdict,
    /// First failing test case number (if any), 1-indexed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_failed_case: Option<u32>,
    pub attempts_so_far: u32,
    pub correct_attempts_so_far: u32,
    pub accuracy_percent: u32,
    /// Maximum single-case execution time (ms)
    pub max_time_ms: u64,
    /// Wall-clock grading time, rounded to two decimals
    pub elapsed_seconds: f64,
}

//! Error taxonomy shared by the judge engine and its callers.

use thiserror::Error;

/// Errors surfaced by the execution client and grading engine.
///
/// Caller-input errors fail fast before any network call. Execution
/// errors keep the provider failure modes distinguishable so the
/// engine can map a timeout to `TimeLimitExceeded` instead of a
/// generic runtime error.
#[derive(Error, Debug)]
pub enum JudgeError {
    /// Language is not in the supported set
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Test case list is malformed
    #[error("Invalid test cases: {0}")]
    InvalidTestCases(String),

    /// Submitted source is empty or whitespace-only
    #[error("Submission is empty")]
    EmptySubmission,

    /// Submitted source exceeds the size guardrail
    #[error("Submission exceeds maximum size of {limit} bytes")]
    SubmissionTooLarge { limit: usize },

    /// Provider exceeded the allotted time
    #[error("Execution timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Provider could not be reached at all
    #[error("Execution service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Provider replied with an error or malformed payload
    #[error("Execution provider error: {0}")]
    ProviderError(String),
}

impl JudgeError {
    /// Stable machine-readable code for error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            JudgeError::UnsupportedLanguage(_) => "unsupported_language",
            JudgeError::InvalidTestCases(_) => "invalid_test_cases",
            JudgeError::EmptySubmission => "empty_submission",
            JudgeError::SubmissionTooLarge { .. } => "submission_too_large",
            JudgeError::Timeout { .. } => "timeout",
            JudgeError::ServiceUnavailable(_) => "service_unavailable",
            JudgeError::ProviderError(_) => "provider_error",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            JudgeError::UnsupportedLanguage(_) => 400,
            JudgeError::InvalidTestCases(_) => 400,
            JudgeError::EmptySubmission => 400,
            JudgeError::SubmissionTooLarge { .. } => 413,
            JudgeError::Timeout { .. } => 504,
            JudgeError::ServiceUnavailable(_) => 503,
            JudgeError::ProviderError(_) => 502,
        }
    }

    /// True for errors caused by the caller's input rather than the
    /// execution layer
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            JudgeError::UnsupportedLanguage(_)
                | JudgeError::InvalidTestCases(_)
                | JudgeError::EmptySubmission
                | JudgeError::SubmissionTooLarge { .. }
        )
    }
}

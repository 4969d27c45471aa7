// HTTP route handlers for the Arbiter API

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use arbiter_common::error::JudgeError;
use arbiter_common::types::{Language, TestCase};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub stdin: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub language: String,
    pub code: String,
    pub test_cases: Vec<TestCaseInput>,
    #[serde(default)]
    pub prior_attempts: u32,
    #[serde(default)]
    pub prior_correct: u32,
}

/// Test case as posted by the caller; `expected_output` stays
/// optional here so a missing field surfaces as the structured
/// `invalid_test_cases` error instead of a bare deserialization 422
#[derive(Debug, Deserialize)]
pub struct TestCaseInput {
    #[serde(default)]
    pub input: String,
    pub expected_output: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

fn error_response(err: &JudgeError) -> (StatusCode, Json<ErrorBody>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            error: err.error_code(),
            message: err.to_string(),
        }),
    )
}

/// Language arrives as a string; anything outside the supported set
/// is rejected before the engine is touched
fn parse_language(raw: &str) -> Result<Language, JudgeError> {
    Language::from_str(raw).ok_or_else(|| JudgeError::UnsupportedLanguage(raw.to_string()))
}

/// POST /run - Execute code once and return the raw outcome
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunRequest>,
) -> impl IntoResponse {
    let language = match parse_language(&payload.language) {
        Ok(lang) => lang,
        Err(e) => {
            warn!(language = %payload.language, "Rejected run request");
            return error_response(&e).into_response();
        }
    };

    match state
        .engine
        .run_once(language, &payload.code, &payload.stdin)
        .await
    {
        Ok(outcome) => {
            info!(
                language = %language,
                succeeded = outcome.succeeded,
                time_ms = outcome.time_ms,
                "Run completed"
            );
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => {
            warn!(language = %language, error = %e, "Run failed");
            error_response(&e).into_response()
        }
    }
}

/// POST /submit - Grade a submission against its test cases
pub async fn submit_solution(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> impl IntoResponse {
    let language = match parse_language(&payload.language) {
        Ok(lang) => lang,
        Err(e) => {
            warn!(language = %payload.language, "Rejected submission");
            return error_response(&e).into_response();
        }
    };

    let mut test_cases = Vec::with_capacity(payload.test_cases.len());
    for (idx, tc) in payload.test_cases.into_iter().enumerate() {
        match tc.expected_output {
            Some(expected_output) => test_cases.push(TestCase {
                input: tc.input,
                expected_output,
            }),
            None => {
                let e = JudgeError::InvalidTestCases(format!(
                    "test case {} is missing expected_output",
                    idx + 1
                ));
                return error_response(&e).into_response();
            }
        }
    }

    match state
        .engine
        .grade(
            language,
            &payload.code,
            &test_cases,
            payload.prior_attempts,
            payload.prior_correct,
        )
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            warn!(language = %language, error = %e, "Submission rejected");
            error_response(&e).into_response()
        }
    }
}

/// GET /health - Liveness probe
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_accepts_supported_set() {
        assert_eq!(parse_language("python").unwrap(), Language::Python);
        assert_eq!(parse_language("CPP").unwrap(), Language::Cpp);
        assert_eq!(parse_language("c").unwrap(), Language::C);
    }

    #[test]
    fn test_parse_language_rejects_unknown() {
        let err = parse_language("ruby").unwrap_err();
        assert!(matches!(err, JudgeError::UnsupportedLanguage(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_submit_request_deserialization_defaults() {
        let json = r#"{
            "language": "python",
            "code": "print(1)",
            "test_cases": [{"input": "", "expected_output": "1"}]
        }"#;

        let req: SubmitRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.prior_attempts, 0);
        assert_eq!(req.prior_correct, 0);
        assert_eq!(req.test_cases.len(), 1);
    }

    #[test]
    fn test_test_case_missing_expected_output_still_deserializes() {
        // The handler, not serde, turns this into invalid_test_cases
        let json = r#"{"input": "5"}"#;
        let tc: TestCaseInput = serde_json::from_str(json).unwrap();
        assert!(tc.expected_output.is_none());
    }
}

/// Execution Client - Abstraction over External Code Runners
///
/// **Core Responsibility:**
/// Ship untrusted source code to an already-sandboxed execution
/// service and normalize whatever comes back into `ExecutionResult`.
///
/// **Critical Architectural Boundary:**
/// - Providers know HOW code runs (wire shape, auth, endpoints)
/// - Providers do NOT know scoring rules
/// - Providers do NOT compare outputs
/// - The grading engine depends only on the `ExecutionProvider` trait
///
/// **Why This Exists:**
/// Two provider integrations with divergent response shapes coexist
/// (a free public runner and a paid alternative). Normalizing both
/// behind one trait is the seam at which a new provider can be
/// substituted without touching the grading engine.
use arbiter_common::error::JudgeError;
use arbiter_common::types::{ExecutionRequest, ExecutionResult, Language};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::{Config, ProviderKind};

/// Extra wall-clock slack on top of the provider-side limits before
/// the HTTP call itself is abandoned
const HTTP_TIMEOUT_SLACK_MS: u64 = 2_000;

/// A single execution against an external provider.
///
/// Exactly one outbound network call per invocation; transient
/// failures are surfaced, never retried. Retrying silently would
/// re-run untrusted code with side effects the caller never asked
/// to repeat.
#[async_trait]
pub trait ExecutionProvider: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError>;
}

/// Build the configured provider
pub fn build_provider(config: &Config) -> Arc<dyn ExecutionProvider> {
    match config.provider {
        ProviderKind::Piston => Arc::new(PistonProvider::new(
            config.provider_url.clone(),
            config.compile_timeout_ms,
            config.run_timeout_ms,
        )),
        ProviderKind::OneCompiler => Arc::new(OneCompilerProvider::new(
            config.provider_url.clone(),
            config.provider_api_key.clone().unwrap_or_default(),
            config.run_timeout_ms,
        )),
    }
}

/// Map a transport-level failure onto the judge error taxonomy.
/// Timeouts must stay distinguishable so the engine can report
/// TimeLimitExceeded instead of a generic runtime error.
fn map_transport_error(e: reqwest::Error, timeout_ms: u64) -> JudgeError {
    if e.is_timeout() {
        JudgeError::Timeout { timeout_ms }
    } else if e.is_connect() {
        JudgeError::ServiceUnavailable(e.to_string())
    } else {
        JudgeError::ProviderError(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Piston (free public multi-language runner)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PistonFile {
    name: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct PistonRequest {
    language: String,
    version: String,
    files: Vec<PistonFile>,
    stdin: String,
    args: Vec<String>,
    compile_timeout: u64,
    run_timeout: u64,
    compile_memory_limit: i64,
    run_memory_limit: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct PistonStage {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    pub code: Option<i64>,
    pub signal: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PistonResponse {
    pub run: Option<PistonStage>,
    pub compile: Option<PistonStage>,
}

pub struct PistonProvider {
    client: reqwest::Client,
    base_url: String,
    compile_timeout_ms: u64,
    run_timeout_ms: u64,
}

impl PistonProvider {
    pub fn new(base_url: String, compile_timeout_ms: u64, run_timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            compile_timeout_ms,
            run_timeout_ms,
        }
    }

    /// Piston language name and pinned runtime version
    fn runtime(language: Language) -> (&'static str, &'static str) {
        match language {
            Language::Python => ("python", "3.10.0"),
            Language::Javascript => ("javascript", "18.15.0"),
            Language::Java => ("java", "15.0.2"),
            Language::Cpp => ("c++", "10.2.0"),
            Language::C => ("c", "10.2.0"),
        }
    }

    fn source_file_name(language: Language) -> String {
        match language {
            // javac insists the public class file is named Main
            Language::Java => "Main.java".to_string(),
            other => format!("main.{}", other.file_extension()),
        }
    }
}

/// Flatten a Piston response into the uniform execution outcome.
///
/// Compile stage errors take precedence: if the compile stage exited
/// non-zero the run stage never meaningfully happened, and its stderr
/// becomes the surfaced error text.
pub fn normalize_piston(resp: PistonResponse, time_ms: u64) -> Result<ExecutionResult, JudgeError> {
    if let Some(compile) = &resp.compile {
        if compile.code.map(|c| c != 0).unwrap_or(false) {
            return Ok(ExecutionResult {
                stdout: String::new(),
                stderr: compile.stderr.clone(),
                succeeded: false,
                timed_out: false,
                compile_failed: true,
                time_ms,
            });
        }
    }

    let run = match resp.run {
        Some(run) => run,
        None => {
            return Err(JudgeError::ProviderError(
                "response missing run stage".to_string(),
            ))
        }
    };

    // Piston kills over-limit runs with SIGKILL and reports no exit code
    let timed_out = run.signal.as_deref() == Some("SIGKILL");

    // Compile-stage stderr (warnings) must not taint a clean run; only
    // borrow it as diagnostic text when the run itself failed silently
    let run_failed = run.code != Some(0) && !timed_out;
    let stderr = if run.stderr.is_empty() && run_failed {
        resp.compile.map(|c| c.stderr).unwrap_or_default()
    } else {
        run.stderr
    };

    let succeeded = run.code == Some(0) && stderr.is_empty() && !timed_out;

    Ok(ExecutionResult {
        stdout: run.stdout,
        stderr,
        succeeded,
        timed_out,
        compile_failed: false,
        time_ms,
    })
}

#[async_trait]
impl ExecutionProvider for PistonProvider {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError> {
        let (language, version) = Self::runtime(request.language);

        let payload = PistonRequest {
            language: language.to_string(),
            version: version.to_string(),
            files: vec![PistonFile {
                name: Self::source_file_name(request.language),
                content: request.source_code.clone(),
            }],
            stdin: request.stdin.clone(),
            args: Vec::new(),
            compile_timeout: self.compile_timeout_ms,
            run_timeout: self.run_timeout_ms,
            compile_memory_limit: -1,
            run_memory_limit: -1,
        };

        let total_budget_ms = self.compile_timeout_ms + self.run_timeout_ms + HTTP_TIMEOUT_SLACK_MS;
        let url = format!("{}/execute", self.base_url.trim_end_matches('/'));

        debug!(language = %request.language, url = %url, "Dispatching execution to Piston");

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(total_budget_ms))
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_transport_error(e, total_budget_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Piston rejected execution request");
            return Err(JudgeError::ProviderError(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: PistonResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::ProviderError(format!("malformed provider payload: {}", e)))?;

        normalize_piston(parsed, started.elapsed().as_millis() as u64)
    }
}

// ---------------------------------------------------------------------------
// OneCompiler (paid alternative, flat response shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OneCompilerFile {
    name: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OneCompilerRequest {
    language: String,
    stdin: String,
    files: Vec<OneCompilerFile>,
}

#[derive(Debug, Deserialize)]
pub struct OneCompilerResponse {
    pub status: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exception: Option<String>,
    #[serde(rename = "executionTime")]
    pub execution_time: Option<u64>,
}

pub struct OneCompilerProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    run_timeout_ms: u64,
}

impl OneCompilerProvider {
    pub fn new(base_url: String, api_key: String, run_timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            run_timeout_ms,
        }
    }

    fn language_name(language: Language) -> &'static str {
        match language {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }
}

/// Flatten a OneCompiler response into the uniform execution outcome.
/// The flat shape folds compile diagnostics into `stderr` and runtime
/// crashes into `exception`, so `exception` becomes the stderr
/// fallback here.
pub fn normalize_onecompiler(resp: OneCompilerResponse, fallback_time_ms: u64) -> ExecutionResult {
    let timed_out = resp.status.as_deref() == Some("timeout");

    let stderr = match (resp.stderr, resp.exception) {
        (Some(stderr), _) if !stderr.is_empty() => stderr,
        (_, Some(exception)) if !exception.is_empty() => exception,
        _ => String::new(),
    };

    let succeeded = resp.status.as_deref() == Some("success") && stderr.is_empty() && !timed_out;

    ExecutionResult {
        stdout: resp.stdout.unwrap_or_default(),
        stderr,
        succeeded,
        timed_out,
        compile_failed: false,
        time_ms: resp.execution_time.unwrap_or(fallback_time_ms),
    }
}

#[async_trait]
impl ExecutionProvider for OneCompilerProvider {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError> {
        let language = Self::language_name(request.language);

        let payload = OneCompilerRequest {
            language: language.to_string(),
            stdin: request.stdin.clone(),
            files: vec![OneCompilerFile {
                name: format!("main.{}", request.language.file_extension()),
                content: request.source_code.clone(),
            }],
        };

        let total_budget_ms = self.run_timeout_ms + HTTP_TIMEOUT_SLACK_MS;
        let url = format!("{}/run", self.base_url.trim_end_matches('/'));

        debug!(language = %request.language, url = %url, "Dispatching execution to OneCompiler");

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(total_budget_ms))
            .header("X-API-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_transport_error(e, total_budget_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "OneCompiler rejected execution request");
            return Err(JudgeError::ProviderError(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: OneCompilerResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::ProviderError(format!("malformed provider payload: {}", e)))?;

        Ok(normalize_onecompiler(
            parsed,
            started.elapsed().as_millis() as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_piston_success() {
        let resp: PistonResponse = serde_json::from_str(
            r#"{"run": {"stdout": "42\n", "stderr": "", "code": 0, "signal": null}}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 120).unwrap();
        assert!(result.succeeded);
        assert_eq!(result.stdout, "42\n");
        assert!(!result.timed_out);
        assert!(!result.compile_failed);
        assert_eq!(result.time_ms, 120);
    }

    #[test]
    fn test_normalize_piston_stdout_is_not_trimmed() {
        let resp: PistonResponse = serde_json::from_str(
            r#"{"run": {"stdout": "  hello  \n", "stderr": "", "code": 0, "signal": null}}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 10).unwrap();
        assert_eq!(result.stdout, "  hello  \n");
    }

    #[test]
    fn test_normalize_piston_runtime_error() {
        let resp: PistonResponse = serde_json::from_str(
            r#"{"run": {"stdout": "", "stderr": "ZeroDivisionError: division by zero", "code": 1, "signal": null},
                "compile": {"stdout": "", "stderr": "", "code": 0, "signal": null}}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 15).unwrap();
        assert!(!result.succeeded);
        assert!(!result.compile_failed);
        assert!(result.stderr.contains("ZeroDivisionError"));
    }

    #[test]
    fn test_normalize_piston_nonzero_exit_with_empty_stderr_fails() {
        let resp: PistonResponse = serde_json::from_str(
            r#"{"run": {"stdout": "partial", "stderr": "", "code": 139, "signal": null}}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 15).unwrap();
        assert!(!result.succeeded);
    }

    #[test]
    fn test_normalize_piston_stderr_forces_failure_despite_exit_zero() {
        // Noise on stderr makes the outcome non-successful even if the
        // program exited cleanly
        let resp: PistonResponse = serde_json::from_str(
            r#"{"run": {"stdout": "ok", "stderr": "warning: deprecated", "code": 0, "signal": null}}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 15).unwrap();
        assert!(!result.succeeded);
        assert_eq!(result.stdout, "ok");
    }

    #[test]
    fn test_normalize_piston_compile_warning_does_not_taint_clean_run() {
        // gcc warnings land on the compile stage's stderr; a run that
        // then exits 0 with clean stderr is still a success
        let resp: PistonResponse = serde_json::from_str(
            r#"{"compile": {"stdout": "", "stderr": "warning: unused variable 'x'", "code": 0, "signal": null},
                "run": {"stdout": "42\n", "stderr": "", "code": 0, "signal": null}}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 200).unwrap();
        assert!(result.succeeded);
        assert_eq!(result.stdout, "42\n");
        assert_eq!(result.stderr, "");
        assert!(!result.compile_failed);
    }

    #[test]
    fn test_normalize_piston_failed_run_borrows_compile_stderr() {
        // A silent non-zero exit still surfaces compile diagnostics
        let resp: PistonResponse = serde_json::from_str(
            r#"{"compile": {"stdout": "", "stderr": "warning: implicit declaration of 'foo'", "code": 0, "signal": null},
                "run": {"stdout": "", "stderr": "", "code": 1, "signal": null}}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 50).unwrap();
        assert!(!result.succeeded);
        assert!(result.stderr.contains("implicit declaration"));
    }

    #[test]
    fn test_normalize_piston_compile_error() {
        let resp: PistonResponse = serde_json::from_str(
            r#"{"compile": {"stdout": "", "stderr": "main.cpp:3: error: expected ';'", "code": 1, "signal": null},
                "run": null}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 800).unwrap();
        assert!(result.compile_failed);
        assert!(!result.succeeded);
        assert!(result.stderr.contains("expected ';'"));
    }

    #[test]
    fn test_normalize_piston_sigkill_is_timeout() {
        let resp: PistonResponse = serde_json::from_str(
            r#"{"run": {"stdout": "", "stderr": "", "code": null, "signal": "SIGKILL"},
                "compile": {"stdout": "", "stderr": "", "code": 0, "signal": null}}"#,
        )
        .unwrap();

        let result = normalize_piston(resp, 3000).unwrap();
        assert!(result.timed_out);
        assert!(!result.succeeded);
        assert!(!result.compile_failed);
    }

    #[test]
    fn test_normalize_piston_missing_run_stage_is_provider_error() {
        let resp: PistonResponse = serde_json::from_str(r#"{"run": null, "compile": null}"#).unwrap();

        let err = normalize_piston(resp, 0).unwrap_err();
        assert!(matches!(err, JudgeError::ProviderError(_)));
    }

    #[test]
    fn test_normalize_onecompiler_success() {
        let resp: OneCompilerResponse = serde_json::from_str(
            r#"{"status": "success", "stdout": "42\n", "stderr": null, "exception": null, "executionTime": 37}"#,
        )
        .unwrap();

        let result = normalize_onecompiler(resp, 0);
        assert!(result.succeeded);
        assert_eq!(result.stdout, "42\n");
        assert_eq!(result.time_ms, 37);
    }

    #[test]
    fn test_normalize_onecompiler_exception_becomes_stderr() {
        let resp: OneCompilerResponse = serde_json::from_str(
            r#"{"status": "failed", "stdout": "", "stderr": null, "exception": "NullPointerException", "executionTime": 12}"#,
        )
        .unwrap();

        let result = normalize_onecompiler(resp, 0);
        assert!(!result.succeeded);
        assert_eq!(result.stderr, "NullPointerException");
    }

    #[test]
    fn test_normalize_onecompiler_timeout_status() {
        let resp: OneCompilerResponse = serde_json::from_str(
            r#"{"status": "timeout", "stdout": "", "stderr": null, "exception": null, "executionTime": null}"#,
        )
        .unwrap();

        let result = normalize_onecompiler(resp, 3000);
        assert!(result.timed_out);
        assert!(!result.succeeded);
        assert_eq!(result.time_ms, 3000);
    }

    #[test]
    fn test_piston_runtime_naming() {
        assert_eq!(PistonProvider::runtime(Language::Cpp).0, "c++");
        assert_eq!(PistonProvider::runtime(Language::Python).0, "python");
        assert_eq!(PistonProvider::source_file_name(Language::Java), "Main.java");
        assert_eq!(PistonProvider::source_file_name(Language::Cpp), "main.cpp");
    }
}

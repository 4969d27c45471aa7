/// Grading Engine - High-Level Orchestration
///
/// **Responsibility:**
/// Coordinate the execution provider and evaluator to produce
/// submission reports.
///
/// **Architecture:**
/// 1. Validate caller input (fail fast, zero network calls)
/// 2. Use an `ExecutionProvider` to run code (provider.rs)
/// 3. Use the evaluator to derive verdicts (evaluator.rs)
/// 4. Aggregate into a `SubmissionReport`
///
/// This module is the glue layer - it knows nothing about:
/// - Provider wire shapes (provider's job)
/// - Comparison rules (evaluator's job)
///
/// **Execution Semantics:**
/// - Test cases run strictly sequentially, in declared order
/// - An execution failure (crash, timeout, compile error) halts the
///   loop; a wrong answer does not
/// - Every grading call performs fresh executions - results are never
///   cached across submissions or test cases, since submitted code may
///   be non-deterministic or stateful
use arbiter_common::error::JudgeError;
use arbiter_common::types::{
    CaseResult, CaseVerdict, ExecutionRequest, ExecutionResult, Language, SubmissionReport,
    TestCase,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::MAX_SOURCE_CODE_BYTES;
use crate::evaluator;
use crate::provider::ExecutionProvider;

pub struct JudgeEngine {
    provider: Arc<dyn ExecutionProvider>,
}

impl JudgeEngine {
    pub fn new(provider: Arc<dyn ExecutionProvider>) -> Self {
        Self { provider }
    }

    /// Ad-hoc "compile & run" - no verdict, no scoring effect
    ///
    /// The raw outcome goes back to the caller for display; any
    /// side-by-side comparison against a sample case is a rendering
    /// concern, never a grading one.
    #[instrument(skip(self, source_code), fields(language = %language))]
    pub async fn run_once(
        &self,
        language: Language,
        source_code: &str,
        stdin: &str,
    ) -> Result<ExecutionResult, JudgeError> {
        validate_source(source_code)?;

        let request = ExecutionRequest {
            language,
            source_code: source_code.to_string(),
            stdin: stdin.to_string(),
        };

        let outcome = self.provider.execute(&request).await?;

        debug!(
            succeeded = outcome.succeeded,
            timed_out = outcome.timed_out,
            time_ms = outcome.time_ms,
            "Single run completed"
        );

        Ok(outcome)
    }

    /// Grade a submission against its test cases
    ///
    /// Attempt counters are carried forward from caller-held state;
    /// the engine itself holds nothing between calls. The
    /// first-correct-attempt bonus rule is the caller's to apply -
    /// `attempts_so_far == correct_attempts_so_far == 1` at the
    /// accepted moment is the signal it needs.
    #[instrument(
        skip(self, source_code, test_cases),
        fields(language = %language, test_count = test_cases.len())
    )]
    pub async fn grade(
        &self,
        language: Language,
        source_code: &str,
        test_cases: &[TestCase],
        prior_attempts: u32,
        prior_correct: u32,
    ) -> Result<SubmissionReport, JudgeError> {
        validate_source(source_code)?;
        if test_cases.is_empty() {
            return Err(JudgeError::InvalidTestCases(
                "at least one test case is required".to_string(),
            ));
        }

        let submission_id = Uuid::new_v4();
        let started = Instant::now();

        info!(
            submission_id = %submission_id,
            language = %language,
            test_cases = test_cases.len(),
            source_size = source_code.len(),
            "Grading submission"
        );

        let mut per_case = Vec::with_capacity(test_cases.len());

        for (idx, test_case) in test_cases.iter().enumerate() {
            let case_number = (idx + 1) as u32;

            let request = ExecutionRequest {
                language,
                source_code: source_code.to_string(),
                stdin: test_case.input.clone(),
            };

            let outcome = match self.provider.execute(&request).await {
                Ok(outcome) => outcome,
                // A timeout is a property of the submission, not of the
                // judge - it maps to a TLE verdict on this case
                Err(JudgeError::Timeout { timeout_ms }) => ExecutionResult {
                    stdout: String::new(),
                    stderr: format!("Execution timed out after {}ms", timeout_ms),
                    succeeded: false,
                    timed_out: true,
                    compile_failed: false,
                    time_ms: timeout_ms,
                },
                Err(e) if idx == 0 && matches!(e, JudgeError::ServiceUnavailable(_)) => {
                    // Provider unreachable before anything ran - no
                    // partial report is meaningful yet
                    warn!(submission_id = %submission_id, error = %e, "Provider unreachable on first case");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        submission_id = %submission_id,
                        case = case_number,
                        error = %e,
                        "Execution failed mid-grading"
                    );
                    per_case.push(CaseResult::failed(
                        case_number,
                        CaseVerdict::InternalError,
                        e.to_string(),
                        0,
                    ));
                    break;
                }
            };

            let result = evaluator::evaluate_case(case_number, &outcome, test_case);
            let verdict = result.verdict;

            debug!(
                submission_id = %submission_id,
                case = case_number,
                verdict = %verdict,
                time_ms = result.time_ms,
                "Case graded"
            );

            per_case.push(result);

            // Short-circuit on execution failure: a crash on case N
            // leaves cases N+1.. unevaluated under the same harness.
            // A wrong answer is a normal outcome and grading continues.
            if verdict.halts_grading() {
                warn!(
                    submission_id = %submission_id,
                    case = case_number,
                    verdict = %verdict,
                    "Halting grading on execution failure"
                );
                break;
            }
        }

        let report = evaluator::build_report(
            per_case,
            test_cases.len() as u32,
            prior_attempts,
            prior_correct,
            started.elapsed(),
        );

        info!(
            submission_id = %submission_id,
            verdict = %report.overall_verdict,
            passed = report.passed_count,
            total = report.total_count,
            elapsed_seconds = report.elapsed_seconds,
            "Grading completed"
        );

        Ok(report)
    }
}

/// Caller-input guardrails, checked before any network call
fn validate_source(source_code: &str) -> Result<(), JudgeError> {
    if source_code.trim().is_empty() {
        return Err(JudgeError::EmptySubmission);
    }
    if source_code.len() > MAX_SOURCE_CODE_BYTES {
        return Err(JudgeError::SubmissionTooLarge {
            limit: MAX_SOURCE_CODE_BYTES,
        });
    }
    Ok(())
}

/// Output Evaluator - Language-Agnostic Verdict Logic
///
/// **Core Responsibility:**
/// Compare normalized execution outcomes against expected outputs and
/// assign verdicts, then aggregate per-case verdicts into a
/// `SubmissionReport`.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP
/// - Knows nothing about providers
/// - Pure functions: (execution outcome, test case) → verdict
///
/// **Normalization Rules (Applied to All Languages):**
/// - Trim leading whitespace: YES
/// - Trim trailing whitespace: YES
/// - Internal whitespace and newlines: significant, must match exactly
/// - Case sensitivity: YES (exact match required)
/// - Floating-point tolerance: NO
use arbiter_common::types::{
    CaseResult, CaseVerdict, ExecutionResult, SubmissionReport, TestCase,
};

/// Normalize output string for comparison
///
/// Trims the whitespace edges only. Internal whitespace, empty lines
/// and case are preserved - "15\n 5" never matches "15\n5".
pub fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Derive the verdict for a single test case
///
/// Priority order:
/// 1. Compilation failure
/// 2. Timeout
/// 3. Runtime error (non-zero exit or stderr noise)
/// 4. Output comparison
pub fn evaluate_case(case_number: u32, outcome: &ExecutionResult, case: &TestCase) -> CaseResult {
    if outcome.compile_failed {
        return CaseResult::failed(
            case_number,
            CaseVerdict::CompilationError,
            outcome.stderr.clone(),
            outcome.time_ms,
        );
    }
    if outcome.timed_out {
        return CaseResult::failed(
            case_number,
            CaseVerdict::TimeLimitExceeded,
            outcome.stderr.clone(),
            outcome.time_ms,
        );
    }
    if !outcome.succeeded {
        return CaseResult::failed(
            case_number,
            CaseVerdict::RuntimeError,
            outcome.stderr.clone(),
            outcome.time_ms,
        );
    }

    let actual = normalize_output(&outcome.stdout);
    let expected = normalize_output(&case.expected_output);

    if actual == expected {
        CaseResult::accepted(case_number, outcome.stdout.clone(), outcome.time_ms)
    } else {
        CaseResult::wrong_answer(
            case_number,
            outcome.stdout.clone(),
            case.expected_output.clone(),
            outcome.time_ms,
        )
    }
}

/// Round to two decimal places for the report's elapsed field
pub fn round_elapsed_seconds(elapsed: std::time::Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

/// Accuracy as a whole percentage of correct attempts over attempts
pub fn accuracy_percent(correct_attempts: u32, attempts: u32) -> u32 {
    if attempts == 0 {
        return 0;
    }
    ((100.0 * correct_attempts as f64) / attempts as f64).round() as u32
}

/// Aggregate per-case results into the final submission report
///
/// `total_count` is the declared number of test cases - when grading
/// halted early, `per_case` is shorter than `total_count` and the
/// shortfall correctly signals incompleteness. The overall verdict is
/// Accepted only when every declared case passed; otherwise it is the
/// first failing case's verdict.
pub fn build_report(
    per_case: Vec<CaseResult>,
    total_count: u32,
    prior_attempts: u32,
    prior_correct: u32,
    elapsed: std::time::Duration,
) -> SubmissionReport {
    let passed_count = per_case
        .iter()
        .filter(|r| r.verdict == CaseVerdict::Accepted)
        .count() as u32;

    let first_failure = per_case.iter().find(|r| r.verdict.is_failure());
    let first_failed_case = first_failure.map(|r| r.case_number);

    let overall_verdict = if passed_count == total_count {
        CaseVerdict::Accepted
    } else {
        first_failure
            .map(|r| r.verdict)
            .unwrap_or(CaseVerdict::InternalError)
    };

    let max_time_ms = per_case.iter().map(|r| r.time_ms).max().unwrap_or(0);

    let attempts_so_far = prior_attempts + 1;
    let correct_attempts_so_far = if overall_verdict == CaseVerdict::Accepted {
        prior_correct + 1
    } else {
        prior_correct
    };

    SubmissionReport {
        passed_count,
        total_count,
        per_case,
        overall_verdict,
        first_failed_case,
        attempts_so_far,
        correct_attempts_so_far,
        accuracy_percent: accuracy_percent(correct_attempts_so_far, attempts_so_far),
        max_time_ms,
        elapsed_seconds: round_elapsed_seconds(elapsed),
    }
}

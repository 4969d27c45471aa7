// CLI commands for driving a running Arbiter instance
use anyhow::{bail, Context, Result};
use arbiter_common::types::{CaseVerdict, ExecutionResult, SubmissionReport, TestCase};
use serde_json::json;
use std::fs;

/// Run a source file once and print the raw execution outcome
pub async fn run(file: &str, language: &str, stdin_file: Option<&str>, api_url: &str) -> Result<()> {
    let code = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
    let stdin = match stdin_file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?
        }
        None => String::new(),
    };

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/run", api_url.trim_end_matches('/')))
        .json(&json!({
            "language": language,
            "code": code,
            "stdin": stdin,
        }))
        .send()
        .await
        .context("Failed to reach judge API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("Judge rejected the run ({}): {}", status, body);
    }

    let outcome: ExecutionResult = response
        .json()
        .await
        .context("Failed to parse run response")?;

    if outcome.succeeded {
        println!("✓ Run succeeded in {}ms", outcome.time_ms);
    } else if outcome.timed_out {
        println!("✗ Timed out after {}ms", outcome.time_ms);
    } else if outcome.compile_failed {
        println!("✗ Compilation failed");
    } else {
        println!("✗ Run failed");
    }

    if !outcome.stdout.is_empty() {
        println!();
        println!("stdout:");
        print!("{}", outcome.stdout);
        if !outcome.stdout.ends_with('\n') {
            println!();
        }
    }
    if !outcome.stderr.is_empty() {
        println!();
        println!("stderr:");
        print!("{}", outcome.stderr);
        if !outcome.stderr.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}

/// Cases the judge never ran after a halting failure. Saturating, so a
/// server reporting more per-case entries than `total_count` cannot
/// panic the client.
fn skipped_case_count(report: &SubmissionReport) -> usize {
    (report.total_count as usize).saturating_sub(report.per_case.len())
}

/// Grade a source file against a test-case JSON file and print the report
pub async fn submit(
    file: &str,
    language: &str,
    tests: &str,
    attempts: u32,
    correct: u32,
    api_url: &str,
) -> Result<()> {
    let code = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
    let tests_raw =
        fs::read_to_string(tests).with_context(|| format!("Failed to read {}", tests))?;
    let test_cases: Vec<TestCase> =
        serde_json::from_str(&tests_raw).context("Test file must be a JSON array of {input, expected_output} objects")?;

    println!("→ Submitting {} against {} test cases", file, test_cases.len());
    println!();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/submit", api_url.trim_end_matches('/')))
        .json(&json!({
            "language": language,
            "code": code,
            "test_cases": test_cases,
            "prior_attempts": attempts,
            "prior_correct": correct,
        }))
        .send()
        .await
        .context("Failed to reach judge API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("Judge rejected the submission ({}): {}", status, body);
    }

    let report: SubmissionReport = response
        .json()
        .await
        .context("Failed to parse submission report")?;

    for case in &report.per_case {
        match case.verdict {
            CaseVerdict::Accepted => {
                println!("  Test {} → {} ({}ms)", case.case_number, case.verdict, case.time_ms);
            }
            CaseVerdict::WrongAnswer => {
                println!("  Test {} → {}", case.case_number, case.verdict);
                if let Some(expected) = &case.expected_output {
                    println!("    Expected: {:?}", expected.trim());
                    println!("    Got:      {:?}", case.stdout.trim());
                }
            }
            _ => {
                println!("  Test {} → {}", case.case_number, case.verdict);
                if !case.stderr.is_empty() {
                    println!("    {}", case.stderr.lines().next().unwrap_or(""));
                }
            }
        }
    }

    let skipped = skipped_case_count(&report);
    if skipped > 0 {
        println!("  ({} case(s) not run after the failure above)", skipped);
    }

    println!();
    println!(
        "→ Verdict: {} ({}/{} passed, {:.2}s)",
        report.overall_verdict, report.passed_count, report.total_count, report.elapsed_seconds
    );
    if let Some(first) = report.first_failed_case {
        println!("  First failure on test case {}", first);
    }
    println!(
        "  Attempts: {} ({} correct, {}% accuracy)",
        report.attempts_so_far, report.correct_attempts_so_far, report.accuracy_percent
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_common::types::CaseResult;

    fn report_with(total_count: u32, per_case: Vec<CaseResult>) -> SubmissionReport {
        SubmissionReport {
            passed_count: 0,
            total_count,
            per_case,
            overall_verdict: CaseVerdict::RuntimeError,
            first_failed_case: Some(1),
            attempts_so_far: 1,
            correct_attempts_so_far: 0,
            accuracy_percent: 0,
            max_time_ms: 10,
            elapsed_seconds: 0.01,
        }
    }

    #[test]
    fn test_skipped_cases_after_halt() {
        let report = report_with(
            5,
            vec![CaseResult::failed(
                1,
                CaseVerdict::RuntimeError,
                "boom".to_string(),
                10,
            )],
        );
        assert_eq!(skipped_case_count(&report), 4);
    }

    #[test]
    fn test_skipped_cases_never_underflows() {
        // A misbehaving server may report fewer total cases than it ran
        let report = report_with(
            1,
            vec![
                CaseResult::accepted(1, "a\n".to_string(), 5),
                CaseResult::accepted(2, "b\n".to_string(), 5),
            ],
        );
        assert_eq!(skipped_case_count(&report), 0);
    }
}

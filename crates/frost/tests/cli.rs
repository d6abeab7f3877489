//! End-to-end tests against the demo test binary.
//!
//! All harness output goes to stderr; stdout carries only `--help` and
//! `--version`. The demo binary registers 13 tests across five suites,
//! of which the `failing` and `slow` suites fail by design.

use assert_cmd::Command;
use predicates::prelude::*;

fn demo() -> Command {
    let mut cmd = Command::cargo_bin("frost-demo").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_passing_suites_succeed() {
    demo()
        .args(["math", "text", "sync"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Testing suite math:"))
        .stderr(predicate::str::contains("✓ Success: add_small"))
        .stderr(predicate::str::contains("Suite math: Passed 3/3 tests."))
        .stderr(predicate::str::contains("Suite text: Passed 2/2 tests."))
        .stderr(predicate::str::contains("Suite sync: Passed 2/2 tests."))
        .stderr(predicate::str::contains("Total: Passed 7/7 tests."));
}

#[test]
fn test_suites_run_in_registration_order() {
    let output = demo().output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    let positions: Vec<_> = ["math", "text", "sync", "failing", "slow"]
        .iter()
        .map(|name| {
            stderr
                .find(&format!("Testing suite {name}:"))
                .unwrap_or_else(|| panic!("missing banner for suite {name}"))
        })
        .collect();

    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn test_suite_name_matches_exactly() {
    // a prefix of a suite name selects nothing
    demo()
        .arg("mat")
        .assert()
        .success()
        .stderr(predicate::str::contains("Testing suite").not())
        .stderr(predicate::str::contains("Total: Passed 0/0 tests."));
}

#[test]
fn test_glob_selects_matching_tests() {
    demo()
        .arg("math:add_*")
        .assert()
        .success()
        .stderr(predicate::str::contains("add_small"))
        .stderr(predicate::str::contains("add_overflow"))
        .stderr(predicate::str::contains("mul_identity").not())
        .stderr(predicate::str::contains("Total: Passed 2/2 tests."));
}

#[test]
fn test_glob_character_class() {
    demo()
        .arg("math:mul_identit[xy]")
        .assert()
        .success()
        .stderr(predicate::str::contains("mul_identity"))
        .stderr(predicate::str::contains("Total: Passed 1/1 tests."));
}

#[test]
fn test_malformed_glob_is_fatal() {
    demo()
        .arg("math:[ab")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Fatal error"))
        .stderr(predicate::str::contains("Testing suite").not());
}

#[test]
fn test_assertion_failure() {
    demo()
        .arg("failing:assert_small")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("✕ Failure: assert_small"))
        .stderr(predicate::str::contains("Expected 1 + 1 to equal 3"))
        .stderr(predicate::str::contains("Total: Passed 0/1 tests."));
}

#[test]
fn test_unexpected_exit_code_is_reported() {
    demo()
        .arg("failing:exit_code")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Process exited with code 3."));
}

#[test]
fn test_sentinel_exit_code_prints_no_extra_line() {
    // 255 is indistinguishable from an assertion failure, so the
    // orchestrator stays quiet about it
    demo()
        .arg("failing:exit_sentinel")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("✕ Failure: exit_sentinel"))
        .stderr(predicate::str::contains("exited with code").not());
}

#[test]
fn test_error_trace_is_printed() {
    demo()
        .arg("failing:trace_code")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("but got code 42"))
        .stderr(predicate::str::contains("flux capacitor offline"));
}

#[test]
fn test_panicking_test_fails() {
    demo()
        .arg("failing:panic")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("boom"))
        .stderr(predicate::str::contains("✕ Failure: panic"));
}

#[test]
fn test_any_failure_fails_the_run() {
    demo()
        .args(["math", "failing:exit_code"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Suite math: Passed 3/3 tests."))
        .stderr(predicate::str::contains("Total: Passed 3/4 tests."));
}

#[test]
fn test_timeout_kills_the_test() {
    demo()
        .arg("slow")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Process timed out after"))
        .stderr(predicate::str::contains("✕ Failure: quick_nap"));
}

#[test]
fn test_no_timeout_lets_slow_tests_finish() {
    demo()
        .args(["--no-timeout", "slow"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Total: Passed 1/1 tests."));
}

#[test]
fn test_multithreaded_suite_passes() {
    demo()
        .arg("sync")
        .assert()
        .success()
        .stderr(predicate::str::contains("barrier_rounds"))
        .stderr(predicate::str::contains("thread_indices"))
        .stderr(predicate::str::contains("Total: Passed 2/2 tests."));
}

#[test]
fn test_list_prints_all_suites() {
    demo()
        .arg("--list")
        .assert()
        .success()
        .stderr(predicate::str::contains("math: 3 tests"))
        .stderr(predicate::str::contains("text: 2 tests"))
        .stderr(predicate::str::contains("sync: 2 tests"))
        .stderr(predicate::str::contains("failing: 5 tests"))
        .stderr(predicate::str::contains("slow: 1 tests"))
        .stderr(predicate::str::contains("Total: 13 tests."));
}

#[test]
fn test_list_ignores_patterns() {
    demo()
        .args(["--list", "math"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Total: 13 tests."));
}

#[test]
fn test_version_flag() {
    demo()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("frost"));
}

#[test]
fn test_version_takes_precedence_over_list() {
    demo()
        .args(["--list", "--version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("frost"))
        .stderr(predicate::str::contains("Test suites").not());
}

#[test]
fn test_help_documents_the_modes() {
    demo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--debug"))
        .stdout(predicate::str::contains("--no-timeout"))
        .stdout(predicate::str::contains("--list"));
}

#[test]
fn test_debug_without_match_is_fatal() {
    demo()
        .args(["--debug", "nosuch"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Fatal error: no test found for pattern: nosuch.",
        ));
}

//! Outcome classification of an assistant run.
//!
//! Exit code 0 alone does not mean the fix landed: the assistant may finish
//! cleanly while asking a human for help. Output is scanned (case-insensitive,
//! stdout and stderr together) in a fixed order: any success phrase wins,
//! otherwise any blocking phrase marks the run blocked.

use crate::progress::ProgressStatus;

pub const SUCCESS_PHRASES: &[&str] = &[
    "committed",
    "pushed",
    "pull request created",
    "pr created",
    "successfully fixed",
    "fix applied",
    "changes committed",
];

pub const BLOCKING_PHRASES: &[&str] = &[
    "cannot read",
    "cannot access",
    "permission denied",
    "i need you to",
    "manually edit",
    "could you please",
    "tell me what's on line",
    "which approach would you prefer",
    "please",
    "i cannot",
    "blocked",
    "manual intervention",
    "human intervention",
    "requires manual",
    "needs manual",
];

pub fn is_blocked(stdout: &str, stderr: &str) -> bool {
    let output = format!("{stdout} {stderr}").to_lowercase();
    if SUCCESS_PHRASES.iter().any(|p| output.contains(p)) {
        return false;
    }
    BLOCKING_PHRASES.iter().any(|p| output.contains(p))
}

/// Terminal status of a finished run.
pub fn classify(exit_code: i32, stdout: &str, stderr: &str) -> ProgressStatus {
    if is_blocked(stdout, stderr) {
        ProgressStatus::Blocked
    } else if exit_code == 0 {
        ProgressStatus::Completed
    } else {
        ProgressStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_phrase_beats_blocking_phrase() {
        assert!(!is_blocked(
            "Please note: changes pushed to fix/sonar-X1",
            ""
        ));
    }

    #[test]
    fn blocking_phrase_detected_case_insensitively() {
        assert!(is_blocked("PLEASE clarify which file", ""));
        assert!(is_blocked("", "Permission denied (publickey)"));
    }

    #[test]
    fn plain_output_is_not_blocked() {
        assert!(!is_blocked("updated base.css", "warning: LF will be replaced"));
    }

    #[test]
    fn classify_outcomes() {
        assert_eq!(classify(0, "pushed", ""), ProgressStatus::Completed);
        assert_eq!(classify(0, "did some work", ""), ProgressStatus::Completed);
        assert_eq!(
            classify(0, "please clarify which file", ""),
            ProgressStatus::Blocked
        );
        assert_eq!(classify(1, "", "I cannot continue"), ProgressStatus::Blocked);
        assert_eq!(classify(137, "", ""), ProgressStatus::Failed);
        assert_eq!(classify(124, "pushed", ""), ProgressStatus::Failed);
    }
}

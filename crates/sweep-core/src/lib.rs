//! Core of `sonar-sweep`: remediates static-analysis findings by running an
//! AI assistant on each one inside its own git worktree.
//!
//! Processing one finding:
//!
//! ```text
//! RepoCache::ensure ─► DuplicateDetector::check ─┬─► skipped-<key>.md
//!                                                └─► WorktreeManager::acquire
//!                                                      ─► AssistantInvoker::invoke (always releases)
//!                                                      ─► fixed- | blocked- | failed-<key>.md
//! ```
//!
//! [`coordinator::Coordinator`] fans findings out per repository.

pub mod classify;
pub mod config;
pub mod coordinator;
pub mod duplicate;
pub mod error;
pub mod finding;
pub mod git;
pub mod invoker;
pub mod io;
pub mod paths;
pub mod plan;
pub mod preflight;
pub mod progress;
pub mod prompt;
pub mod repo;
pub mod source;
pub mod worktree;

pub use error::{Result, SweepError};

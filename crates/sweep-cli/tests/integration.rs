#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const OVERRIDES: &[&str] = &[
    "REPOS_DIR",
    "OUTPUT_DIR",
    "WORKTREE_PARENT_DIR",
    "MAX_CONCURRENT_PER_REPO",
    "AMP_TIMEOUT_MS",
    "AMP_BIN",
    "GIT_BIN",
    "GH_BIN",
    "SONAR_ORG",
];

fn sweep(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sonar-sweep").unwrap();
    cmd.current_dir(dir.path()).env("SWEEP_ROOT", dir.path());
    for name in OVERRIDES {
        cmd.env_remove(name);
    }
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::write(dir.path().join(".sonar-sweep.yaml"), yaml).unwrap();
}

const FIXTURE: &str = r#"
issues:
  - key: K1
    rule: css:S4666
    severity: MAJOR
    message: Unexpected duplicate selector
    component: demo_repo:src/base.css
    line: 10
    project: demo_repo
    status: OPEN
  - key: K2
    rule: ts:S1128
    severity: MINOR
    message: Remove this unused import
    component: demo_repo:src/app.ts
    project: demo_repo
    status: CLOSED
  - key: K3
    rule: ts:S3776
    severity: CRITICAL
    message: Reduce cognitive complexity
    component: other_thing:src/main.ts
    project: other_thing
    status: OPEN
"#;

fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("findings.yaml");
    std::fs::write(&path, FIXTURE).unwrap();
    path
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("check"));
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[test]
fn plan_with_sample_findings() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["plan", "--sample"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 finding(s)"))
        .stdout(predicate::str::contains("Isuru-F/demo-latest-audiobooks"));
}

#[test]
fn plan_json_counts_sample_findings() {
    let dir = TempDir::new().unwrap();
    let out = sweep(&dir)
        .args(["plan", "--sample", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let plan: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(plan["total"], 4);
    assert_eq!(plan["repositories"]["Isuru-F/demo-latest-audiobooks"], 4);
}

#[test]
fn plan_fixture_keeps_open_findings_of_requested_projects() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    let out = sweep(&dir)
        .args(["plan", "--json", "--project", "demo_repo", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let plan: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(plan["total"], 1);
    assert_eq!(plan["preview"][0]["key"], "K1");
    assert_eq!(plan["repositories"]["demo/repo"], 1);
}

#[test]
fn plan_without_projects_needs_a_fixture() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--project"));
}

#[test]
fn fixture_and_sample_conflict() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    sweep(&dir)
        .args(["plan", "--sample", "--fixture"])
        .arg(&fixture)
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_show_reports_defaults() {
    let dir = TempDir::new().unwrap();
    let out = sweep(&dir)
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let config: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(config["max_concurrent_per_repo"], 3);
    assert_eq!(config["assistant_timeout_ms"], 300_000);
    let repos = config["repos_dir"].as_str().unwrap();
    assert!(repos.ends_with("repos"));
}

#[test]
fn config_show_applies_environment() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "max_concurrent_per_repo: 2\n");
    let out = sweep(&dir)
        .args(["config", "show", "--json"])
        .env("AMP_TIMEOUT_MS", "5000")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let config: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(config["max_concurrent_per_repo"], 2);
    assert_eq!(config["assistant_timeout_ms"], 5000);
}

#[test]
fn non_numeric_override_is_an_error() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["config", "show"])
        .env("MAX_CONCURRENT_PER_REPO", "lots")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a number"));
}

#[test]
fn config_validate_clean() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_rejects_zero_concurrency() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "max_concurrent_per_repo: 0\n");
    sweep(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    sweep(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join(".sonar-sweep.yaml").exists());
    sweep(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    sweep(&dir)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// check / run
// ---------------------------------------------------------------------------

#[test]
fn check_fails_without_assistant() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["check", "--skip-tools"])
        .env("AMP_BIN", "definitely-not-an-amp-binary")
        .assert()
        .failure()
        .stdout(predicate::str::contains("assistant"))
        .stderr(predicate::str::contains("preflight failed"));
}

#[test]
fn run_stops_at_preflight_without_assistant() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["run", "--sample"])
        .env("AMP_BIN", "definitely-not-an-amp-binary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("preflight failed"));
    assert!(!dir.path().join("repos").exists());
}

#[test]
fn run_rejects_zero_concurrency_flag() {
    let dir = TempDir::new().unwrap();
    sweep(&dir)
        .args(["run", "--sample", "--skip-preflight", "--max-concurrent", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn run_with_no_open_findings_succeeds() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("empty.json");
    std::fs::write(&fixture, r#"{"issues": []}"#).unwrap();
    sweep(&dir)
        .args(["run", "--skip-preflight", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("No open findings."));
}

#[test]
fn unreachable_repository_fails_the_finding_and_the_run() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    write_config(
        &dir,
        &format!(
            "check_pull_requests: false\nclone_url_template: \"{}/missing/{{repo}}\"\nworktree_dir: scratch\n",
            dir.path().display()
        ),
    );
    let out = sweep(&dir)
        .args([
            "run",
            "--json",
            "--skip-preflight",
            "--project",
            "demo_repo",
            "--fixture",
        ])
        .arg(&fixture)
        .assert()
        .failure()
        .stderr(predicate::str::contains("were not fixed"))
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["results"][0]["outcome"], "failed");
    assert!(dir.path().join("output/demo_repo/failed-K1.md").exists());
}

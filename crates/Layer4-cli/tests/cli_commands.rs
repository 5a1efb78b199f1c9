//! CLI Command Test
//!
//! 빌드된 `steward` 바이너리를 임시 디렉토리에서 실행해 출력과 종료 코드를 확인
//! 실행: cargo test -p steward-cli --test cli_commands

use serde_json::json;
use std::path::Path;
use std::process::{Command, Output};

/// 글로벌/프로젝트 설정과 환경변수의 영향을 받지 않도록 격리해서 실행
fn steward(workdir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_steward"))
        .args(args)
        .current_dir(workdir)
        .env("HOME", workdir)
        .env("XDG_CONFIG_HOME", workdir.join("xdg"))
        .env_remove("STEWARD_POLICIES_DIR")
        .env_remove("POLICIES_DIR")
        .env_remove("STEWARD_AUDIT_LOG")
        .env_remove("STEWARD_AUDIT_MAX_MEMORY")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run steward binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(dir: &Path, name: &str, value: serde_json::Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, value.to_string()).unwrap();
    path.display().to_string()
}

#[test]
fn test_tool_bump_prints_new_version() {
    let dir = tempfile::tempdir().unwrap();
    let old = write(
        dir.path(),
        "old.json",
        json!({"name": "execute_payment_retry", "domain": "payments", "version": "1.0.0"}),
    );
    let new = write(
        dir.path(),
        "new.json",
        json!({"name": "execute_payment_retry", "domain": "payments", "version": "1.0.0",
               "pii_level": "moderate"}),
    );

    let output = steward(dir.path(), &["tool", "bump", "--old", &old, "--new", &new]);
    assert!(output.status.success(), "{:?}", output);
    let out = stdout(&output);
    assert!(out.contains("payments/execute_payment_retry: 1.0.0 -> 1.1.0"), "{out}");
    assert!(out.contains("[MINOR] pii_level changed: low -> moderate"), "{out}");

    let output = steward(
        dir.path(),
        &["tool", "bump", "--old", &old, "--new", &new, "--no-bump"],
    );
    assert!(stdout(&output).contains("1.0.0 (not bumped)"));
}

#[test]
fn test_tool_bump_different_tools_fails() {
    let dir = tempfile::tempdir().unwrap();
    let old = write(dir.path(), "old.json", json!({"name": "a", "domain": "payments"}));
    let new = write(dir.path(), "new.json", json!({"name": "b", "domain": "payments"}));

    let output = steward(dir.path(), &["tool", "bump", "--old", &old, "--new", &new]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("different tools"));
}

#[test]
fn test_policy_eval_prints_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let output = steward(
        dir.path(),
        &["policy", "eval", "payments/retry", "--input", r#"{"amount": 5000, "previous_retries": 3}"#],
    );
    assert!(output.status.success(), "{:?}", output);

    let verdict: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(verdict["allowed"], false);
    assert_eq!(verdict["reason"], "retry_limit_exceeded");
}

#[test]
fn test_audit_show_filters_by_agent() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit.jsonl");
    let lines: Vec<String> = [("payment_failed", "tool_call"), ("refund_agent", "decision")]
        .iter()
        .enumerate()
        .map(|(i, (agent, event))| {
            json!({
                "id": format!("00000000-0000-4000-8000-00000000000{}", i),
                "timestamp": "2025-01-15T10:00:00Z",
                "agent_id": agent,
                "event_type": event,
                "payload": {"n": i},
            })
            .to_string()
        })
        .collect();
    std::fs::write(&log, lines.join("\n")).unwrap();
    let log = log.display().to_string();

    let output = steward(
        dir.path(),
        &["audit", "show", "--file", &log, "--agent", "refund_agent"],
    );
    assert!(output.status.success(), "{:?}", output);
    let out = stdout(&output);
    assert!(out.contains("refund_agent"), "{out}");
    assert!(!out.contains("payment_failed"), "{out}");

    let output = steward(dir.path(), &["audit", "show", "--file", &log, "--agent", "nobody"]);
    assert!(stdout(&output).contains("No audit entries found."));
}

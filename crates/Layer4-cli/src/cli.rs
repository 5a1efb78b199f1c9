//! Admin commands
//!
//! 각 명령은 계산 결과를 돌려주고, 출력은 `print_*` 함수가 맡습니다.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use steward_agent::{calculate_new_agent_version, detect_agent_changes, AgentDefinition};
use steward_foundation::{
    AuditEntry, AuditQuery, AuditStatistics, ChangeSet, JsonlFileSink, StewardConfig,
};
use steward_policy::{PolicyRegistry, Verdict};
use steward_tool::{calculate_new_tool_version, detect_tool_changes, ToolDefinition};

/// 설정 로드 + 검증
pub fn load_config() -> Result<StewardConfig> {
    let config = StewardConfig::load().context("Failed to load steward configuration")?;
    config.validate().context("Invalid steward configuration")?;
    Ok(config)
}

/// `--dir` → 설정의 정책 디렉토리 → 내장 정책만
pub fn load_policies(config: &StewardConfig, dir: Option<PathBuf>) -> Result<PolicyRegistry> {
    match dir.or_else(|| config.policies.dir.clone()) {
        Some(dir) => PolicyRegistry::load_dir(&dir)
            .with_context(|| format!("Failed to load policies from {}", dir.display())),
        None => PolicyRegistry::with_builtins().context("Failed to load built-in policies"),
    }
}

// ============================================================================
// Policy
// ============================================================================

pub fn print_policies(registry: &PolicyRegistry) {
    let policies = registry.list_policies();
    if policies.is_empty() {
        println!("No policies registered.");
        return;
    }

    println!("{:<30} {:<12} {}", "ID", "Domain", "Source");
    println!("{}", "-".repeat(70));
    for info in policies {
        let source = info
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".to_string());
        println!("{:<30} {:<12} {}", info.id, info.domain, source);
    }
    println!("\nDomains: {}", registry.domains().join(", "));
}

/// `--input` JSON을 파싱해 정책 평가 (알 수 없는 정책은 거부 verdict)
pub fn policy_eval(registry: &PolicyRegistry, policy_id: &str, input: &str) -> Result<Verdict> {
    let input: Value = serde_json::from_str(input).context("--input is not valid JSON")?;
    registry
        .evaluate(policy_id, &input)
        .with_context(|| format!("Failed to evaluate {}", policy_id))
}

// ============================================================================
// Versioning
// ============================================================================

/// `tool bump` / `agent bump` 결과
#[derive(Debug)]
pub struct BumpReport {
    pub name: String,
    pub old_version: String,
    pub new_version: String,
    pub changes: ChangeSet,
}

impl BumpReport {
    pub fn print(&self) {
        if self.changes.is_empty() {
            println!("{}: no changes ({})", self.name, self.old_version);
            return;
        }

        if self.old_version == self.new_version {
            println!("{}: {} (not bumped)", self.name, self.old_version);
        } else {
            println!("{}: {} -> {}", self.name, self.old_version, self.new_version);
        }
        for (label, items) in [
            ("MAJOR", &self.changes.major),
            ("MINOR", &self.changes.minor),
            ("PATCH", &self.changes.patch),
        ] {
            for item in items {
                println!("  [{}] {}", label, item);
            }
        }
    }
}

fn read_definition<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid definition in {}", path.display()))
}

pub fn tool_bump(old: &Path, new: &Path, auto_bump: bool) -> Result<BumpReport> {
    let old_def: ToolDefinition = read_definition(old)?;
    let new_def: ToolDefinition = read_definition(new)?;
    if old_def.key() != new_def.key() {
        bail!("Definitions describe different tools: {} vs {}", old_def.key(), new_def.key());
    }

    let changes = detect_tool_changes(&old_def, &new_def);
    let (new_version, changes) = calculate_new_tool_version(&old_def.version, changes, auto_bump)?;
    Ok(BumpReport {
        name: old_def.key(),
        old_version: old_def.version,
        new_version,
        changes,
    })
}

pub fn agent_bump(old: &Path, new: &Path, auto_bump: bool) -> Result<BumpReport> {
    let old_def: AgentDefinition = read_definition(old)?;
    let new_def: AgentDefinition = read_definition(new)?;
    if old_def.id != new_def.id {
        bail!("Definitions describe different agents: {} vs {}", old_def.id, new_def.id);
    }

    let changes = detect_agent_changes(&old_def, &new_def);
    let (new_version, changes) =
        calculate_new_agent_version(&old_def.version, changes, auto_bump)?;
    Ok(BumpReport {
        name: old_def.id,
        old_version: old_def.version,
        new_version,
        changes,
    })
}

// ============================================================================
// Audit
// ============================================================================

fn audit_file(config: &StewardConfig, file: Option<PathBuf>) -> Result<PathBuf> {
    match file.or_else(|| config.audit.mirror_path.clone()) {
        Some(path) => Ok(path),
        None => bail!("No audit log given: pass --file or set STEWARD_AUDIT_LOG"),
    }
}

fn read_audit_log(config: &StewardConfig, file: Option<PathBuf>) -> Result<Vec<AuditEntry>> {
    let path = audit_file(config, file)?;
    JsonlFileSink::read_entries(&path)
        .with_context(|| format!("Failed to read audit log {}", path.display()))
}

/// JSONL 감사 로그에서 최근 엔트리 (최신순)
pub fn audit_show(
    config: &StewardConfig,
    file: Option<PathBuf>,
    agent: Option<&str>,
    limit: usize,
) -> Result<Vec<AuditEntry>> {
    let mut query = AuditQuery::new();
    if let Some(agent) = agent {
        query = query.with_agent(agent);
    }

    let entries = read_audit_log(config, file)?;
    Ok(entries
        .into_iter()
        .rev()
        .filter(|e| query.matches(e))
        .take(limit)
        .collect())
}

pub fn print_entries(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("No audit entries found.");
        return;
    }

    for entry in entries {
        println!(
            "{} {:<20} {:<14} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.agent_id,
            entry.event_type,
            entry.payload
        );
    }
}

pub fn audit_stats(config: &StewardConfig, file: Option<PathBuf>) -> Result<AuditStatistics> {
    let entries = read_audit_log(config, file)?;
    Ok(AuditStatistics::from_entries(&entries))
}

/// JSON으로 출력 (verdict, stats, config)
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_foundation::{AuditSink, EventType};
    use steward_policy::PAYMENTS_RETRY;
    use steward_tool::RiskTier;

    fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn retry_tool() -> ToolDefinition {
        ToolDefinition::new("execute_payment_retry")
            .with_domain("payments")
            .with_version("1.4.2")
    }

    #[test]
    fn test_tool_bump_reports_major_change() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_json(dir.path(), "old.json", &retry_tool());
        let new = write_json(
            dir.path(),
            "new.json",
            &retry_tool().with_risk_tier(RiskTier::High),
        );

        let report = tool_bump(&old, &new, true).unwrap();
        assert_eq!(report.name, "payments/execute_payment_retry");
        assert_eq!(report.old_version, "1.4.2");
        assert_eq!(report.new_version, "2.0.0");
        assert_eq!(report.changes.major, vec!["risk_tier changed: low -> high"]);
    }

    #[test]
    fn test_tool_bump_without_auto_bump_keeps_version() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_json(dir.path(), "old.json", &retry_tool());
        let new = write_json(
            dir.path(),
            "new.json",
            &retry_tool().with_description("Retry once more"),
        );

        let report = tool_bump(&old, &new, false).unwrap();
        assert_eq!(report.new_version, "1.4.2");
        assert_eq!(report.changes.patch, vec!["description updated"]);
    }

    #[test]
    fn test_tool_bump_rejects_different_tools() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_json(dir.path(), "old.json", &retry_tool());
        let new = write_json(
            dir.path(),
            "new.json",
            &ToolDefinition::new("execute_payment_retry").with_domain("cards"),
        );

        let err = tool_bump(&old, &new, true).unwrap_err();
        assert!(err.to_string().contains("different tools"), "{err}");
    }

    #[test]
    fn test_agent_bump_rejects_different_agents() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_json(dir.path(), "old.json", &AgentDefinition::new("payment_failed"));
        let new = write_json(dir.path(), "new.json", &AgentDefinition::new("refund_agent"));

        assert!(agent_bump(&old, &new, true).is_err());
        let report = agent_bump(&old, &old, true).unwrap();
        assert!(report.changes.is_empty());
        assert_eq!(report.new_version, report.old_version);
    }

    #[test]
    fn test_policy_eval_verdicts() {
        let registry = PolicyRegistry::with_builtins().unwrap();

        let verdict = policy_eval(&registry, PAYMENTS_RETRY, r#"{"amount": 20000}"#).unwrap();
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "amount_limit_exceeded");

        let verdict = policy_eval(&registry, "payments/unknown", r#"{"amount": 1}"#).unwrap();
        assert!(!verdict.allowed);

        assert!(policy_eval(&registry, PAYMENTS_RETRY, "{amount").is_err());
    }

    #[test]
    fn test_audit_show_filters_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let mut sink = JsonlFileSink::new(&path);
        for (agent, n) in [
            ("payment_failed", 1),
            ("refund_agent", 2),
            ("payment_failed", 3),
            ("payment_failed", 4),
        ] {
            let entry = AuditEntry::new(agent, EventType::TOOL_CALL, serde_json::json!({ "n": n }));
            sink.write(&entry).unwrap();
        }
        sink.flush().unwrap();

        let config = StewardConfig::default();
        let entries = audit_show(&config, Some(path.clone()), Some("payment_failed"), 2).unwrap();
        let ns: Vec<_> = entries.iter().map(|e| e.payload["n"].clone()).collect();
        assert_eq!(ns, vec![serde_json::json!(4), serde_json::json!(3)]);

        assert_eq!(audit_show(&config, Some(path.clone()), None, 10).unwrap().len(), 4);
        assert!(audit_show(&config, Some(path.clone()), Some("nobody"), 10).unwrap().is_empty());

        let stats = audit_stats(&config, Some(path)).unwrap();
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.by_agent.get("payment_failed"), Some(&3));
    }

    #[test]
    fn test_audit_file_required() {
        let config = StewardConfig::default();
        let err = audit_show(&config, None, None, 10).unwrap_err();
        assert!(err.to_string().contains("No audit log given"));
    }
}

//! Agent definition and versioning
//!
//! | 심각도 | 변경 |
//! |-------|------|
//! | MAJOR | `risk_tier`, `goal`, `domain` |
//! | MINOR | `allowed_tools`, `policies`, `tool_policies` (추가/제거) |
//! | PATCH | `model`, `confidence_threshold`, `human_in_the_loop`, `instructions_prefix`, `owners` |

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use steward_foundation::{calculate_new_version, BumpLevel, ChangeSet, Result, SemVer};
use steward_tool::{RiskTier, INITIAL_VERSION};

/// 등록된 에이전트의 정의
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: String,

    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default)]
    pub risk_tier: RiskTier,

    /// 에이전트의 목적
    #[serde(default)]
    pub goal: String,

    /// 프롬프트 앞에 붙는 지시문
    #[serde(default)]
    pub instructions_prefix: String,

    /// 사용할 모델 ("auto" 가능)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub allowed_tools: BTreeSet<String>,

    /// 에이전트가 따르는 정책 ID
    #[serde(default)]
    pub policies: BTreeSet<String>,

    /// 도구 이름 → 호출 전에 강제할 정책 ID
    #[serde(default)]
    pub tool_policies: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,

    #[serde(default)]
    pub human_in_the_loop: bool,

    #[serde(default)]
    pub owners: Vec<String>,

    #[serde(default = "default_version")]
    pub version: String,
}

fn default_domain() -> String {
    "general".to_string()
}

fn default_version() -> String {
    INITIAL_VERSION.to_string()
}

impl AgentDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: default_domain(),
            risk_tier: RiskTier::default(),
            goal: String::new(),
            instructions_prefix: String::new(),
            model: None,
            allowed_tools: BTreeSet::new(),
            policies: BTreeSet::new(),
            tool_policies: BTreeMap::new(),
            confidence_threshold: None,
            human_in_the_loop: false,
            owners: Vec::new(),
            version: default_version(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_risk_tier(mut self, tier: RiskTier) -> Self {
        self.risk_tier = tier;
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_instructions_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.instructions_prefix = prefix.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.allowed_tools.insert(tool.into());
        self
    }

    pub fn with_policy(mut self, policy_id: impl Into<String>) -> Self {
        self.policies.insert(policy_id.into());
        self
    }

    /// 도구 호출 전에 강제할 정책 지정 (정책 목록에도 추가됨)
    pub fn with_tool_policy(mut self, tool: impl Into<String>, policy_id: impl Into<String>) -> Self {
        let policy_id = policy_id.into();
        self.policies.insert(policy_id.clone());
        self.tool_policies.insert(tool.into(), policy_id);
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = Some(threshold);
        self
    }

    pub fn with_human_in_the_loop(mut self, enabled: bool) -> Self {
        self.human_in_the_loop = enabled;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owners.push(owner.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// 도구에 연결된 정책 ID
    pub fn policy_for_tool(&self, tool: &str) -> Option<&str> {
        self.tool_policies.get(tool).map(String::as_str)
    }

    pub fn semver(&self) -> Result<SemVer> {
        self.version.parse()
    }
}

// ============================================================================
// Versioning
// ============================================================================

/// 두 정의의 차이를 심각도별로 분류
pub fn detect_agent_changes(old: &AgentDefinition, new: &AgentDefinition) -> ChangeSet {
    let mut changes = ChangeSet::new();

    // MAJOR
    changes.record_changed(BumpLevel::Major, "risk_tier", &old.risk_tier, &new.risk_tier);
    if old.goal != new.goal {
        changes.push(BumpLevel::Major, "goal changed");
    }
    changes.record_changed(BumpLevel::Major, "domain", old.domain.as_str(), new.domain.as_str());

    // MINOR
    changes.record_set_diff(BumpLevel::Minor, "tools", &old.allowed_tools, &new.allowed_tools);
    changes.record_set_diff(BumpLevel::Minor, "policies", &old.policies, &new.policies);
    if old.tool_policies != new.tool_policies {
        changes.push(BumpLevel::Minor, "tool policy bindings updated");
    }

    // PATCH
    changes.record_changed(
        BumpLevel::Patch,
        "model",
        old.model.as_deref().unwrap_or("none"),
        new.model.as_deref().unwrap_or("none"),
    );
    if old.confidence_threshold != new.confidence_threshold {
        changes.push(
            BumpLevel::Patch,
            format!(
                "confidence_threshold changed: {} -> {}",
                display_threshold(old.confidence_threshold),
                display_threshold(new.confidence_threshold)
            ),
        );
    }
    changes.record_changed(
        BumpLevel::Patch,
        "human_in_the_loop",
        &old.human_in_the_loop,
        &new.human_in_the_loop,
    );
    if old.instructions_prefix != new.instructions_prefix {
        changes.push(BumpLevel::Patch, "instructions_prefix updated");
    }
    if old.owners != new.owners {
        changes.push(BumpLevel::Patch, "owners updated");
    }

    changes
}

fn display_threshold(threshold: Option<f64>) -> String {
    threshold.map_or_else(|| "none".to_string(), |t| t.to_string())
}

/// 변경 내역으로 다음 에이전트 버전 계산 → (새 버전, 변경 내역)
pub fn calculate_new_agent_version(
    old_version: &str,
    changes: ChangeSet,
    auto_bump: bool,
) -> Result<(String, ChangeSet)> {
    let version = calculate_new_version(old_version, &changes, auto_bump)?;
    Ok((version, changes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_agent() -> AgentDefinition {
        AgentDefinition::new("payment_failed")
            .with_domain("payments")
            .with_goal("Explain and resolve failed payments")
            .with_model("gemini-2.5-flash")
            .with_tool("get_payment_exception")
            .with_tool_policy("execute_payment_retry", "payments/retry")
            .with_tool("execute_payment_retry")
            .with_owner("payments-team")
            .with_version("1.4.2")
    }

    #[test]
    fn test_defaults_from_json() {
        let def: AgentDefinition = serde_json::from_str(r#"{"id": "cloud_reliability"}"#).unwrap();
        assert_eq!(def.domain, "general");
        assert_eq!(def.version, "1.0.0");
        assert_eq!(def.risk_tier, RiskTier::Low);
        assert!(def.allowed_tools.is_empty());
    }

    #[test]
    fn test_tool_policy_binding() {
        let def = payment_agent();
        assert_eq!(def.policy_for_tool("execute_payment_retry"), Some("payments/retry"));
        assert_eq!(def.policy_for_tool("get_payment_exception"), None);
        assert!(def.policies.contains("payments/retry"));
    }

    #[test]
    fn test_goal_change_is_major() {
        let new = payment_agent().with_goal("Retry everything");
        let changes = detect_agent_changes(&payment_agent(), &new);
        assert_eq!(changes.major, vec!["goal changed"]);

        let (version, _) = calculate_new_agent_version("1.4.2", changes, true).unwrap();
        assert_eq!(version, "2.0.0");
    }

    #[test]
    fn test_tool_added_is_minor() {
        let new = payment_agent().with_tool("suggest_payment_resolution");
        let changes = detect_agent_changes(&payment_agent(), &new);
        assert_eq!(changes.minor, vec!["tools added: suggest_payment_resolution"]);

        let (version, _) = calculate_new_agent_version("1.4.2", changes, true).unwrap();
        assert_eq!(version, "1.5.0");
    }

    #[test]
    fn test_patch_changes() {
        let mut new = payment_agent()
            .with_model("gemini-2.5-pro")
            .with_confidence_threshold(0.8)
            .with_instructions_prefix("Be concise.");
        new.owners.push("risk-team".into());

        let changes = detect_agent_changes(&payment_agent(), &new);
        assert!(changes.major.is_empty() && changes.minor.is_empty());
        assert_eq!(
            changes.patch,
            vec![
                "model changed: gemini-2.5-flash -> gemini-2.5-pro",
                "confidence_threshold changed: none -> 0.8",
                "instructions_prefix updated",
                "owners updated",
            ]
        );

        let (version, _) = calculate_new_agent_version("1.4.2", changes, true).unwrap();
        assert_eq!(version, "1.4.3");
    }

    #[test]
    fn test_unchanged_and_no_bump() {
        let changes = detect_agent_changes(&payment_agent(), &payment_agent());
        assert!(changes.is_empty());

        let new = payment_agent().with_domain("cards");
        let changes = detect_agent_changes(&payment_agent(), &new);
        let (version, changes) = calculate_new_agent_version("1.4.2", changes, false).unwrap();
        assert_eq!(version, "1.4.2");
        assert_eq!(changes.major, vec!["domain changed: payments -> cards"]);
    }
}

//! Audit Log Types - 감사 로그 타입 정의
//!
//! 도구 호출, 정책 검사, 결정 등 거버넌스 행위의 감사 기록을 위한 타입들입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

// ============================================================================
// Audit Entry ID
// ============================================================================

/// 감사 로그 엔트리 ID
///
/// UUID v4 기반이므로 eviction 이후에도 재사용되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditId(pub String);

impl AuditId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AuditId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Type
// ============================================================================

/// 감사 이벤트 타입
///
/// 관례적인 값(`tool_call`, `policy_check`, `decision`, `kill_switch`)이
/// 상수로 제공되지만 임의의 문자열도 허용됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    /// 도구 호출
    pub const TOOL_CALL: EventType = EventType(Cow::Borrowed("tool_call"));
    /// 정책 검사
    pub const POLICY_CHECK: EventType = EventType(Cow::Borrowed("policy_check"));
    /// 거버넌스 결정 (거절 등)
    pub const DECISION: EventType = EventType(Cow::Borrowed("decision"));
    /// Kill switch 상태 변경
    pub const KILL_SWITCH: EventType = EventType(Cow::Borrowed("kill_switch"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 관례적인 값 중 하나인지
    pub fn is_conventional(&self) -> bool {
        matches!(
            self.as_str(),
            "tool_call" | "policy_check" | "decision" | "kill_switch"
        )
    }
}

impl From<&'static str> for EventType {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Audit Entry
// ============================================================================

/// 감사 로그 엔트리
///
/// 추가된 이후에는 변경되지 않습니다. `payload`는 이벤트 타입마다
/// 모양이 다른 스키마 없는 JSON 값입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 고유 ID
    pub id: AuditId,

    /// 발생 시간 (UTC)
    pub timestamp: DateTime<Utc>,

    /// 에이전트 ID
    pub agent_id: String,

    /// 이벤트 타입
    pub event_type: EventType,

    /// 추가 데이터
    #[serde(default)]
    pub payload: Value,
}

impl AuditEntry {
    /// 새 감사 엔트리 생성
    pub fn new(agent_id: impl Into<String>, event_type: impl Into<EventType>, payload: Value) -> Self {
        Self {
            id: AuditId::new(),
            timestamp: Utc::now(),
            agent_id: agent_id.into(),
            event_type: event_type.into(),
            payload,
        }
    }

    /// 발생 시간 오버라이드 (replay, 테스트용)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// ============================================================================
// Audit Query
// ============================================================================

/// 감사 로그 조회 쿼리
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// 에이전트 필터
    pub agent_id: Option<String>,

    /// 이벤트 타입 필터
    pub event_types: Option<Vec<EventType>>,

    /// 시작 시간
    pub from: Option<DateTime<Utc>>,

    /// 종료 시간
    pub to: Option<DateTime<Utc>>,

    /// 최대 결과 수
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_event_types(mut self, event_types: Vec<EventType>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 엔트리가 쿼리와 매칭되는지 확인
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(ref agent_id) = self.agent_id {
            if &entry.agent_id != agent_id {
                return false;
            }
        }

        if let Some(ref event_types) = self.event_types {
            if !event_types.contains(&entry.event_type) {
                return false;
            }
        }

        if let Some(ref from) = self.from {
            if entry.timestamp < *from {
                return false;
            }
        }

        if let Some(ref to) = self.to {
            if entry.timestamp > *to {
                return false;
            }
        }

        true
    }
}

// ============================================================================
// Audit Statistics
// ============================================================================

/// 감사 로그 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditStatistics {
    /// 총 엔트리 수
    pub total_entries: usize,

    /// 이벤트 타입별 카운트
    pub by_event_type: HashMap<String, usize>,

    /// 에이전트별 카운트
    pub by_agent: HashMap<String, usize>,

    /// 기간
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

impl AuditStatistics {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            stats.total_entries += 1;
            *stats
                .by_event_type
                .entry(entry.event_type.to_string())
                .or_insert(0) += 1;
            *stats.by_agent.entry(entry.agent_id.clone()).or_insert(0) += 1;

            stats.period_start = Some(match stats.period_start {
                Some(start) if start <= entry.timestamp => start,
                _ => entry.timestamp,
            });
            stats.period_end = Some(match stats.period_end {
                Some(end) if end >= entry.timestamp => end,
                _ => entry.timestamp,
            });
        }
        stats
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audit_entry_creation() {
        let entry = AuditEntry::new(
            "payment_failed",
            EventType::TOOL_CALL,
            json!({"tool": "get_payment_exception"}),
        );

        assert_eq!(entry.agent_id, "payment_failed");
        assert_eq!(entry.event_type, EventType::TOOL_CALL);
        assert_eq!(entry.payload["tool"], "get_payment_exception");
        assert_ne!(entry.id, AuditEntry::new("a", "decision", Value::Null).id);
    }

    #[test]
    fn test_event_type_open_ended() {
        let custom = EventType::from("model_swap".to_string());
        assert!(!custom.is_conventional());
        assert!(EventType::POLICY_CHECK.is_conventional());
        assert_eq!(EventType::from("decision"), EventType::DECISION);

        let json = serde_json::to_string(&EventType::TOOL_CALL).unwrap();
        assert_eq!(json, "\"tool_call\"");
    }

    #[test]
    fn test_audit_query() {
        let entry = AuditEntry::new("payment_failed", EventType::POLICY_CHECK, Value::Null);

        let query = AuditQuery::new()
            .with_agent("payment_failed")
            .with_event_types(vec![EventType::POLICY_CHECK, EventType::DECISION]);
        assert!(query.matches(&entry));

        let other_agent = AuditQuery::new().with_agent("incident_triage");
        assert!(!other_agent.matches(&entry));

        let other_type = AuditQuery::new().with_event_types(vec![EventType::TOOL_CALL]);
        assert!(!other_type.matches(&entry));
    }

    #[test]
    fn test_entry_serializes_flat() {
        let entry = AuditEntry::new("a", EventType::DECISION, json!({"outcome": "refused"}));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["event_type"], "decision");
        assert!(value["id"].is_string());

        let back: AuditEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_statistics() {
        let entries = vec![
            AuditEntry::new("a", EventType::TOOL_CALL, Value::Null),
            AuditEntry::new("a", EventType::POLICY_CHECK, Value::Null),
            AuditEntry::new("b", EventType::TOOL_CALL, Value::Null),
        ];
        let stats = AuditStatistics::from_entries(&entries);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.by_event_type["tool_call"], 2);
        assert_eq!(stats.by_agent["a"], 2);
        assert!(stats.period_start <= stats.period_end);
    }
}

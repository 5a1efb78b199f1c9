//! Policy - 컴파일된 정책과 판정 결과
//!
//! 규칙 파일 하나가 `Policy` 하나로 컴파일됩니다. 평가는 입력에 대한
//! 순수 함수이며 잘못된 입력(필수 필드 누락, 타입 불일치)일 때만 실패합니다.

use crate::rule::Condition;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use steward_foundation::{Error, Result};

/// 정책을 찾지 못했을 때의 reason 접두어
pub const POLICY_NOT_FOUND_PREFIX: &str = "Policy not found: ";

// ============================================================================
// Verdict
// ============================================================================

/// 정책 판정 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: String,
    #[serde(default)]
    pub details: Value,
}

impl Verdict {
    pub fn allow(reason: impl Into<String>, details: Value) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            details,
        }
    }

    pub fn deny(reason: impl Into<String>, details: Value) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            details,
        }
    }

    /// 알 수 없는 정책 ID에 대한 판정
    pub fn not_found(policy_id: &str) -> Self {
        Self::deny(
            format!("{}{}", POLICY_NOT_FOUND_PREFIX, policy_id),
            Value::Object(Map::new()),
        )
    }

    /// not-found 판정이면 정책 ID 반환
    pub fn not_found_policy(&self) -> Option<&str> {
        if self.allowed {
            return None;
        }
        self.reason.strip_prefix(POLICY_NOT_FOUND_PREFIX)
    }

    /// `details.message` (있으면)
    pub fn message(&self) -> Option<&str> {
        self.details.get("message").and_then(Value::as_str)
    }

    /// 거부 판정을 에러로 변환
    ///
    /// not-found 판정 → `Error::PolicyNotFound`, 거부 → `Error::PolicyDenied`
    pub fn into_result(self, policy_id: &str) -> Result<Verdict> {
        if self.allowed {
            return Ok(self);
        }
        if let Some(missing) = self.not_found_policy() {
            return Err(Error::PolicyNotFound(missing.to_string()));
        }
        Err(Error::policy_denied(policy_id, self.reason))
    }
}

// ============================================================================
// Effect / Field
// ============================================================================

/// 규칙 효과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// 입력 필드 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    Integer,
    Bool,
    String,
    #[default]
    Any,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Any => "any",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::String => value.is_string(),
            Self::Any => true,
        }
    }
}

/// 선언된 입력 필드
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    #[serde(rename = "type", default)]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// 규칙 하나 (위에서부터 평가, 첫 매칭이 결정)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub effect: Effect,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub when: Condition,
}

// ============================================================================
// Policy
// ============================================================================

/// 컴파일된 정책
///
/// 규칙 파일 형식:
///
/// ```toml
/// description = "..."
/// default = "allow"
/// default_reason = "within_limits"
///
/// [fields]
/// amount = { type = "number", required = true }
///
/// [[rules]]
/// effect = "deny"
/// reason = "amount_limit_exceeded"
/// when = { field = "amount", op = "gt", value = 10000 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_effect")]
    pub default: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_message: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_effect() -> Effect {
    Effect::Allow
}

impl Policy {
    /// TOML 규칙 파일 파싱 + 검증
    ///
    /// 실패하면 `Error::Config` (호출자가 파일 이름을 붙입니다).
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let policy: Policy =
            toml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// 구조 검증
    pub fn validate(&self) -> Result<()> {
        for (name, spec) in &self.fields {
            if let Some(ref default) = spec.default {
                if !spec.kind.accepts(default) {
                    return Err(Error::Config(format!(
                        "default for field `{}` is not a {}",
                        name,
                        spec.kind.as_str()
                    )));
                }
            }
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.reason.trim().is_empty() {
                return Err(Error::Config(format!("rule #{} has an empty reason", index + 1)));
            }
            rule.when
                .validate()
                .map_err(|e| Error::Config(format!("rule #{} ({}): {}", index + 1, rule.reason, e)))?;
        }

        Ok(())
    }

    /// 입력 평가
    ///
    /// 선언된 필드를 기본값으로 채우고 타입을 검사한 뒤 규칙을 순서대로
    /// 적용합니다. 매칭되는 규칙이 없으면 `default` 효과를 반환합니다.
    pub fn evaluate(&self, input: &Value) -> Result<Verdict> {
        let resolved = self.resolve_input(input)?;

        for rule in &self.rules {
            if rule.when.matches(&resolved) {
                let details = details_for(rule.message.as_deref());
                return Ok(match rule.effect {
                    Effect::Allow => Verdict::allow(rule.reason.clone(), details),
                    Effect::Deny => Verdict::deny(rule.reason.clone(), details),
                });
            }
        }

        let reason = self.default_reason.clone().unwrap_or_else(|| {
            if self.default.is_allow() {
                "default_allow".to_string()
            } else {
                "default_deny".to_string()
            }
        });
        let details = details_for(self.default_message.as_deref());
        Ok(match self.default {
            Effect::Allow => Verdict::allow(reason, details),
            Effect::Deny => Verdict::deny(reason, details),
        })
    }

    /// 입력 객체 + 선언 필드 기본값, 타입 검사
    fn resolve_input(&self, input: &Value) -> Result<Map<String, Value>> {
        let mut resolved = match input {
            Value::Object(map) => map.clone(),
            other => {
                return Err(Error::InvalidInput(format!(
                    "policy input must be an object, got {}",
                    type_name(other)
                )))
            }
        };

        for (name, spec) in &self.fields {
            match resolved.get(name).filter(|v| !v.is_null()) {
                Some(value) => {
                    if !spec.kind.accepts(value) {
                        return Err(Error::InvalidInput(format!(
                            "field `{}` must be a {}, got {}",
                            name,
                            spec.kind.as_str(),
                            type_name(value)
                        )));
                    }
                }
                None => {
                    if spec.required {
                        return Err(Error::InvalidInput(format!(
                            "missing required field `{}`",
                            name
                        )));
                    }
                    let value = spec.default.clone().unwrap_or(Value::Null);
                    resolved.insert(name.clone(), value);
                }
            }
        }

        Ok(resolved)
    }
}

fn details_for(message: Option<&str>) -> Value {
    match message {
        Some(message) => json!({ "message": message }),
        None => Value::Object(Map::new()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

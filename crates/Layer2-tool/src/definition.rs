//! Tool definition - 도구 메타데이터
//!
//! 버전 계산과 허용 목록 검사에 쓰이는 도구의 메모리 내 표현입니다.
//! 파일 형식은 외부 레지스트리가 결정합니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use steward_foundation::{Result, SemVer};

/// 도메인이 지정되지 않은 도구의 도메인
pub const DEFAULT_TOOL_DOMAIN: &str = "general";

/// 새 도구의 기본 버전
pub const INITIAL_VERSION: &str = "1.0.0";

// ============================================================================
// RiskTier / PiiLevel
// ============================================================================

/// 도구 위험 등급
///
/// 관례적인 값은 `low`, `medium`, `high`, `critical`이며 외부 레지스트리가
/// 다른 문자열을 쓰면 `Other`로 그대로 보존합니다. 직렬화는 항상 문자열입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskTier {
    #[default]
    Low,
    Medium,
    High,
    Critical,
    Other(String),
}

impl RiskTier {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Other(tier) => tier,
        }
    }
}

impl From<String> for RiskTier {
    fn from(tier: String) -> Self {
        match tier.as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Other(tier),
        }
    }
}

impl From<RiskTier> for String {
    fn from(tier: RiskTier) -> Self {
        match tier {
            RiskTier::Other(tier) => tier,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 도구가 다루는 개인정보 수준 (`RiskTier`와 같은 열린 문자열 타입)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PiiLevel {
    None,
    #[default]
    Low,
    Medium,
    High,
    Other(String),
}

impl PiiLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Other(level) => level,
        }
    }
}

impl From<String> for PiiLevel {
    fn from(level: String) -> Self {
        match level.as_str() {
            "none" => Self::None,
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Other(level),
        }
    }
}

impl From<PiiLevel> for String {
    fn from(level: PiiLevel) -> Self {
        match level {
            PiiLevel::Other(level) => level,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PiiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ToolDefinition
// ============================================================================

/// 도구 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// 도구 이름 (도메인 안에서 유일)
    pub name: String,

    /// 설명 (없으면 빈 문자열과 같게 취급)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub risk_tier: RiskTier,

    #[serde(default)]
    pub requires_human_approval: bool,

    /// 접근하는 데이터 소스 (순서 무관)
    #[serde(default)]
    pub data_sources: BTreeSet<String>,

    #[serde(default)]
    pub pii_level: PiiLevel,

    /// `MAJOR.MINOR.PATCH`
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_version() -> String {
    INITIAL_VERSION.to_string()
}

fn default_domain() -> String {
    DEFAULT_TOOL_DOMAIN.to_string()
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            risk_tier: RiskTier::default(),
            requires_human_approval: false,
            data_sources: BTreeSet::new(),
            pii_level: PiiLevel::default(),
            version: default_version(),
            domain: default_domain(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_risk_tier(mut self, risk_tier: RiskTier) -> Self {
        self.risk_tier = risk_tier;
        self
    }

    pub fn with_human_approval(mut self, required: bool) -> Self {
        self.requires_human_approval = required;
        self
    }

    pub fn with_data_source(mut self, source: impl Into<String>) -> Self {
        self.data_sources.insert(source.into());
        self
    }

    pub fn with_pii_level(mut self, pii_level: PiiLevel) -> Self {
        self.pii_level = pii_level;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// 비교용 설명 (없으면 "")
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// 버전 기록 키 (`domain/name`)
    pub fn key(&self) -> String {
        format!("{}/{}", self.domain, self.name)
    }

    /// 버전 파싱
    pub fn semver(&self) -> Result<SemVer> {
        self.version.parse()
    }
}

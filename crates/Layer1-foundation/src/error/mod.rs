//! Error types for Steward
//!
//! 거버넌스 계층의 모든 에러를 중앙에서 관리
//!
//! 호출자는 카테고리 헬퍼(`is_disabled`, `is_denied`, `is_not_found`)로
//! 거버넌스 실패를 구분해서 세션을 끊지 않고 거절 메시지를 만들 수 있습니다.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Steward 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Kill switch (terminal, 재시도 금지)
    // ========================================================================
    #[error("agent is disabled: {0}")]
    AgentDisabled(String),

    #[error("model is disabled: {0}")]
    ModelDisabled(String),

    // ========================================================================
    // Policy 관련
    // ========================================================================
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("Policy denied: {policy} ({reason})")]
    PolicyDenied { policy: String, reason: String },

    // ========================================================================
    // Tool 관련
    // ========================================================================
    #[error("Tool not allowed for agent {agent}: {tool}")]
    ToolNotAllowed { tool: String, agent: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {tool} - {message}")]
    ToolExecution { tool: String, message: String },

    // ========================================================================
    // 입력 검증
    // ========================================================================
    #[error("Invalid version format: {0}. Expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Kill switch에 의한 거절인지 확인
    pub fn is_disabled(&self) -> bool {
        matches!(self, Error::AgentDisabled(_) | Error::ModelDisabled(_))
    }

    /// 정책/허용 목록에 의한 거절인지 확인
    pub fn is_denied(&self) -> bool {
        matches!(self, Error::PolicyDenied { .. } | Error::ToolNotAllowed { .. })
    }

    /// 대상이 존재하지 않는 경우인지 확인
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PolicyNotFound(_) | Error::ToolNotFound(_))
    }

    /// 거버넌스 계층이 내린 거절인지 확인 (disabled, denied, not-found)
    pub fn is_governance_failure(&self) -> bool {
        self.is_disabled() || self.is_denied() || self.is_not_found()
    }

    /// 재시도 가능한 에러인지 확인
    ///
    /// 거버넌스 거절은 절대 재시도 대상이 아닙니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::ToolExecution { .. })
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        self.is_governance_failure()
            || matches!(self, Error::InvalidInput(_) | Error::InvalidVersion(_))
    }

    /// Tool 실행 에러 생성 헬퍼
    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Policy 거부 에러 생성 헬퍼
    pub fn policy_denied(policy: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::PolicyDenied {
            policy: policy.into(),
            reason: reason.into(),
        }
    }

    /// 허용되지 않은 Tool 에러 생성 헬퍼
    pub fn tool_not_allowed(tool: impl Into<String>, agent: impl Into<String>) -> Self {
        Error::ToolNotAllowed {
            tool: tool.into(),
            agent: agent.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

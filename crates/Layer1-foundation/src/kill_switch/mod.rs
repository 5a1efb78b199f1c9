//! Kill Switch - 긴급 차단 스위치
//!
//! 에이전트 ID와 모델 ID를 비활성화 상태로 표시합니다.
//! 에이전트를 실행하거나 모델을 호출하기 전에 반드시 확인해야 하며,
//! 비활성화에 의한 거절은 재시도하지 않는 종료 조건입니다.
//!
//! ## 사용법
//!
//! ```ignore
//! use std::sync::Arc;
//! use steward_foundation::KillSwitch;
//!
//! let switch = Arc::new(KillSwitch::new());
//! switch.disable_model("gemini-1.5-pro");
//!
//! switch.ensure_enabled("payment_failed", Some("gemini-1.5-pro"))?; // Err(ModelDisabled)
//! ```

use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// "auto" 모델 ID (설정된 기본 모델로 치환됨)
pub const AUTO_MODEL: &str = "auto";

// ============================================================================
// DisabledEntities
// ============================================================================

/// 현재 비활성화된 엔티티 목록 (정렬됨)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledEntities {
    pub agents: Vec<String>,
    pub models: Vec<String>,
}

impl DisabledEntities {
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.models.is_empty()
    }
}

// ============================================================================
// KillSwitch
// ============================================================================

#[derive(Debug, Default)]
struct SwitchState {
    agents: HashSet<String>,
    models: HashSet<String>,
}

/// 프로세스 단위 긴급 차단 스위치
///
/// 두 집합을 하나의 `RwLock`으로 보호합니다. 모든 연산은 멱등적이며
/// 이력은 남기지 않습니다 (전환 기록이 필요하면 호출자가 AuditStore에 남깁니다).
#[derive(Debug)]
pub struct KillSwitch {
    state: RwLock<SwitchState>,
    auto_model: Option<String>,
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl KillSwitch {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SwitchState::default()),
            auto_model: None,
        }
    }

    /// "auto" 모델 ID를 치환할 기본 모델 설정
    pub fn with_auto_model(mut self, model: impl Into<String>) -> Self {
        self.auto_model = Some(model.into());
        self
    }

    /// 모델 ID 정규화 ("auto" → 기본 모델)
    pub fn resolve_model<'a>(&'a self, model_id: &'a str) -> &'a str {
        if model_id.trim().eq_ignore_ascii_case(AUTO_MODEL) {
            if let Some(ref default) = self.auto_model {
                return default.as_str();
            }
        }
        model_id
    }

    // ========================================================================
    // Agents
    // ========================================================================

    pub fn disable_agent(&self, agent_id: &str) {
        if self.state.write().agents.insert(agent_id.to_string()) {
            info!(agent_id = %agent_id, "Agent disabled");
        } else {
            debug!(agent_id = %agent_id, "Agent already disabled");
        }
    }

    pub fn enable_agent(&self, agent_id: &str) {
        if self.state.write().agents.remove(agent_id) {
            info!(agent_id = %agent_id, "Agent enabled");
        } else {
            debug!(agent_id = %agent_id, "Agent was not disabled");
        }
    }

    pub fn is_agent_disabled(&self, agent_id: &str) -> bool {
        self.state.read().agents.contains(agent_id)
    }

    // ========================================================================
    // Models
    // ========================================================================

    pub fn disable_model(&self, model_id: &str) {
        let model_id = self.resolve_model(model_id);
        if self.state.write().models.insert(model_id.to_string()) {
            info!(model_id = %model_id, "Model disabled");
        } else {
            debug!(model_id = %model_id, "Model already disabled");
        }
    }

    pub fn enable_model(&self, model_id: &str) {
        let model_id = self.resolve_model(model_id);
        if self.state.write().models.remove(model_id) {
            info!(model_id = %model_id, "Model enabled");
        } else {
            debug!(model_id = %model_id, "Model was not disabled");
        }
    }

    pub fn is_model_disabled(&self, model_id: &str) -> bool {
        let model_id = self.resolve_model(model_id);
        self.state.read().models.contains(model_id)
    }

    // ========================================================================
    // Guards
    // ========================================================================

    /// 에이전트가 비활성화되어 있으면 `Error::AgentDisabled`
    pub fn ensure_agent_enabled(&self, agent_id: &str) -> Result<()> {
        if self.is_agent_disabled(agent_id) {
            return Err(Error::AgentDisabled(agent_id.to_string()));
        }
        Ok(())
    }

    /// 모델이 비활성화되어 있으면 `Error::ModelDisabled`
    pub fn ensure_model_enabled(&self, model_id: &str) -> Result<()> {
        if self.is_model_disabled(model_id) {
            return Err(Error::ModelDisabled(self.resolve_model(model_id).to_string()));
        }
        Ok(())
    }

    /// 에이전트 → 모델 순서로 확인
    pub fn ensure_enabled(&self, agent_id: &str, model_id: Option<&str>) -> Result<()> {
        self.ensure_agent_enabled(agent_id)?;
        if let Some(model_id) = model_id {
            self.ensure_model_enabled(model_id)?;
        }
        Ok(())
    }

    /// 비활성화된 에이전트/모델 목록 (정렬됨)
    pub fn list_disabled(&self) -> DisabledEntities {
        let state = self.state.read();
        let mut agents: Vec<String> = state.agents.iter().cloned().collect();
        let mut models: Vec<String> = state.models.iter().cloned().collect();
        drop(state);

        agents.sort();
        models.sort();
        DisabledEntities { agents, models }
    }
}

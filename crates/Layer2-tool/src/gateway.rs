//! Tool Gateway - 허용 목록 + kill switch를 거친 도구 해석
//!
//! `get(name)`의 검사 순서:
//!
//! 1. Kill switch (에이전트 → 모델) → `AgentDisabled` / `ModelDisabled`
//! 2. 허용 목록 → `ToolNotAllowed`
//! 3. 도구 해석 → `ToolNotFound`
//!
//! 게이트웨이는 정책 평가나 감사 기록을 하지 않습니다. 모든 도구가 정책
//! 대상은 아니며, 감사에는 평가된 입력/출력이 남아야 하므로 호출자가
//! 게이트웨이 호출을 감쌉니다.

use crate::definition::ToolDefinition;
use crate::registry::ToolSource;
use crate::Tool;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use steward_foundation::{Error, KillSwitch, Result};
use tracing::{debug, warn};

/// 에이전트 하나에 대한 도구 게이트웨이
pub struct ToolGateway {
    agent_id: String,
    model_id: Option<String>,
    allowed: BTreeSet<String>,
    source: Arc<dyn ToolSource>,
    kill_switch: Arc<KillSwitch>,
    cache: Mutex<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolGateway {
    pub fn new<I, S>(
        agent_id: impl Into<String>,
        allowed: I,
        source: Arc<dyn ToolSource>,
        kill_switch: Arc<KillSwitch>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agent_id: agent_id.into(),
            model_id: None,
            allowed: allowed.into_iter().map(Into::into).collect(),
            source,
            kill_switch,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 호출에 사용할 모델 (kill switch 검사 대상)
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    /// 허용 목록 (정렬)
    pub fn allowed_tools(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }

    fn ensure_allowed(&self, name: &str) -> Result<()> {
        if !self.is_allowed(name) {
            warn!(agent_id = %self.agent_id, tool = %name, "Tool not in allow-list");
            return Err(Error::tool_not_allowed(name, &self.agent_id));
        }
        Ok(())
    }

    /// 도구 해석
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.kill_switch
            .ensure_enabled(&self.agent_id, self.model_id.as_deref())?;
        self.ensure_allowed(name)?;

        if let Some(tool) = self.cache.lock().get(name) {
            return Ok(Arc::clone(tool));
        }

        let tool = self
            .source
            .resolve(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;
        debug!(agent_id = %self.agent_id, tool = %name, "Tool resolved");

        self.cache
            .lock()
            .insert(name.to_string(), Arc::clone(&tool));
        Ok(tool)
    }

    /// 허용된 도구 중 해석 가능한 것들 (이름순, 실패는 건너뜀)
    pub fn resolve_tools(&self) -> Vec<(String, Arc<dyn Tool>)> {
        self.allowed
            .iter()
            .filter_map(|name| match self.get(name) {
                Ok(tool) => Some((name.clone(), tool)),
                Err(e) => {
                    warn!(agent_id = %self.agent_id, tool = %name, error = %e, "Skipping tool");
                    None
                }
            })
            .collect()
    }

    /// 허용된 도구의 정의
    pub fn definition(&self, name: &str) -> Result<ToolDefinition> {
        self.ensure_allowed(name)?;
        self.source
            .definition(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))
    }

    /// 해석 후 바로 실행
    pub async fn run(&self, name: &str, input: Value) -> Result<String> {
        let tool = self.get(name)?;
        tool.execute(input).await
    }

    /// 캐시 비우기 (도구 출처가 바뀌었을 때)
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

impl std::fmt::Debug for ToolGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolGateway")
            .field("agent_id", &self.agent_id)
            .field("model_id", &self.model_id)
            .field("allowed", &self.allowed)
            .finish()
    }
}

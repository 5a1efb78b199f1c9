//! Governed Agent - kill switch, 허용 목록, 정책, 감사를 거치는 도구 호출
//!
//! ```text
//! call_tool(name, input)
//!     │
//!     ├─ ToolGateway::get        (kill switch → allow-list → 해석)
//!     ├─ PolicyRegistry 평가      (tool_policies에 연결된 경우만) → policy_check
//!     ├─ Tool::execute                                          → tool_call
//!     └─ 거버넌스 거절                                            → decision
//! ```

use crate::conversation::ConversationBuffer;
use crate::definition::AgentDefinition;
use crate::refusal::{refusal_kind, refusal_message};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use steward_foundation::{AuditEntry, AuditStore, EventType, KillSwitch, Result};
use steward_policy::PolicyRegistry;
use steward_tool::{ToolGateway, ToolSource};
use tracing::{debug, info, info_span, warn, Instrument};

/// 거버넌스가 적용된 에이전트 세션
pub struct GovernedAgent {
    definition: AgentDefinition,
    gateway: ToolGateway,
    policies: Arc<PolicyRegistry>,
    audit: Arc<AuditStore>,
    conversation: ConversationBuffer,
}

impl GovernedAgent {
    /// 에이전트 생성
    ///
    /// 에이전트나 모델이 비활성화되어 있으면 `AgentDisabled` / `ModelDisabled`
    pub fn new(
        definition: AgentDefinition,
        source: Arc<dyn ToolSource>,
        policies: Arc<PolicyRegistry>,
        audit: Arc<AuditStore>,
        kill_switch: Arc<KillSwitch>,
    ) -> Result<Self> {
        if let Err(e) = kill_switch.ensure_enabled(&definition.id, definition.model.as_deref()) {
            warn!(agent_id = %definition.id, error = %e, "Agent construction refused");
            return Err(e);
        }

        let mut gateway = ToolGateway::new(
            definition.id.clone(),
            definition.allowed_tools.iter().cloned(),
            source,
            kill_switch,
        );
        if let Some(ref model) = definition.model {
            gateway = gateway.with_model(model.clone());
        }

        info!(
            agent_id = %definition.id,
            version = %definition.version,
            tools = definition.allowed_tools.len(),
            "Governed agent ready"
        );

        Ok(Self {
            definition,
            gateway,
            policies,
            audit,
            conversation: ConversationBuffer::default(),
        })
    }

    /// 대화 버퍼 교체 (설정에서 만든 버퍼 등)
    pub fn with_conversation(mut self, conversation: ConversationBuffer) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn gateway(&self) -> &ToolGateway {
        &self.gateway
    }

    pub fn conversation(&self) -> &ConversationBuffer {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut ConversationBuffer {
        &mut self.conversation
    }

    /// 이 에이전트의 최근 감사 기록 (최신순)
    pub fn audit_trail(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit.list_entries(Some(&self.definition.id), limit)
    }

    // ========================================================================
    // Tool calls
    // ========================================================================

    /// 거버넌스를 거친 도구 호출
    pub async fn call_tool(&self, name: &str, input: Value) -> Result<String> {
        let span = info_span!("tool_call", tool = %name, agent = %self.definition.id);
        async {
            match self.governed_call(name, input).await {
                Ok(output) => Ok(output),
                Err(e) => {
                    if let Some(kind) = refusal_kind(&e) {
                        warn!(kind, error = %e, "Tool call refused");
                        self.audit.append(
                            &self.definition.id,
                            EventType::DECISION,
                            json!({
                                "outcome": "refused",
                                "kind": kind,
                                "tool": name,
                                "reason": e.to_string(),
                            }),
                        );
                    }
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn governed_call(&self, name: &str, input: Value) -> Result<String> {
        let tool = self.gateway.get(name)?;

        if let Some(policy_id) = self.definition.policy_for_tool(name) {
            self.check_policy(policy_id, name, &input)?;
        }

        let started = Instant::now();
        let result = tool.execute(input.clone()).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let payload = match &result {
            Ok(output) => json!({
                "tool": name,
                "input": input,
                "output": output,
                "duration_ms": duration_ms,
            }),
            Err(e) => json!({
                "tool": name,
                "input": input,
                "error": e.to_string(),
                "duration_ms": duration_ms,
            }),
        };
        self.audit.append(&self.definition.id, EventType::TOOL_CALL, payload);

        match &result {
            Ok(_) => debug!(duration_ms, "Tool call completed"),
            Err(e) => warn!(duration_ms, error = %e, "Tool call failed"),
        }
        result
    }

    /// 정책 평가 후 `policy_check` 기록, 거부면 에러
    fn check_policy(&self, policy_id: &str, tool: &str, input: &Value) -> Result<()> {
        let verdict = match self.policies.evaluate(policy_id, input) {
            Ok(verdict) => verdict,
            Err(e) => {
                self.audit.append(
                    &self.definition.id,
                    EventType::POLICY_CHECK,
                    json!({
                        "policy": policy_id,
                        "tool": tool,
                        "input": input,
                        "error": e.to_string(),
                    }),
                );
                return Err(e);
            }
        };

        self.audit.append(
            &self.definition.id,
            EventType::POLICY_CHECK,
            json!({
                "policy": policy_id,
                "tool": tool,
                "input": input,
                "verdict": verdict,
            }),
        );
        debug!(policy_id = %policy_id, allowed = verdict.allowed, reason = %verdict.reason, "Policy checked");

        verdict.into_result(policy_id).map(|_| ())
    }

    // ========================================================================
    // Conversation turn
    // ========================================================================

    /// 사용자 발화 하나에 대한 도구 턴
    ///
    /// 사용자 입력을 기록하고 도구를 호출한 뒤 결과(또는 거절 메시지)를
    /// 응답으로 기록합니다. 빈 출력은 응답 없음으로 취급합니다.
    /// 거버넌스 거절이 아닌 에러는 그대로 전파됩니다.
    pub async fn handle_tool_turn(
        &mut self,
        user_text: impl Into<String>,
        tool: &str,
        input: Value,
    ) -> Result<Option<String>> {
        self.conversation.append_user(user_text);

        let response = match self.call_tool(tool, input).await {
            Ok(output) => Some(output).filter(|o| !o.trim().is_empty()),
            Err(e) => match refusal_message(&e) {
                Some(message) => Some(message),
                None => return Err(e),
            },
        };
        Ok(self.conversation.record_response(response))
    }
}

impl std::fmt::Debug for GovernedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernedAgent")
            .field("id", &self.definition.id)
            .field("version", &self.definition.version)
            .field("gateway", &self.gateway)
            .finish()
    }
}

//! # steward-agent
//!
//! 거버넌스가 적용된 에이전트 런타임입니다.
//!
//! ## 핵심 컴포넌트
//!
//! - **ConversationBuffer**: 최근 N개 메시지만 보관하는 세션 대화
//! - **AgentDefinition**: 에이전트 정의 + 변경 분류 / 버전 계산
//! - **GovernedAgent**: kill switch → 허용 목록 → 정책 → 실행 → 감사
//! - **refusal_message**: 거버넌스 거절을 사용자 응답으로 변환
//!
//! ## 사용 예
//!
//! ```ignore
//! use steward_agent::{AgentDefinition, GovernedAgent};
//!
//! let definition = AgentDefinition::new("payment_failed")
//!     .with_model("gemini-2.5-flash")
//!     .with_tool("get_payment_exception")
//!     .with_tool("execute_payment_retry")
//!     .with_tool_policy("execute_payment_retry", "payments/retry");
//!
//! let mut agent = GovernedAgent::new(definition, tools, policies, audit, kill_switch)?;
//! let reply = agent
//!     .handle_tool_turn("Retry EX-2025-001", "execute_payment_retry", input)
//!     .await?;
//! ```

pub mod conversation;
pub mod definition;
pub mod governed;
pub mod refusal;

pub use conversation::{ConversationBuffer, Message, Role};
pub use definition::{calculate_new_agent_version, detect_agent_changes, AgentDefinition};
pub use governed::GovernedAgent;
pub use refusal::refusal_message;

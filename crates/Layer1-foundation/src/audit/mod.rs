//! Audit System - 감사 로깅 시스템
//!
//! 도구 호출, 정책 검사, 거버넌스 결정을 기록합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AuditStore                              │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │  append() ──► Mutex<VecDeque>  (max_memory, FIFO)   │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │         │                                                   │
//! │         ▼ bounded channel (try_send, 가득 차면 drop)         │
//! │  ┌──────────────┐                                           │
//! │  │ audit-mirror │ ──► AuditSink (JsonlFileSink)              │
//! │  └──────────────┘                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용법
//!
//! ```ignore
//! use steward_foundation::audit::{AuditQuery, AuditStore, EventType};
//!
//! // 1. 저장소 생성
//! let store = Arc::new(AuditStore::new(&config.audit)?);
//!
//! // 2. 기록
//! store.append("payment_failed", EventType::POLICY_CHECK, json!({
//!     "policy": "payments/retry",
//!     "allowed": false,
//! }));
//!
//! // 3. 조회
//! let query = AuditQuery::new()
//!     .with_agent("payment_failed")
//!     .with_event_types(vec![EventType::POLICY_CHECK])
//!     .with_limit(100);
//! let entries = store.query(&query);
//! ```
//!
//! ## 이벤트 타입
//!
//! | 타입 | 기록 시점 |
//! |------|----------|
//! | `tool_call` | 도구 실행 완료 (입력, 출력/에러, duration_ms) |
//! | `policy_check` | 정책 평가 (입력, verdict) |
//! | `decision` | 거버넌스 거절 |
//! | `kill_switch` | 차단 스위치 변경 (호출자 기록) |

pub mod sink;
pub mod store;
pub mod types;

// Re-exports
pub use sink::{AuditSink, JsonlFileSink};
pub use store::AuditStore;
pub use types::{AuditEntry, AuditId, AuditQuery, AuditStatistics, EventType};

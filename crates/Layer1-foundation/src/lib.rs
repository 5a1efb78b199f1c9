//! # steward-foundation
//!
//! Foundation layer for Steward:
//! - Error: 거버넌스 에러 분류 (disabled / denied / not-found / malformed)
//! - Config: 통합 설정 (StewardConfig, 글로벌 + 프로젝트 + 환경변수)
//! - Storage: JsonStore (범용 JSON 파일 저장소)
//! - KillSwitch: 에이전트/모델 긴급 차단
//! - Audit: 감사 로그 저장소 + JSONL 미러
//! - Version: SemVer, ChangeSet, ChangelogEntry
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Agent turn                                              │
//! │      │                                                   │
//! │      ▼                                                   │
//! │  KillSwitch ──► ToolGateway (allow-list) ──► Policy      │
//! │                     │                          │         │
//! │                     ▼                          ▼         │
//! │                 Tool::execute            AuditStore      │
//! │                                          (memory + JSONL)│
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod kill_switch;
pub mod storage;
pub mod version;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    AuditConfig, ConversationConfig, ModelConfig, PolicyConfig, StewardConfig,
    STEWARD_CONFIG_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;

// ============================================================================
// Kill Switch
// ============================================================================
pub use kill_switch::{DisabledEntities, KillSwitch, AUTO_MODEL};

// ============================================================================
// Audit (감사 로깅)
// ============================================================================
pub use audit::{
    AuditEntry, AuditId, AuditQuery, AuditSink, AuditStatistics, AuditStore, EventType,
    JsonlFileSink,
};

// ============================================================================
// Version (버전 관리)
// ============================================================================
pub use version::{
    calculate_new_version, compare_sets, format_version, parse_version, BumpLevel, ChangeSet,
    ChangelogEntry, SemVer,
};

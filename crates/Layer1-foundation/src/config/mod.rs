//! Config - 통합 설정 관리
//!
//! - `steward.rs` - StewardConfig 통합 설정 (audit, policies, conversation, models)

mod steward;

pub use steward::{
    AuditConfig, ConversationConfig, ModelConfig, PolicyConfig, StewardConfig,
    DEFAULT_AUDIT_MAX_MEMORY, DEFAULT_MIRROR_CAPACITY, DEFAULT_RETENTION_DAYS, ENV_AUDIT_LOG,
    ENV_AUDIT_MAX_MEMORY, ENV_POLICIES_DIR, ENV_POLICIES_DIR_LEGACY, STEWARD_CONFIG_FILE,
};

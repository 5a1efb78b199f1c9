//! Steward Config - 통합 설정
//!
//! 감사 로그, 정책 디렉토리, 대화 버퍼, 모델 기본값을 하나로 관리하는
//! StewardConfig. 글로벌 → 프로젝트 → 환경변수 순서로 덮어씁니다.
//!
//! 파일 레이어는 raw JSON 상태로 병합됩니다. 파일에 적힌 키는 값이 기본값과
//! 같더라도 아래 레이어를 덮어쓰고, 적히지 않은 키는 그대로 둡니다.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// 설정 파일명
pub const STEWARD_CONFIG_FILE: &str = "steward.json";

/// 감사 로그 인메모리 최대 엔트리 수
pub const DEFAULT_AUDIT_MAX_MEMORY: usize = 10_000;

/// 감사 로그 보관 기간 (일, 정보성 메타데이터)
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// 미러 채널에 대기할 수 있는 최대 엔트리 수
pub const DEFAULT_MIRROR_CAPACITY: usize = 1024;

/// 환경변수 이름
pub const ENV_POLICIES_DIR: &str = "STEWARD_POLICIES_DIR";
pub const ENV_POLICIES_DIR_LEGACY: &str = "POLICIES_DIR";
pub const ENV_AUDIT_LOG: &str = "STEWARD_AUDIT_LOG";
pub const ENV_AUDIT_MAX_MEMORY: &str = "STEWARD_AUDIT_MAX_MEMORY";

// ============================================================================
// Steward Config (통합)
// ============================================================================

/// Steward 통합 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StewardConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 감사 로그 설정
    #[serde(default)]
    pub audit: AuditConfig,

    /// 정책 설정
    #[serde(default)]
    pub policies: PolicyConfig,

    /// 대화 버퍼 설정
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// 모델 설정
    #[serde(default)]
    pub models: ModelConfig,
}

impl Default for StewardConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            audit: AuditConfig::default(),
            policies: PolicyConfig::default(),
            conversation: ConversationConfig::default(),
            models: ModelConfig::default(),
        }
    }
}

impl StewardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드 후 환경변수 적용
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(layer) = global.load_optional::<Value>(STEWARD_CONFIG_FILE)? {
                config.merge_layer(&layer)?;
            }
        }

        // 2. 프로젝트 설정
        if let Ok(project) = JsonStore::current_project() {
            if let Some(layer) = project.load_optional::<Value>(STEWARD_CONFIG_FILE)? {
                config.merge_layer(&layer)?;
            }
        }

        // 3. 환경변수
        config.apply_env_overrides()?;

        Ok(config)
    }

    /// 특정 저장소에서만 로드 (환경변수 미적용)
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Ok(store
            .load_optional::<StewardConfig>(STEWARD_CONFIG_FILE)?
            .unwrap_or_default())
    }

    /// 저장
    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(STEWARD_CONFIG_FILE, self)
    }

    // ========================================================================
    // Environment
    // ========================================================================

    /// 프로세스 환경변수 적용
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// 임의의 lookup 함수로 환경변수 적용
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty(ENV_POLICIES_DIR).or_else(|| non_empty(ENV_POLICIES_DIR_LEGACY)) {
            self.policies.dir = Some(PathBuf::from(dir));
        }

        if let Some(path) = non_empty(ENV_AUDIT_LOG) {
            self.audit.mirror_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = non_empty(ENV_AUDIT_MAX_MEMORY) {
            let max_memory = raw.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("{} must be a positive integer, got {:?}", ENV_AUDIT_MAX_MEMORY, raw))
            })?;
            self.audit.max_memory = max_memory;
        }

        self.validate()
    }

    /// 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.audit.max_memory == 0 {
            return Err(Error::Config("audit.maxMemory must be greater than 0".to_string()));
        }
        if self.audit.mirror_capacity == 0 {
            return Err(Error::Config(
                "audit.mirrorCapacity must be greater than 0".to_string(),
            ));
        }
        if self.conversation.max_messages == 0 {
            return Err(Error::Config(
                "conversation.maxMessages must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 설정 파일 하나(raw JSON)를 덮어씀
    ///
    /// 레이어에 있는 키만 적용됩니다. `null`은 선택 값(`mirrorPath` 등)을 해제합니다.
    pub fn merge_layer(&mut self, layer: &Value) -> Result<()> {
        if !layer.is_object() {
            return Err(Error::Config(format!(
                "{} must contain a JSON object",
                STEWARD_CONFIG_FILE
            )));
        }

        let mut merged = serde_json::to_value(&*self)?;
        deep_merge(&mut merged, layer);
        *self = serde_json::from_value(merged)?;
        Ok(())
    }
}

fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_map.insert(key.clone(), overlay_val.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

// ============================================================================
// Audit Config
// ============================================================================

/// 감사 로그 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// 인메모리 최대 엔트리 수 (초과 시 가장 오래된 것부터 제거)
    #[serde(default = "default_max_memory")]
    pub max_memory: usize,

    /// 보관 기간 (일). 자동 제거는 개수 기준이며 이 값은 메타데이터입니다.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// JSONL 미러 파일 경로 (없으면 메모리 전용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_path: Option<PathBuf>,

    /// 미러 채널 크기. 가득 차면 새 엔트리는 미러에서 빠지고 메모리에만 남습니다.
    #[serde(default = "default_mirror_capacity")]
    pub mirror_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_memory: default_max_memory(),
            retention_days: default_retention_days(),
            mirror_path: None,
            mirror_capacity: default_mirror_capacity(),
        }
    }
}

impl AuditConfig {
    /// 메모리 전용 설정
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_max_memory(mut self, max_memory: usize) -> Self {
        self.max_memory = max_memory;
        self
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    pub fn with_mirror(mut self, path: impl Into<PathBuf>) -> Self {
        self.mirror_path = Some(path.into());
        self
    }

    pub fn with_mirror_capacity(mut self, capacity: usize) -> Self {
        self.mirror_capacity = capacity;
        self
    }
}

// ============================================================================
// Policy Config
// ============================================================================

/// 정책 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// 정책 파일 디렉토리 (`<domain>/<name>.toml`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// ============================================================================
// Conversation Config
// ============================================================================

/// 대화 버퍼 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationConfig {
    /// 보관할 최대 메시지 수
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// LLM 컨텍스트 렌더링 시 메시지당 최대 문자 수
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_content_len: default_max_content_len(),
        }
    }
}

// ============================================================================
// Model Config
// ============================================================================

/// 모델 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// 모델 ID가 "auto"일 때 kill switch 확인에 사용할 실제 모델
    #[serde(default = "default_auto_model")]
    pub auto_default: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            auto_default: default_auto_model(),
        }
    }
}

// ============================================================================
// Default 값
// ============================================================================

fn default_version() -> u32 {
    1
}

fn default_max_memory() -> usize {
    DEFAULT_AUDIT_MAX_MEMORY
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_mirror_capacity() -> usize {
    DEFAULT_MIRROR_CAPACITY
}

fn default_max_messages() -> usize {
    20
}

fn default_max_content_len() -> usize {
    500
}

fn default_auto_model() -> String {
    "gemini-2.5-flash".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StewardConfig::default();
        assert_eq!(config.audit.max_memory, 10_000);
        assert_eq!(config.audit.retention_days, 90);
        assert!(config.audit.mirror_path.is_none());
        assert_eq!(config.audit.mirror_capacity, DEFAULT_MIRROR_CAPACITY);
        assert_eq!(config.conversation.max_messages, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_version_matches_serde_default() {
        let parsed: StewardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(StewardConfig::default().version, 1);
        assert_eq!(parsed.version, StewardConfig::default().version);
    }

    #[test]
    fn test_merge_layer_prefers_later_layer() {
        let mut config = StewardConfig::default();
        config
            .merge_layer(&json!({
                "audit": { "maxMemory": 50 },
                "policies": { "dir": "/etc/steward/policies" }
            }))
            .unwrap();

        assert_eq!(config.audit.max_memory, 50);
        assert_eq!(config.audit.retention_days, 90);
        assert_eq!(config.policies.dir, Some(PathBuf::from("/etc/steward/policies")));
    }

    #[test]
    fn test_project_layer_can_reset_to_default() {
        let mut config = StewardConfig::default();
        config
            .merge_layer(&json!({
                "audit": { "maxMemory": 50, "mirrorPath": "/var/log/global.jsonl" },
                "models": { "autoDefault": "gpt-4o" }
            }))
            .unwrap();

        // 프로젝트 파일이 기본값을 명시적으로 다시 적은 경우
        config
            .merge_layer(&json!({
                "audit": { "maxMemory": DEFAULT_AUDIT_MAX_MEMORY, "mirrorPath": null },
                "models": { "autoDefault": "gemini-2.5-flash" }
            }))
            .unwrap();

        assert_eq!(config.audit.max_memory, DEFAULT_AUDIT_MAX_MEMORY);
        assert!(config.audit.mirror_path.is_none());
        assert_eq!(config.models.auto_default, "gemini-2.5-flash");
    }

    #[test]
    fn test_merge_layer_rejects_non_object() {
        let mut config = StewardConfig::default();
        assert!(matches!(
            config.merge_layer(&json!([1, 2])).unwrap_err(),
            Error::Config(_)
        ));
        assert!(config.merge_layer(&json!({"audit": {"maxMemory": "many"}})).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_POLICIES_DIR_LEGACY, "/srv/policies"),
            (ENV_AUDIT_LOG, "/var/log/steward/audit.jsonl"),
            (ENV_AUDIT_MAX_MEMORY, "250"),
        ]);

        let mut config = StewardConfig::default();
        config
            .apply_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.policies.dir, Some(PathBuf::from("/srv/policies")));
        assert_eq!(
            config.audit.mirror_path,
            Some(PathBuf::from("/var/log/steward/audit.jsonl"))
        );
        assert_eq!(config.audit.max_memory, 250);
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = StewardConfig::default();
        let err = config
            .apply_overrides_from(|key| (key == ENV_AUDIT_MAX_MEMORY).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let mut config = StewardConfig::default();
        config.conversation.max_messages = 8;
        config.save_to(&store).unwrap();

        let loaded = StewardConfig::load_from(&store).unwrap();
        assert_eq!(loaded.conversation.max_messages, 8);
        assert_eq!(loaded.audit.max_memory, 10_000);
    }
}

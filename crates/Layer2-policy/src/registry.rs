//! Policy Registry - 정책 ID → 컴파일된 정책
//!
//! 정책 디렉토리의 `<domain>/<name>.toml` 파일이 `"<domain>/<name>"` ID로
//! 등록됩니다. 도메인은 ID의 첫 번째 구간에서 매번 계산합니다.
//!
//! 로드 이후에는 변경되지 않으며 `Arc<PolicyRegistry>`로 공유합니다.

use crate::builtin::builtin_policies;
use crate::policy::{Policy, Verdict};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use steward_foundation::{Error, Result};
use tracing::{debug, info};

/// 정책 파일 확장자
pub const POLICY_EXTENSION: &str = "toml";

/// 도메인이 없는 ID의 도메인
pub const DEFAULT_DOMAIN: &str = "general";

// ============================================================================
// PolicyInfo
// ============================================================================

/// 정책 목록 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInfo {
    pub id: String,
    /// 정책 파일 경로 (내장 정책은 None)
    pub path: Option<PathBuf>,
    pub domain: String,
}

/// 정책 ID의 도메인 (첫 번째 구간)
pub fn policy_domain(policy_id: &str) -> &str {
    match policy_id.split_once('/') {
        Some((domain, _)) if !domain.is_empty() => domain,
        _ => DEFAULT_DOMAIN,
    }
}

/// 정책 ID 정규화 (역슬래시 → 슬래시, 앞뒤 슬래시 제거)
pub fn normalize_policy_id(policy_id: &str) -> String {
    policy_id
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// PolicyRegistry
// ============================================================================

#[derive(Debug, Clone)]
struct RegisteredPolicy {
    policy: Policy,
    path: Option<PathBuf>,
}

/// 정책 레지스트리
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, RegisteredPolicy>,
}

impl PolicyRegistry {
    /// 빈 레지스트리
    pub fn new() -> Self {
        Self::default()
    }

    /// 내장 정책만 등록된 레지스트리
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for (id, policy) in builtin_policies()? {
            registry.register(id, policy);
        }
        Ok(registry)
    }

    /// 디렉토리에서 로드 (내장 정책 포함)
    ///
    /// 디렉토리가 없으면 내장 정책만 등록됩니다. 파싱할 수 없는 파일이
    /// 하나라도 있으면 파일 이름을 담은 `Error::Config`로 실패합니다.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::with_builtins()?;

        if !dir.is_dir() {
            info!(dir = %dir.display(), "Policy directory not found, using built-in policies");
            return Ok(registry);
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .parents(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut loaded = 0usize;
        for entry in walker {
            let entry = entry.map_err(|e| {
                Error::Config(format!("Failed to walk {}: {}", dir.display(), e))
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(POLICY_EXTENSION) {
                continue;
            }

            let id = policy_id_for(dir, path)?;
            let source = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
            let policy = Policy::from_toml_str(&source).map_err(|e| {
                let detail = match e {
                    Error::Config(msg) => msg,
                    other => other.to_string(),
                };
                Error::Config(format!("Invalid policy file {}: {}", path.display(), detail))
            })?;

            debug!(policy_id = %id, path = %path.display(), "Policy loaded");
            registry.insert(id, policy, Some(path.to_path_buf()));
            loaded += 1;
        }

        info!(dir = %dir.display(), loaded, total = registry.len(), "Policy registry loaded");
        Ok(registry)
    }

    /// 정책 등록 (같은 ID는 덮어씀)
    pub fn register(&mut self, policy_id: &str, policy: Policy) {
        self.insert(normalize_policy_id(policy_id), policy, None);
    }

    fn insert(&mut self, id: String, policy: Policy, path: Option<PathBuf>) {
        if self.policies.insert(id.clone(), RegisteredPolicy { policy, path }).is_some() {
            debug!(policy_id = %id, "Policy overridden");
        }
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// 등록된 정책 목록 (ID 순)
    pub fn list_policies(&self) -> Vec<PolicyInfo> {
        self.policies
            .iter()
            .map(|(id, registered)| PolicyInfo {
                id: id.clone(),
                path: registered.path.clone(),
                domain: policy_domain(id).to_string(),
            })
            .collect()
    }

    /// 도메인 목록 (정렬, 중복 없음)
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .policies
            .keys()
            .map(|id| policy_domain(id).to_string())
            .collect();
        domains.sort();
        domains.dedup();
        domains
    }

    pub fn get(&self, policy_id: &str) -> Option<&Policy> {
        self.policies
            .get(&normalize_policy_id(policy_id))
            .map(|registered| &registered.policy)
    }

    pub fn contains(&self, policy_id: &str) -> bool {
        self.get(policy_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    // ========================================================================
    // Evaluate
    // ========================================================================

    /// 정책 평가
    ///
    /// 알 수 없는 ID는 에러가 아니라 `"Policy not found: {id}"` reason의
    /// 거부 판정입니다. 에러는 잘못된 입력일 때만 반환됩니다.
    pub fn evaluate(&self, policy_id: &str, input: &Value) -> Result<Verdict> {
        let Some(policy) = self.get(policy_id) else {
            debug!(policy_id = %policy_id, "Unknown policy");
            return Ok(Verdict::not_found(policy_id));
        };

        let verdict = policy.evaluate(input)?;
        debug!(
            policy_id = %policy_id,
            allowed = verdict.allowed,
            reason = %verdict.reason,
            "Policy evaluated"
        );
        Ok(verdict)
    }

    /// 정책 평가 후 거부를 에러로 변환 (`Verdict::into_result`)
    pub fn enforce(&self, policy_id: &str, input: &Value) -> Result<Verdict> {
        self.evaluate(policy_id, input)?.into_result(policy_id)
    }
}

/// 정책 파일 경로 → 정책 ID (`payments/retry.toml` → `payments/retry`)
fn policy_id_for(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        Error::Config(format!(
            "Policy file {} is outside {}",
            path.display(),
            root.display()
        ))
    })?;
    let without_ext = relative.with_extension("");
    let id = normalize_policy_id(&without_ext.to_string_lossy());
    if id.is_empty() {
        return Err(Error::Config(format!("Cannot derive policy id from {}", path.display())));
    }
    Ok(id)
}

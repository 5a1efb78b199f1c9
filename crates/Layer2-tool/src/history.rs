//! Versioned tool store - 도구별 버전 기록과 변경 이력
//!
//! 도구 정의가 수정될 때마다 `publish`로 새 버전을 계산하고 changelog를
//! 남깁니다. 키는 `"<domain>/<name>"`이며 필요할 때 `JsonStore`로 저장합니다.

use crate::definition::ToolDefinition;
use crate::versioning::{calculate_new_tool_version, detect_tool_changes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use steward_foundation::{BumpLevel, ChangeSet, ChangelogEntry, Error, JsonStore, Result};
use tracing::{debug, info};

/// 저장 파일명
pub const TOOL_HISTORY_FILE: &str = "tools/history.json";

/// 도구 하나의 버전 기록
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolHistory {
    /// 버전 순서대로 (마지막이 최신)
    pub versions: Vec<ToolDefinition>,
    pub changelog: Vec<ChangelogEntry>,
}

impl ToolHistory {
    pub fn latest(&self) -> Option<&ToolDefinition> {
        self.versions.last()
    }
}

/// 버전 관리되는 도구 저장소
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionedToolStore {
    tools: BTreeMap<String, ToolHistory>,
}

impl VersionedToolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 정의 게시
    ///
    /// - 처음 게시: 주어진 버전을 그대로 기록하고 "initial version" 패치 노트를 남깁니다.
    /// - 이후 게시: 최신 정의와 비교해 다음 버전을 계산합니다. 변경이 없으면
    ///   아무것도 기록하지 않고 버전이 그대로인 엔트리를 돌려줍니다.
    ///   `auto_bump == false`이면 최신 정의를 같은 버전으로 교체합니다.
    pub fn publish(
        &mut self,
        definition: ToolDefinition,
        changed_by: Option<String>,
        auto_bump: bool,
    ) -> Result<ChangelogEntry> {
        let key = definition.key();
        // 검증 실패 시 빈 기록이 남지 않도록 맵에 넣기 전에 확인
        if self.latest(&key).is_none() {
            definition.semver()?;
        }
        let history = self.tools.entry(key.clone()).or_default();

        let Some(latest) = history.latest() else {
            let mut changes = ChangeSet::new();
            changes.push(BumpLevel::Patch, "initial version");
            let entry = ChangelogEntry::new(None, definition.version.clone(), changes, changed_by);

            info!(tool = %key, version = %entry.version, "Tool published");
            history.versions.push(definition);
            history.changelog.push(entry.clone());
            return Ok(entry);
        };

        let previous = latest.version.clone();
        let changes = detect_tool_changes(latest, &definition);
        let (version, changes) = calculate_new_tool_version(&previous, changes, auto_bump)?;
        let entry = ChangelogEntry::new(Some(previous.clone()), version.clone(), changes, changed_by);

        if entry.changes.is_empty() {
            debug!(tool = %key, version = %previous, "No changes detected");
            return Ok(entry);
        }

        let definition = ToolDefinition { version, ..definition };
        if entry.is_bump() {
            history.versions.push(definition);
        } else if let Some(last) = history.versions.last_mut() {
            *last = definition;
        }
        history.changelog.push(entry.clone());

        info!(
            tool = %key,
            from = %previous,
            to = %entry.version,
            changes = entry.changes.all().count(),
            "Tool version updated"
        );
        Ok(entry)
    }

    /// 최신 정의
    pub fn latest(&self, key: &str) -> Option<&ToolDefinition> {
        self.tools.get(key).and_then(ToolHistory::latest)
    }

    /// 특정 버전 정의
    pub fn get(&self, key: &str, version: &str) -> Option<&ToolDefinition> {
        self.tools
            .get(key)?
            .versions
            .iter()
            .rev()
            .find(|def| def.version == version)
    }

    /// 기록된 버전 목록 (오래된 순)
    pub fn versions(&self, key: &str) -> Vec<String> {
        self.tools
            .get(key)
            .map(|h| h.versions.iter().map(|d| d.version.clone()).collect())
            .unwrap_or_default()
    }

    /// 변경 이력 (오래된 순)
    pub fn history(&self, key: &str) -> &[ChangelogEntry] {
        self.tools
            .get(key)
            .map(|h| h.changelog.as_slice())
            .unwrap_or(&[])
    }

    /// 도메인 목록 (정렬, 중복 없음)
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .tools
            .values()
            .filter_map(|h| h.latest().map(|d| d.domain.clone()))
            .collect();
        domains.sort();
        domains.dedup();
        domains
    }

    /// 저장된 키 목록 (정렬)
    pub fn keys(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn save(&self, store: &JsonStore) -> Result<()> {
        store.save(TOOL_HISTORY_FILE, self)
    }

    /// 저장된 기록 로드 (파일이 없으면 빈 저장소)
    pub fn load(store: &JsonStore) -> Result<Self> {
        let loaded: Self = store.load_optional(TOOL_HISTORY_FILE)?.unwrap_or_default();
        for (key, history) in &loaded.tools {
            for def in &history.versions {
                def.semver().map_err(|e| {
                    Error::Config(format!("Invalid stored version for {}: {}", key, e))
                })?;
            }
        }
        Ok(loaded)
    }
}

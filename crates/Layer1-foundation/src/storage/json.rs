//! JSON 문서 저장소
//!
//! 하나의 디렉토리 아래에 이름으로 구분되는 JSON 문서를 둡니다.
//! 이름에 `/`가 있으면 하위 디렉토리가 됩니다 (예: `tools/history.json`).

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 글로벌 / 프로젝트 설정 디렉토리 이름
const STEWARD_DIR: &str = "steward";
const PROJECT_DIR: &str = ".steward";

#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.config/steward/`
    pub fn global() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?;
        Ok(Self::new(config_dir.join(STEWARD_DIR)))
    }

    /// `<cwd>/.steward/`
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::new(cwd.join(PROJECT_DIR)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 문서 로드, 파일이 없으면 `None`
    ///
    /// 파일은 있는데 읽거나 파싱할 수 없으면 경로를 포함한 `Config` 에러입니다.
    pub fn load_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.root.join(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Config(format!("Failed to read {}: {}", path.display(), e)))
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// 문서 저장
    ///
    /// 같은 디렉토리의 임시 파일에 쓴 뒤 rename 하므로 읽는 쪽은
    /// 이전 내용 또는 새 내용 중 하나만 봅니다.
    pub fn save<T: Serialize>(&self, name: &str, document: &T) -> Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, content)
            .and_then(|()| std::fs::rename(&staging, &path))
            .map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Limits {
        max_retries: u32,
        max_amount: u64,
    }

    #[test]
    fn test_save_nested_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let limits = Limits {
            max_retries: 3,
            max_amount: 10_000,
        };

        store.save("policies/payments.json", &limits).unwrap();
        assert!(!dir.path().join("policies/payments.json.tmp").exists());

        let loaded: Option<Limits> = store.load_optional("policies/payments.json").unwrap();
        assert_eq!(loaded, Some(limits));
    }

    #[test]
    fn test_missing_document_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("never-created"));
        let loaded: Option<Limits> = store.load_optional("steward.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_document_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("steward.json"), "{ not json").unwrap();

        let err = JsonStore::new(dir.path())
            .load_optional::<Limits>("steward.json")
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("steward.json")));
    }
}

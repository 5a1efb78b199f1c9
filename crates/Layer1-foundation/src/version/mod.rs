//! Semantic Versioning - 정의 버전 관리 공통 타입
//!
//! Tool/Agent 정의가 변경될 때 다음 버전을 계산하기 위한 공통 요소입니다.
//!
//! - `SemVer` - `MAJOR.MINOR.PATCH` 파싱/포맷
//! - `ChangeSet` - 심각도별 변경 내역 (major / minor / patch)
//! - `ChangelogEntry` - 버전 변경 기록

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

lazy_static::lazy_static! {
    static ref VERSION_PATTERN: regex::Regex =
        regex::Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("valid version pattern");
}

// ============================================================================
// SemVer
// ============================================================================

/// `MAJOR.MINOR.PATCH` 버전
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// 변경 내역에 따라 다음 버전 계산
    ///
    /// major > minor > patch 순서로 첫 번째 매칭만 적용되며
    /// 하위 자리는 0으로 초기화됩니다. 올릴 자리가 `u64::MAX`면
    /// `InvalidVersion`을 반환합니다.
    pub fn bump(self, changes: &ChangeSet) -> Result<Self> {
        let overflow = || Error::InvalidVersion(self.to_string());
        Ok(match changes.level() {
            Some(BumpLevel::Major) => {
                Self::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
            }
            Some(BumpLevel::Minor) => {
                Self::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            Some(BumpLevel::Patch) => {
                Self::new(self.major, self.minor, self.patch.checked_add(1).ok_or_else(overflow)?)
            }
            None => self,
        })
    }
}

impl FromStr for SemVer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = VERSION_PATTERN
            .captures(s)
            .ok_or_else(|| Error::InvalidVersion(s.to_string()))?;

        let part = |i: usize| -> Result<u64> {
            caps[i]
                .parse::<u64>()
                .map_err(|_| Error::InvalidVersion(s.to_string()))
        };

        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for SemVer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemVer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// 버전 문자열 파싱 → (major, minor, patch)
pub fn parse_version(version: &str) -> Result<(u64, u64, u64)> {
    let v: SemVer = version.parse()?;
    Ok((v.major, v.minor, v.patch))
}

/// (major, minor, patch) → 버전 문자열
pub fn format_version(major: u64, minor: u64, patch: u64) -> String {
    SemVer::new(major, minor, patch).to_string()
}

// ============================================================================
// ChangeSet
// ============================================================================

/// 버전 증가 단위
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    Patch,
    Minor,
    Major,
}

/// 심각도별 변경 내역
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub major: Vec<String>,
    #[serde(default)]
    pub minor: Vec<String>,
    #[serde(default)]
    pub patch: Vec<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.major.is_empty() && self.minor.is_empty() && self.patch.is_empty()
    }

    /// 가장 높은 심각도
    pub fn level(&self) -> Option<BumpLevel> {
        if !self.major.is_empty() {
            Some(BumpLevel::Major)
        } else if !self.minor.is_empty() {
            Some(BumpLevel::Minor)
        } else if !self.patch.is_empty() {
            Some(BumpLevel::Patch)
        } else {
            None
        }
    }

    pub fn push(&mut self, level: BumpLevel, description: impl Into<String>) {
        let bucket = match level {
            BumpLevel::Major => &mut self.major,
            BumpLevel::Minor => &mut self.minor,
            BumpLevel::Patch => &mut self.patch,
        };
        bucket.push(description.into());
    }

    /// 두 값이 다르면 "`field` changed: old -> new" 기록
    pub fn record_changed<T: PartialEq + fmt::Display + ?Sized>(
        &mut self,
        level: BumpLevel,
        field: &str,
        old: &T,
        new: &T,
    ) {
        if old != new {
            self.push(level, format!("{} changed: {} -> {}", field, old, new));
        }
    }

    /// 집합 비교 결과를 "`field` added: ..." / "`field` removed: ..." 로 기록
    pub fn record_set_diff(
        &mut self,
        level: BumpLevel,
        field: &str,
        old: &BTreeSet<String>,
        new: &BTreeSet<String>,
    ) {
        let (added, removed) = compare_sets(old, new);
        if !added.is_empty() {
            self.push(level, format!("{} added: {}", field, added.join(", ")));
        }
        if !removed.is_empty() {
            self.push(level, format!("{} removed: {}", field, removed.join(", ")));
        }
    }

    /// 모든 변경 내역 (major → minor → patch 순)
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.major
            .iter()
            .chain(self.minor.iter())
            .chain(self.patch.iter())
            .map(String::as_str)
    }
}

/// 두 집합 비교 → (추가된 항목, 제거된 항목), 각각 정렬됨
pub fn compare_sets(old: &BTreeSet<String>, new: &BTreeSet<String>) -> (Vec<String>, Vec<String>) {
    let added = new.difference(old).cloned().collect();
    let removed = old.difference(new).cloned().collect();
    (added, removed)
}

/// 다음 버전 계산
///
/// 버전 형식은 `auto_bump` 여부와 관계없이 항상 검증합니다.
/// `auto_bump == false`면 입력 버전을 그대로 반환합니다.
pub fn calculate_new_version(old_version: &str, changes: &ChangeSet, auto_bump: bool) -> Result<String> {
    let current: SemVer = old_version.parse()?;
    if !auto_bump {
        return Ok(old_version.to_string());
    }
    Ok(current.bump(changes)?.to_string())
}

// ============================================================================
// ChangelogEntry
// ============================================================================

/// 버전 변경 기록
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub version: String,
    pub previous_version: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub changes: ChangeSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
}

impl ChangelogEntry {
    pub fn new(
        previous_version: Option<String>,
        version: impl Into<String>,
        changes: ChangeSet,
        changed_by: Option<String>,
    ) -> Self {
        Self {
            version: version.into(),
            previous_version,
            timestamp: Utc::now(),
            changes,
            changed_by,
        }
    }

    /// 버전이 실제로 바뀌었는지
    pub fn is_bump(&self) -> bool {
        self.previous_version.as_deref() != Some(self.version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_and_format() {
        assert_eq!(parse_version("1.2.3").unwrap(), (1, 2, 3));
        assert_eq!(format_version(10, 0, 7), "10.0.7");

        for v in ["0.0.0", "1.2.3", "10.20.30", "999.0.1"] {
            let (a, b, c) = parse_version(v).unwrap();
            assert_eq!(format_version(a, b, c), v);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["1.2", "v1.2.3", "1.2.3-beta", "1.-2.3", "", " 1.2.3", "a.b.c"] {
            let err = parse_version(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidVersion(_)), "{bad}");
        }
    }

    #[test]
    fn test_bump_precedence() {
        let mut changes = ChangeSet::new();
        changes.push(BumpLevel::Patch, "description updated");
        assert_eq!(calculate_new_version("1.2.3", &changes, true).unwrap(), "1.2.4");

        changes.push(BumpLevel::Minor, "pii_level changed: low -> high");
        assert_eq!(calculate_new_version("1.2.3", &changes, true).unwrap(), "1.3.0");

        changes.push(BumpLevel::Major, "risk_tier changed: low -> high");
        assert_eq!(calculate_new_version("1.2.3", &changes, true).unwrap(), "2.0.0");

        assert_eq!(
            calculate_new_version("1.2.3", &ChangeSet::new(), true).unwrap(),
            "1.2.3"
        );
    }

    #[test]
    fn test_no_auto_bump_still_validates() {
        let mut changes = ChangeSet::new();
        changes.push(BumpLevel::Major, "risk_tier changed: low -> high");
        assert_eq!(calculate_new_version("1.2.3", &changes, false).unwrap(), "1.2.3");
        assert!(calculate_new_version("1.2", &changes, false).is_err());
    }

    #[test]
    fn test_bump_at_max_component_is_an_error() {
        let mut major = ChangeSet::new();
        major.push(BumpLevel::Major, "risk_tier changed: low -> high");
        let err = calculate_new_version("18446744073709551615.0.0", &major, true).unwrap_err();
        assert!(matches!(err, Error::InvalidVersion(_)));

        let mut patch = ChangeSet::new();
        patch.push(BumpLevel::Patch, "description updated");
        assert!(SemVer::new(1, 0, u64::MAX).bump(&patch).is_err());
        // 올리지 않는 자리는 u64::MAX여도 괜찮다
        assert_eq!(
            SemVer::new(1, u64::MAX, u64::MAX).bump(&major).unwrap(),
            SemVer::new(2, 0, 0)
        );
        assert_eq!(
            calculate_new_version("18446744073709551615.0.0", &major, false).unwrap(),
            "18446744073709551615.0.0"
        );
    }

    #[test]
    fn test_set_diff_sorted() {
        let mut changes = ChangeSet::new();
        changes.record_set_diff(
            BumpLevel::Minor,
            "data_sources",
            &set(&["ledger", "crm"]),
            &set(&["zendesk", "crm", "billing"]),
        );
        assert_eq!(
            changes.minor,
            vec!["data_sources added: billing, zendesk", "data_sources removed: ledger"]
        );
    }

    #[test]
    fn test_semver_serde_as_string() {
        let v = SemVer::new(2, 0, 1);
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"2.0.1\"");
        let parsed: SemVer = serde_json::from_str("\"3.4.5\"").unwrap();
        assert_eq!(parsed, SemVer::new(3, 4, 5));
        assert!(serde_json::from_str::<SemVer>("\"3.4\"").is_err());
    }

    #[test]
    fn test_changelog_entry() {
        let entry = ChangelogEntry::new(Some("1.0.0".into()), "1.0.0", ChangeSet::new(), None);
        assert!(!entry.is_bump());
        let entry = ChangelogEntry::new(None, "1.0.0", ChangeSet::new(), Some("ops".into()));
        assert!(entry.is_bump());
    }
}

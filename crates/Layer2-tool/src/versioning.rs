//! Tool versioning - 도구 정의 변경 분류와 다음 버전 계산
//!
//! | 심각도 | 변경 |
//! |-------|------|
//! | MAJOR | `risk_tier`, `requires_human_approval` |
//! | MINOR | `data_sources` (집합 비교), `pii_level` |
//! | PATCH | `description` |

use crate::definition::ToolDefinition;
use steward_foundation::{calculate_new_version, BumpLevel, ChangeSet, Result};

/// 두 정의의 차이를 심각도별로 분류
pub fn detect_tool_changes(old: &ToolDefinition, new: &ToolDefinition) -> ChangeSet {
    let mut changes = ChangeSet::new();

    // MAJOR
    changes.record_changed(BumpLevel::Major, "risk_tier", &old.risk_tier, &new.risk_tier);
    changes.record_changed(
        BumpLevel::Major,
        "requires_human_approval",
        &old.requires_human_approval,
        &new.requires_human_approval,
    );

    // MINOR
    changes.record_set_diff(
        BumpLevel::Minor,
        "data_sources",
        &old.data_sources,
        &new.data_sources,
    );
    changes.record_changed(BumpLevel::Minor, "pii_level", &old.pii_level, &new.pii_level);

    // PATCH
    if old.description_text() != new.description_text() {
        changes.push(BumpLevel::Patch, "description updated");
    }

    changes
}

/// 변경 내역으로 다음 버전 계산 → (새 버전, 변경 내역)
///
/// 버전 형식은 항상 검증합니다. `auto_bump == false`면 버전은 그대로이고
/// 변경 내역만 돌려줍니다.
pub fn calculate_new_tool_version(
    old_version: &str,
    changes: ChangeSet,
    auto_bump: bool,
) -> Result<(String, ChangeSet)> {
    let version = calculate_new_version(old_version, &changes, auto_bump)?;
    Ok((version, changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{PiiLevel, RiskTier};
    use steward_foundation::Error;

    fn base() -> ToolDefinition {
        ToolDefinition::new("get_payment_exception")
            .with_description("Fetch a payment exception")
            .with_data_source("ledger")
            .with_version("1.2.3")
    }

    #[test]
    fn test_description_only_is_patch() {
        let new = base().with_description("Fetch a payment exception by id");
        let changes = detect_tool_changes(&base(), &new);
        assert_eq!(changes.patch, vec!["description updated"]);
        assert!(changes.major.is_empty() && changes.minor.is_empty());

        let (version, _) = calculate_new_tool_version("1.2.3", changes, true).unwrap();
        assert_eq!(version, "1.2.4");
    }

    #[test]
    fn test_major_absorbs_patch() {
        let new = base()
            .with_risk_tier(RiskTier::High)
            .with_description("Now with side effects");
        let changes = detect_tool_changes(&base(), &new);
        assert_eq!(changes.major, vec!["risk_tier changed: low -> high"]);
        assert_eq!(changes.patch.len(), 1);

        let (version, changes) = calculate_new_tool_version("1.2.3", changes, true).unwrap();
        assert_eq!(version, "2.0.0");
        assert_eq!(changes.patch, vec!["description updated"]);
    }

    #[test]
    fn test_minor_changes() {
        let new = base()
            .with_data_source("crm")
            .with_pii_level(PiiLevel::High);
        let changes = detect_tool_changes(&base(), &new);
        assert_eq!(
            changes.minor,
            vec!["data_sources added: crm", "pii_level changed: low -> high"]
        );
        let (version, _) = calculate_new_tool_version("1.2.3", changes, true).unwrap();
        assert_eq!(version, "1.3.0");
    }

    #[test]
    fn test_free_form_pii_level_change_is_minor() {
        let new = base().with_pii_level(PiiLevel::from("moderate".to_string()));
        let changes = detect_tool_changes(&base(), &new);
        assert_eq!(changes.minor, vec!["pii_level changed: low -> moderate"]);

        let (version, _) = calculate_new_tool_version("1.2.3", changes, true).unwrap();
        assert_eq!(version, "1.3.0");
    }

    #[test]
    fn test_data_sources_order_insensitive() {
        let a = ToolDefinition::new("t").with_data_source("x").with_data_source("y");
        let b = ToolDefinition::new("t").with_data_source("y").with_data_source("x");
        assert!(detect_tool_changes(&a, &b).is_empty());
    }

    #[test]
    fn test_absent_description_equals_empty() {
        let a = ToolDefinition::new("t");
        let b = ToolDefinition::new("t").with_description("");
        assert!(detect_tool_changes(&a, &b).is_empty());
    }

    #[test]
    fn test_no_changes_keeps_version() {
        let changes = detect_tool_changes(&base(), &base());
        assert!(changes.is_empty());
        let (version, _) = calculate_new_tool_version("1.2.3", changes, true).unwrap();
        assert_eq!(version, "1.2.3");
    }

    #[test]
    fn test_no_auto_bump_reports_changes() {
        let new = base().with_human_approval(true);
        let changes = detect_tool_changes(&base(), &new);
        let (version, changes) = calculate_new_tool_version("1.2.3", changes, false).unwrap();
        assert_eq!(version, "1.2.3");
        assert_eq!(changes.major, vec!["requires_human_approval changed: false -> true"]);
    }

    #[test]
    fn test_malformed_version() {
        let err = calculate_new_tool_version("1.2", ChangeSet::new(), true).unwrap_err();
        assert!(matches!(err, Error::InvalidVersion(_)));
        assert!(calculate_new_tool_version("one.two.three", ChangeSet::new(), false).is_err());
    }
}

//! Built-in policies
//!
//! 정책 디렉토리 없이도 항상 등록되는 정책들입니다.
//! 같은 ID의 파일이 디렉토리에 있으면 파일이 우선합니다.

use crate::policy::Policy;
use steward_foundation::Result;

/// 결제 재시도 정책 ID
pub const PAYMENTS_RETRY: &str = "payments/retry";

const PAYMENTS_RETRY_SOURCE: &str = include_str!("../policies/payments/retry.toml");

/// 내장 정책 목록 (ID, 정책)
pub fn builtin_policies() -> Result<Vec<(&'static str, Policy)>> {
    Ok(vec![(PAYMENTS_RETRY, Policy::from_toml_str(PAYMENTS_RETRY_SOURCE)?)])
}

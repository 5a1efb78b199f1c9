//! # steward-policy
//!
//! 정책 레지스트리와 평가 엔진
//!
//! - `rule` - 조건식 (eq, gt, in, all/any/not ...)
//! - `policy` - 컴파일된 정책, `Verdict`
//! - `registry` - 정책 디렉토리 로드, `evaluate` / `enforce`
//! - `builtin` - 항상 등록되는 내장 정책 (`payments/retry`)
//!
//! ```ignore
//! use steward_policy::PolicyRegistry;
//!
//! let registry = PolicyRegistry::load_dir("policies")?;
//! let verdict = registry.evaluate("payments/retry", &json!({
//!     "amount": 5000,
//!     "previous_retries": 1,
//! }))?;
//! assert!(verdict.allowed);
//! ```

pub mod builtin;
pub mod policy;
pub mod registry;
pub mod rule;

pub use builtin::PAYMENTS_RETRY;
pub use policy::{Effect, FieldSpec, FieldType, Policy, Rule, Verdict, POLICY_NOT_FOUND_PREFIX};
pub use registry::{normalize_policy_id, policy_domain, PolicyInfo, PolicyRegistry};
pub use rule::{Condition, Op};

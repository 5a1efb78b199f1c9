//! Storage module for Steward
//!
//! - `json`: 설정 파일, 도구 버전 이력 같은 JSON 문서 저장/로드
//!
//! 감사 로그 미러(JSONL)는 `audit::sink`에서 별도로 다룹니다.

mod json;

pub use json::JsonStore;

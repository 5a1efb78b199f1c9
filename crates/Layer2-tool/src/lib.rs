//! # steward-tool
//!
//! Tool layer for Steward providing:
//! - Tool trait, `FnTool`, and registry (`ToolSource`)
//! - Tool definitions and semantic versioning (`detect_tool_changes`)
//! - Versioned tool history with changelog
//! - ToolGateway: allow-list + kill switch before a tool is handed out

pub mod definition;
pub mod gateway;
pub mod history;
pub mod registry;
pub mod r#trait;
pub mod versioning;

pub use definition::{PiiLevel, RiskTier, ToolDefinition, DEFAULT_TOOL_DOMAIN, INITIAL_VERSION};
pub use gateway::ToolGateway;
pub use history::{ToolHistory, VersionedToolStore, TOOL_HISTORY_FILE};
pub use r#trait::{FnTool, Tool};
pub use registry::{ToolRegistry, ToolSource};
pub use versioning::{calculate_new_tool_version, detect_tool_changes};

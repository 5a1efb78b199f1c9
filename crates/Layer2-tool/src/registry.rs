//! Tool Registry - manages available tools

use crate::definition::ToolDefinition;
use crate::Tool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 도구 이름 → 실행체 + 정의
///
/// 게이트웨이가 도구를 찾는 출처입니다. 구현체는 원격 카탈로그여도 됩니다.
pub trait ToolSource: Send + Sync {
    /// 실행 가능한 도구 (찾지 못하면 None)
    fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>>;

    /// 도구 정의 (찾지 못하면 None)
    fn definition(&self, name: &str) -> Option<ToolDefinition>;
}

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    definition: ToolDefinition,
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with its definition
    ///
    /// 정의의 이름이 도구 이름과 다르면 도구 이름을 따릅니다.
    pub fn register(&mut self, tool: Arc<dyn Tool>, definition: ToolDefinition) {
        let name = tool.name().to_string();
        let definition = if definition.name == name {
            definition
        } else {
            ToolDefinition { name: name.clone(), ..definition }
        };
        debug!(tool = %name, version = %definition.version, "Tool registered");
        self.tools.insert(name, RegisteredTool { tool, definition });
    }

    /// Register a tool with a default definition
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let definition = ToolDefinition::new(tool.name());
        self.register(tool, definition);
    }

    /// Unregister a tool
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name).map(|registered| registered.tool)
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|registered| Arc::clone(&registered.tool))
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<_> = self
            .tools
            .values()
            .map(|registered| registered.definition.clone())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// All tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolSource for ToolRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.get(name)
    }

    fn definition(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.get(name).map(|registered| registered.definition.clone())
    }
}

//! Tool trait and related types

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use steward_foundation::Result;

/// 실행 가능한 도구
///
/// `execute`는 도구의 원래 동작만 수행하고 결과(보통 구조화된 텍스트)를
/// 그대로 돌려줍니다. 정책 검사나 감사 기록은 호출자가 감쌉니다.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (unique identifier)
    fn name(&self) -> &str;

    /// Execute the tool with the given input
    async fn execute(&self, input: Value) -> Result<String>;
}

// ============================================================================
// FnTool
// ============================================================================

type BoxedFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;
type BoxedHandler = Arc<dyn Fn(Value) -> BoxedFuture + Send + Sync>;

/// 클로저로 만드는 도구
///
/// ```ignore
/// let tool = FnTool::new("get_payment_exception", |input| async move {
///     Ok(format!("exception {}", input["id"]))
/// });
/// ```
#[derive(Clone)]
pub struct FnTool {
    name: String,
    handler: BoxedHandler,
}

impl FnTool {
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(move |input: Value| -> BoxedFuture { Box::pin(handler(input)) }),
        }
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: Value) -> Result<String> {
        (self.handler)(input).await
    }
}

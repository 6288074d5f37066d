//! Tools discovered at runtime and the adapter that binds them to a provider.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::error::McpToolsError;

/// Name, description and schema of a tool discovered at runtime.
#[derive(Debug, Clone)]
pub struct DynamicTool {
    pub name: String,
    pub description: String,
    pub parameters: AgentToolParameters,
}

/// Source of runtime-discovered tools that can also execute them.
#[async_trait]
pub trait DynamicToolProvider: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<DynamicTool>, McpToolsError>;

    /// Execute a tool by its exposed name.
    async fn execute_tool(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, McpToolsError>;
}

/// A discovered tool bound to the provider that can run it.
pub struct DynamicToolAdapter {
    provider: Arc<dyn DynamicToolProvider>,
    tool: DynamicTool,
}

impl DynamicToolAdapter {
    pub fn new(provider: Arc<dyn DynamicToolProvider>, tool: DynamicTool) -> Self {
        Self { provider, tool }
    }

    /// Bind every tool the provider currently lists.
    pub async fn from_provider(
        provider: Arc<dyn DynamicToolProvider>,
    ) -> Result<Vec<Arc<dyn Tool>>, McpToolsError> {
        let listed = provider.list_tools().await?;
        let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(listed.len());
        for tool in listed {
            tools.push(Arc::new(Self::new(Arc::clone(&provider), tool)));
        }
        Ok(tools)
    }

    pub fn tool(&self) -> &DynamicTool {
        &self.tool
    }
}

impl std::fmt::Debug for DynamicToolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicToolAdapter")
            .field("tool", &self.tool.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for DynamicToolAdapter {
    fn name(&self) -> &str {
        &self.tool.name
    }

    fn description(&self) -> &str {
        &self.tool.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.tool.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, McpToolsError> {
        self.provider.execute_tool(&self.tool.name, args, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records each invocation as (name, arguments, timeout).
    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<(String, serde_json::Value, Option<Duration>)>>,
    }

    #[async_trait]
    impl DynamicToolProvider for RecordingProvider {
        async fn list_tools(&self) -> Result<Vec<DynamicTool>, McpToolsError> {
            Ok(["files__read", "web__fetch"]
                .into_iter()
                .map(|name| DynamicTool {
                    name: name.into(),
                    description: format!("{name} tool"),
                    parameters: AgentToolParameters::empty(),
                })
                .collect())
        }

        async fn execute_tool(
            &self,
            name: &str,
            args: &ToolArguments,
            ctx: &ToolExecutionContext,
        ) -> Result<serde_json::Value, McpToolsError> {
            if name == "web__fetch" {
                return Err(McpToolsError::ToolExecution {
                    tool_name: name.into(),
                    message: "offline".into(),
                });
            }
            self.calls
                .lock()
                .unwrap()
                .push((name.into(), args.raw().clone(), ctx.timeout));
            Ok(json!({ "ok": true }))
        }
    }

    #[tokio::test]
    async fn adapters_forward_name_arguments_and_context() {
        let provider = Arc::new(RecordingProvider::default());
        let tools = DynamicToolAdapter::from_provider(provider.clone())
            .await
            .expect("listing should succeed");
        let names: Vec<&str> = tools.iter().map(|tool| tool.name()).collect();
        assert_eq!(names, vec!["files__read", "web__fetch"]);
        assert_eq!(tools[0].description(), "files__read tool");

        let ctx = ToolExecutionContext::default().with_timeout(Duration::from_secs(3));
        let result = tools[0]
            .execute(&ToolArguments::new(json!({ "path": "a" })), &ctx)
            .await
            .expect("execute should succeed");
        assert_eq!(result["ok"], true);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(
                "files__read".to_string(),
                json!({ "path": "a" }),
                Some(Duration::from_secs(3))
            )]
        );
    }

    #[tokio::test]
    async fn provider_errors_pass_through() {
        let provider: Arc<dyn DynamicToolProvider> = Arc::new(RecordingProvider::default());
        let tool = DynamicToolAdapter::new(
            Arc::clone(&provider),
            DynamicTool {
                name: "web__fetch".into(),
                description: String::new(),
                parameters: AgentToolParameters::empty(),
            },
        );
        assert_eq!(tool.tool().name, "web__fetch");
        let err = tool
            .execute(&ToolArguments::new(json!({})), &ToolExecutionContext::default())
            .await
            .expect_err("provider fails");
        assert!(matches!(err, McpToolsError::ToolExecution { .. }));
    }
}

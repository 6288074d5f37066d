//! [`DynamicToolProvider`] backed by a [`SessionManager`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::declaration::{convert_all, ToolDeclaration};
use crate::config::McpToolsConfig;
use crate::error::{McpToolsError, Result};
use crate::mcp::manager::{ConnectReport, SessionManager};
use crate::mcp::registry::ToolKey;
use crate::mcp::schema::{ToolCallOutcome, ToolCallResult};
use crate::tools::{
    AgentToolParameters, DynamicTool, DynamicToolAdapter, DynamicToolProvider, Tool,
    ToolArguments, ToolExecutionContext,
};

/// Exposes every tool registered in a [`SessionManager`] to an agent.
///
/// An owned manager is shut down by [`close`](Self::close); a shared one is
/// left running for its other users.
pub struct McpToolProvider {
    manager: Arc<SessionManager>,
    owns_manager: bool,
}

impl McpToolProvider {
    /// Take ownership of `manager`.
    pub fn owned(manager: SessionManager) -> Self {
        Self {
            manager: Arc::new(manager),
            owns_manager: true,
        }
    }

    /// Borrow a manager whose lifecycle is handled elsewhere.
    pub fn shared(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            owns_manager: false,
        }
    }

    /// Build an owned manager from `config` and connect every endpoint.
    ///
    /// Partial failures are returned in the report, not as an error.
    pub async fn connect(config: &McpToolsConfig) -> Result<(Self, ConnectReport)> {
        let manager = SessionManager::from_config(config)?;
        let report = manager.connect_all().await;
        for (server, error) in report.failed() {
            tracing::warn!(server, error = %error, "MCP server unavailable");
        }
        Ok((Self::owned(manager), report))
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    pub fn owns_manager(&self) -> bool {
        self.owns_manager
    }

    /// Every registered tool wrapped in the [`Tool`] trait.
    pub async fn tools(self: &Arc<Self>) -> Result<Vec<Arc<dyn Tool>>> {
        DynamicToolAdapter::from_provider(Arc::clone(self) as Arc<dyn DynamicToolProvider>).await
    }

    /// Flattened declarations for frameworks without JSON Schema support.
    ///
    /// Returns an empty list when no server is connected.
    pub async fn declarations(&self) -> Result<Vec<ToolDeclaration>> {
        let tools = self.manager.list_tools().await;
        if tools.is_empty() && !self.any_ready().await {
            tracing::warn!("no MCP server is connected; no tools to declare");
            return Ok(Vec::new());
        }
        convert_all(&tools)
    }

    /// Invoke a declared tool, restoring server-side argument names first.
    pub async fn call_declared(
        &self,
        declaration: &ToolDeclaration,
        args: ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value> {
        let args = declaration.server_arguments(args);
        self.execute_tool(&declaration.name, &args, ctx).await
    }

    /// Shut the manager down if this provider owns it.
    pub async fn close(&self) {
        if self.owns_manager {
            self.manager.shutdown().await;
            tracing::info!("closed owned MCP session manager");
        }
    }

    async fn any_ready(&self) -> bool {
        self.manager
            .statuses()
            .await
            .iter()
            .any(|status| status.state.is_ready())
    }
}

impl std::fmt::Debug for McpToolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpToolProvider")
            .field("owns_manager", &self.owns_manager)
            .finish_non_exhaustive()
    }
}

/// Turn a routed call result into what the agent sees.
fn into_agent_value(result: ToolCallResult) -> Result<Value> {
    let tool_name = ToolKey::new(result.server_id, result.tool).exposed_name();
    match result.outcome {
        ToolCallOutcome::Success(payload) => Ok(payload.into_value_or_text()),
        ToolCallOutcome::Failure(failure) => {
            let message = match failure.code {
                Some(code) => format!("[{code}] {}", failure.message),
                None => failure.message,
            };
            Err(McpToolsError::ToolExecution { tool_name, message })
        }
    }
}

#[async_trait]
impl DynamicToolProvider for McpToolProvider {
    async fn list_tools(&self) -> Result<Vec<DynamicTool>> {
        Ok(self
            .manager
            .list_tools()
            .await
            .into_iter()
            .map(|tool| DynamicTool {
                name: tool.key.exposed_name(),
                description: tool
                    .descriptor
                    .description
                    .or(tool.descriptor.title)
                    .unwrap_or_default(),
                parameters: AgentToolParameters::from_schema(tool.descriptor.input_schema),
            })
            .collect())
    }

    async fn execute_tool(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value> {
        let result = self
            .manager
            .route_call_with(name, args.raw().clone(), ctx.call_options())
            .await?;
        into_agent_value(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::schema::{ToolFailure, ToolPayload};
    use serde_json::json;

    fn result(outcome: ToolCallOutcome) -> ToolCallResult {
        ToolCallResult {
            request_id: 7,
            server_id: "web".into(),
            tool: "fetch".into(),
            outcome,
        }
    }

    #[test]
    fn success_yields_structured_content_or_text() {
        let structured = result(ToolCallOutcome::Success(ToolPayload {
            structured_content: Some(json!({ "status": 200 })),
            text_content: Some("ignored".into()),
            content: Vec::new(),
        }));
        assert_eq!(into_agent_value(structured).expect("ok"), json!({ "status": 200 }));

        let text = result(ToolCallOutcome::Success(ToolPayload {
            structured_content: None,
            text_content: Some("hello".into()),
            content: vec![json!({ "type": "text", "text": "hello" })],
        }));
        assert_eq!(into_agent_value(text).expect("ok"), json!("hello"));
    }

    #[test]
    fn failure_becomes_tool_execution_error() {
        let failed = result(ToolCallOutcome::Failure(ToolFailure {
            code: None,
            message: "page not found".into(),
            details: None,
        }));
        match into_agent_value(failed) {
            Err(McpToolsError::ToolExecution { tool_name, message }) => {
                assert_eq!(tool_name, "web__fetch");
                assert_eq!(message, "page not found");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let rejected = result(ToolCallOutcome::Failure(ToolFailure {
            code: Some(-32602),
            message: "invalid params".into(),
            details: None,
        }));
        let err = into_agent_value(rejected).expect_err("rejected");
        assert!(err.to_string().contains("[-32602] invalid params"));
    }

    #[tokio::test]
    async fn declarations_are_empty_before_connecting() {
        let manager = SessionManager::new(Vec::new(), Default::default()).expect("empty");
        let provider = McpToolProvider::owned(manager);
        assert!(provider.owns_manager());
        assert!(provider.declarations().await.expect("empty").is_empty());
        provider.close().await;
    }
}

//! Tool trait and per-invocation context.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::arguments::ToolArguments;
use super::types::AgentToolParameters;
use crate::error::McpToolsError;
use crate::mcp::session::CallOptions;

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Overrides the session's request timeout for this invocation.
    pub timeout: Option<Duration>,
    /// Lets the agent abandon an in-flight invocation.
    pub cancel: Option<CancellationToken>,
    /// Free-form metadata from the agent framework.
    pub metadata: serde_json::Value,
}

impl ToolExecutionContext {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn call_options(&self) -> CallOptions {
        CallOptions {
            timeout: self.timeout,
            cancel: self.cancel.clone(),
        }
    }
}

/// A callable tool as an agent framework sees it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &AgentToolParameters;

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, McpToolsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_maps_to_call_options() {
        let token = CancellationToken::new();
        let ctx = ToolExecutionContext::default()
            .with_timeout(Duration::from_millis(250))
            .with_cancel(token.clone());
        let options = ctx.call_options();
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));

        token.cancel();
        assert!(options.cancel.expect("token").is_cancelled());
    }
}

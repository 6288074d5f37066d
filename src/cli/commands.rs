//! CLI command handlers for servers, tools and call.

use std::path::Path;
use std::time::Duration;

use crate::agent::McpToolProvider;
use crate::config::McpToolsConfig;
use crate::mcp::manager::{EndpointStatus, SessionManager};
use crate::mcp::schema::ToolCallOutcome;
use crate::mcp::session::CallOptions;

use super::{CallArgs, ToolsArgs};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config named on the command line, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<McpToolsConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => McpToolsConfig::load(path)?,
        None => McpToolsConfig::load_default()?,
    };
    if config.servers.is_empty() {
        return Err("no MCP servers configured".into());
    }
    Ok(config)
}

async fn connected_manager(config: &McpToolsConfig) -> Result<SessionManager, Box<dyn std::error::Error>> {
    let manager = SessionManager::from_config(config)?;
    let report = manager.connect_all().await;
    for (server, error) in report.failed() {
        eprintln!("❌ {server}: {error}");
    }
    Ok(manager)
}

/// Handle `mcp-agent-tools servers`.
pub async fn handle_servers(config: &McpToolsConfig) -> CliResult {
    let manager = connected_manager(config).await?;
    for status in manager.statuses().await {
        println!("{}", format_status(&status));
    }
    manager.shutdown().await;
    Ok(())
}

/// Handle `mcp-agent-tools tools`.
pub async fn handle_tools(config: &McpToolsConfig, args: &ToolsArgs) -> CliResult {
    let manager = connected_manager(config).await?;
    if args.declarations {
        let provider = McpToolProvider::owned(manager);
        let declarations = provider.declarations().await?;
        println!("{}", serde_json::to_string_pretty(&declarations)?);
        provider.close().await;
        return Ok(());
    }

    let tools = manager.list_tools().await;
    if tools.is_empty() {
        println!("No tools discovered.");
    }
    for tool in &tools {
        let summary = tool
            .descriptor
            .description
            .as_deref()
            .and_then(|text| text.lines().next())
            .unwrap_or("");
        println!("{:<40} {summary}", tool.key.exposed_name());
    }
    manager.shutdown().await;
    Ok(())
}

/// Handle `mcp-agent-tools call <key> [json]`.
pub async fn handle_call(config: &McpToolsConfig, args: &CallArgs) -> CliResult {
    let arguments: serde_json::Value = serde_json::from_str(&args.arguments)
        .map_err(|e| format!("arguments must be JSON: {e}"))?;
    let manager = connected_manager(config).await?;

    let mut options = CallOptions::default();
    if let Some(ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }
    let result = manager.route_call_with(&args.key, arguments, options).await;
    manager.shutdown().await;

    let result = result?;
    match result.outcome {
        ToolCallOutcome::Success(payload) => {
            let value = payload.into_value_or_text();
            match value {
                serde_json::Value::String(text) => println!("{text}"),
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
            Ok(())
        }
        ToolCallOutcome::Failure(failure) => {
            Err(format!("{} failed: {}", args.key, failure.message).into())
        }
    }
}

fn format_status(status: &EndpointStatus) -> String {
    let marker = if status.state.is_ready() { "✅" } else { "❌" };
    let mut line = format!(
        "{marker} {:<16} {:<16} {:<10} tools={:<4} {}",
        status.server_id, status.state, status.transport, status.tool_count, status.address
    );
    if let Some(error) = &status.last_error {
        line.push_str(&format!("  ({error})"));
    }
    line
}

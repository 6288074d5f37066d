//! CLI entry point for mcp-agent-tools.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect and call tools on configured MCP servers
#[derive(Parser, Debug)]
#[command(name = "mcp-agent-tools", version, about = "MCP client session CLI")]
pub struct Cli {
    /// Server config file (TOML, or `mcpServers` JSON)
    #[arg(short, long, global = true, env = "MCP_AGENT_TOOLS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect every server and print its status
    Servers,
    /// List discovered tools
    Tools(ToolsArgs),
    /// Route one tool call
    Call(CallArgs),
}

#[derive(Parser, Debug)]
pub struct ToolsArgs {
    /// Print flattened agent declarations instead of the tool table
    #[arg(long)]
    pub declarations: bool,
}

/// Arguments for `mcp-agent-tools call`.
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Exposed tool name, `server__tool`
    pub key: String,

    /// JSON object with the tool arguments
    #[arg(default_value = "{}")]
    pub arguments: String,

    /// Per-call timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_servers_with_config() {
        let cli = Cli::try_parse_from(["mcp-agent-tools", "--config", "servers.toml", "servers"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("servers.toml")));
        assert!(matches!(cli.command, Commands::Servers));
    }

    #[test]
    fn parse_tools_declarations_flag() {
        let cli = Cli::try_parse_from(["mcp-agent-tools", "tools", "--declarations"]).unwrap();
        match cli.command {
            Commands::Tools(args) => assert!(args.declarations),
            other => panic!("expected Tools, got {other:?}"),
        }
    }

    #[test]
    fn parse_call_with_defaults() {
        let cli = Cli::try_parse_from(["mcp-agent-tools", "call", "files__read"]).unwrap();
        match cli.command {
            Commands::Call(args) => {
                assert_eq!(args.key, "files__read");
                assert_eq!(args.arguments, "{}");
                assert!(args.timeout_ms.is_none());
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn parse_call_with_arguments_and_timeout() {
        let cli = Cli::try_parse_from([
            "mcp-agent-tools",
            "call",
            "web__fetch",
            r#"{"url":"https://example.com"}"#,
            "--timeout-ms",
            "1500",
            "-c",
            "alt.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.json")));
        match cli.command {
            Commands::Call(args) => {
                assert_eq!(args.arguments, r#"{"url":"https://example.com"}"#);
                assert_eq!(args.timeout_ms, Some(1500));
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["mcp-agent-tools"]).is_err());
    }

    #[test]
    fn parse_call_missing_key_is_error() {
        assert!(Cli::try_parse_from(["mcp-agent-tools", "call"]).is_err());
    }
}

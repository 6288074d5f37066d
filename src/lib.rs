//! mcp-agent-tools: client sessions for the Model Context Protocol.
//!
//! Connects an agent to one or more MCP servers, discovers their tools into a
//! single namespace and routes tool calls to the owning server, correlating
//! each response with its request.
//!
//! # Quick Start
//!
//! ```no_run
//! use mcp_agent_tools::prelude::*;
//!
//! # async fn example() -> mcp_agent_tools::error::Result<()> {
//! let manager = SessionManager::new(
//!     vec![ServerEndpoint::stdio("files", "mcp-server-filesystem", vec![".".into()])],
//!     SessionConfig::default(),
//! )?;
//! let report = manager.connect_all().await;
//! assert!(report.all_connected());
//!
//! let result = manager
//!     .route_call("files__read_file", serde_json::json!({ "path": "README.md" }))
//!     .await?;
//! println!("{:?}", result.payload());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod mcp;
pub mod prelude;
pub mod tools;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

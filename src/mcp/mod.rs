//! Model Context Protocol (MCP) client sessions, registry and routing.

pub mod manager;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod session;
pub mod transport;

pub use manager::{ConnectReport, EndpointOutcome, EndpointStatus, SessionManager, SessionTool};
pub use protocol::{NegotiatedCapabilities, RequestId};
pub use registry::{RegisteredTool, ToolKey, ToolRegistry, KEY_SEPARATOR};
pub use schema::{
    ResourceContents, ResourceDescriptor, ToolCallOutcome, ToolCallResult, ToolDescriptor,
    ToolFailure, ToolPayload,
};
pub use session::{CallOptions, DisconnectReason, ProtocolSession, SessionState};
pub use transport::{DefaultConnector, MCPTransport, TransportConnector};

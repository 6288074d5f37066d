//! JSON-RPC 2.0 framing for the MCP methods this client uses.
//!
//! Frames travel as `serde_json::Value`; this module builds outbound frames and
//! classifies inbound ones. Everything above it only sees [`InboundFrame`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::error::McpToolsError;

/// Correlation identifier assigned by a session to each outbound request.
pub type RequestId = u64;

pub const JSONRPC_VERSION: &str = "2.0";

pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const RESOURCES_LIST: &str = "resources/list";
    pub const RESOURCES_READ: &str = "resources/read";
    pub const TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";
}

pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: error_codes::METHOD_NOT_FOUND,
            message: format!("Method not found: {method}"),
            data: None,
        }
    }

    pub fn into_error(self, server: &str) -> McpToolsError {
        McpToolsError::Protocol {
            server: server.to_owned(),
            code: self.code,
            message: self.message,
        }
    }
}

/// Outcome carried by a response frame.
pub type ResponseOutcome = Result<Value, RpcError>;

/// An inbound frame after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Reply to one of our requests.
    Response { id: Value, outcome: ResponseOutcome },
    /// Server-initiated request that expects a reply.
    Request {
        id: Value,
        method: String,
        params: Option<Value>,
    },
    Notification { method: String, params: Option<Value> },
}

impl InboundFrame {
    pub fn classify(frame: Value) -> Result<Self, McpToolsError> {
        let mut map = match frame {
            Value::Object(map) => map,
            other => {
                return Err(McpToolsError::InvalidArgument(format!(
                    "JSON-RPC frame must be an object; got {other}"
                )))
            }
        };

        let id = map.remove("id").filter(|id| !id.is_null());
        let method = map
            .remove("method")
            .and_then(|m| m.as_str().map(str::to_owned));
        let params = map.remove("params");

        match (id, method) {
            (Some(id), Some(method)) => Ok(Self::Request { id, method, params }),
            (None, Some(method)) => Ok(Self::Notification { method, params }),
            (Some(id), None) => {
                if let Some(error) = map.remove("error") {
                    let error: RpcError = serde_json::from_value(error)?;
                    return Ok(Self::Response {
                        id,
                        outcome: Err(error),
                    });
                }
                let result = map.remove("result").ok_or_else(|| {
                    McpToolsError::InvalidArgument(format!(
                        "JSON-RPC response {id} carries neither result nor error"
                    ))
                })?;
                Ok(Self::Response {
                    id,
                    outcome: Ok(result),
                })
            }
            (None, None) => {
                // An error reply to a request the server could not parse has a null id.
                if let Some(error) = map.remove("error") {
                    let error: RpcError = serde_json::from_value(error)?;
                    return Err(McpToolsError::InvalidArgument(format!(
                        "JSON-RPC error without request id: {} {}",
                        error.code, error.message
                    )));
                }
                Err(McpToolsError::InvalidArgument(
                    "JSON-RPC frame has neither id nor method".into(),
                ))
            }
        }
    }
}

/// Interpret a wire id as one of our numeric correlation ids.
///
/// Some servers echo ids back as strings; anything else cannot be ours.
pub fn correlation_id(id: &Value) -> Option<RequestId> {
    match id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Build a request frame. `Value::Null` params are omitted.
pub fn request(id: RequestId, method: &str, params: Value) -> Value {
    let mut frame = json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "method": method,
    });
    if !params.is_null() {
        frame["params"] = params;
    }
    frame
}

pub fn notification(method: &str, params: Option<Value>) -> Value {
    let mut frame = json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
    });
    if let Some(params) = params {
        frame["params"] = params;
    }
    frame
}

pub fn result_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

pub fn error_response(id: Value, error: RpcError) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": error,
    })
}

/// Parameters of the `initialize` request.
pub fn initialize_params(config: &SessionConfig) -> Value {
    json!({
        "protocolVersion": config.preferred_version(),
        "capabilities": {},
        "clientInfo": {
            "name": config.client_name,
            "version": config.client_version,
        }
    })
}

/// Name/version pair a peer reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Capability set advertised by a server. Only presence matters to this crate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<Value>,
}

impl ServerCapabilities {
    pub fn supports_tools(&self) -> bool {
        self.tools.is_some()
    }

    pub fn supports_resources(&self) -> bool {
        self.resources.is_some()
    }

    /// Whether the server promised `notifications/tools/list_changed`.
    pub fn tools_list_changed(&self) -> bool {
        self.tools
            .as_ref()
            .and_then(|t| t.get("listChanged"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Result of the `initialize` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    #[serde(default)]
    pub server_info: Option<Implementation>,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// What the handshake agreed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiatedCapabilities {
    pub protocol_version: String,
    pub server_info: Implementation,
    pub capabilities: ServerCapabilities,
    pub instructions: Option<String>,
}

impl From<InitializeResult> for NegotiatedCapabilities {
    fn from(result: InitializeResult) -> Self {
        Self {
            protocol_version: result.protocol_version,
            server_info: result.server_info.unwrap_or_default(),
            capabilities: result.capabilities,
            instructions: result.instructions,
        }
    }
}

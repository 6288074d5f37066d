//! Shared test helpers: a scripted MCP server over the in-memory transport.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use mcp_agent_tools::config::{ServerEndpoint, SessionConfig};
use mcp_agent_tools::error::{McpToolsError, Result};
use mcp_agent_tools::mcp::transport::{memory_pair, MCPTransport, MemoryPeer, TransportConnector};
use mcp_agent_tools::mcp::{ProtocolSession, SessionManager};
use mcp_agent_tools::util::retry::RetryPolicy;

pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Session config with no connect retries and short timeouts.
pub fn test_config() -> SessionConfig {
    SessionConfig::builder()
        .connect_retry(RetryPolicy::none())
        .connect_timeout(Duration::from_secs(5))
        .request_timeout(Duration::from_secs(5))
        .build()
}

/// Tool definition as a server lists it, with one required string input.
pub fn text_tool(name: &str, input: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} tool"),
        "inputSchema": {
            "type": "object",
            "properties": { input: { "type": "string" } },
            "required": [input]
        }
    })
}

pub fn result_frame(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub fn text_result(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

/// Answer `initialize` and consume `notifications/initialized`.
pub async fn serve_handshake(peer: &mut MemoryPeer) {
    let init = peer.next_frame().await.expect("initialize request");
    assert_eq!(init["method"], "initialize");
    peer.send(result_frame(
        &init["id"],
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": true }, "resources": {} },
            "serverInfo": { "name": "scripted", "version": "0.1.0" }
        }),
    ));
    let initialized = peer.next_frame().await.expect("initialized notification");
    assert_eq!(initialized["method"], "notifications/initialized");
}

/// Answer one `tools/list` with a single page.
pub async fn serve_tools_list(peer: &mut MemoryPeer, tools: Vec<Value>) {
    let list = peer.next_frame().await.expect("tools/list request");
    assert_eq!(list["method"], "tools/list");
    peer.send(result_frame(&list["id"], json!({ "tools": tools })));
}

/// A Ready session with `tools` discovered, plus the server end of its transport.
pub async fn ready_session(server_id: &str, tools: Vec<Value>) -> (ProtocolSession, MemoryPeer) {
    let session = ProtocolSession::new(
        ServerEndpoint::stdio(server_id, "unused", Vec::new()),
        test_config(),
    );
    let (transport, mut peer) = memory_pair();
    let (connected, _) = tokio::join!(
        session.connect(Box::new(transport)),
        serve_handshake(&mut peer)
    );
    connected.expect("handshake should succeed");

    let (discovered, _) = tokio::join!(session.discover_tools(), serve_tools_list(&mut peer, tools));
    discovered.expect("discovery should succeed");
    (session, peer)
}

/// What scripted servers answer, shared with every live connection.
#[derive(Clone, Default)]
struct Script {
    tools: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    broken_resources: Arc<Mutex<HashSet<String>>>,
}

impl Script {
    fn tools(&self, server_id: &str) -> Vec<Value> {
        self.tools
            .lock()
            .unwrap()
            .get(server_id)
            .cloned()
            .unwrap_or_default()
    }

    fn resources_broken(&self, server_id: &str) -> bool {
        self.broken_resources.lock().unwrap().contains(server_id)
    }
}

struct LiveServer {
    kill: CancellationToken,
    notes: mpsc::UnboundedSender<Value>,
}

/// Auto-responding server: echoes the first string argument of each call,
/// prefixed with the server id. Stops when `kill` is cancelled.
async fn serve(
    mut peer: MemoryPeer,
    server_id: String,
    script: Script,
    kill: CancellationToken,
    mut notes: mpsc::UnboundedReceiver<Value>,
) {
    loop {
        let frame = tokio::select! {
            _ = kill.cancelled() => return,
            Some(note) = notes.recv() => {
                peer.send(note);
                continue;
            }
            frame = peer.next_frame() => match frame {
                Some(frame) => frame,
                None => return,
            },
        };
        let Some(id) = frame.get("id").cloned() else {
            continue;
        };
        let result = match frame["method"].as_str() {
            Some("initialize") => json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": true }, "resources": {} },
                "serverInfo": { "name": server_id, "version": "1" }
            }),
            Some("tools/list") => json!({ "tools": script.tools(&server_id) }),
            Some("tools/call") => {
                let echoed = frame["params"]["arguments"]
                    .as_object()
                    .and_then(|args| args.values().find_map(Value::as_str))
                    .unwrap_or("")
                    .to_string();
                text_result(&format!("{server_id}:{echoed}"))
            }
            Some("resources/list") if script.resources_broken(&server_id) => {
                peer.send(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32603, "message": "resources unavailable" }
                }));
                continue;
            }
            Some("resources/list") => json!({
                "resources": [{ "uri": format!("mem://{server_id}/readme"), "name": "readme" }]
            }),
            Some("resources/read") => json!({
                "contents": [{ "uri": frame["params"]["uri"], "text": format!("hello from {server_id}") }]
            }),
            _ => json!({}),
        };
        peer.send(result_frame(&id, result));
    }
}

/// Connector that starts an in-process scripted server per connection.
#[derive(Default)]
pub struct ScriptedConnector {
    script: Script,
    refuse: Mutex<HashSet<String>>,
    live: Mutex<HashMap<String, LiveServer>>,
    connects: Mutex<HashMap<String, usize>>,
}

impl ScriptedConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_tools(self: Arc<Self>, server_id: &str, tools: Vec<Value>) -> Arc<Self> {
        self.set_tools(server_id, tools);
        self
    }

    /// Replace what `server_id` lists from its next `tools/list` on.
    pub fn set_tools(&self, server_id: &str, tools: Vec<Value>) {
        self.script
            .tools
            .lock()
            .unwrap()
            .insert(server_id.to_string(), tools);
    }

    /// Make `resources/list` on `server_id` answer with an error.
    pub fn break_resources(&self, server_id: &str) {
        self.script
            .broken_resources
            .lock()
            .unwrap()
            .insert(server_id.to_string());
    }

    pub fn refuse(&self, server_id: &str) {
        self.refuse.lock().unwrap().insert(server_id.to_string());
    }

    pub fn allow(&self, server_id: &str) {
        self.refuse.lock().unwrap().remove(server_id);
    }

    /// Push `notifications/tools/list_changed` on the live connection to `server_id`.
    pub fn announce_tools_changed(&self, server_id: &str) {
        if let Some(server) = self.live.lock().unwrap().get(server_id) {
            let _ = server.notes.send(json!({
                "jsonrpc": "2.0",
                "method": "notifications/tools/list_changed"
            }));
        }
    }

    /// Drop the server side of the current connection to `server_id`.
    pub fn kill(&self, server_id: &str) {
        if let Some(server) = self.live.lock().unwrap().remove(server_id) {
            server.kill.cancel();
        }
    }

    pub fn connect_count(&self, server_id: &str) -> usize {
        self.connects.lock().unwrap().get(server_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl TransportConnector for ScriptedConnector {
    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn MCPTransport>> {
        *self
            .connects
            .lock()
            .unwrap()
            .entry(endpoint.id.clone())
            .or_default() += 1;
        if self.refuse.lock().unwrap().contains(&endpoint.id) {
            return Err(McpToolsError::transport(&endpoint.id, "connection refused"));
        }
        let (transport, peer) = memory_pair();
        let kill = CancellationToken::new();
        let (notes, notes_rx) = mpsc::unbounded_channel();
        self.live.lock().unwrap().insert(
            endpoint.id.clone(),
            LiveServer {
                kill: kill.clone(),
                notes,
            },
        );
        tokio::spawn(serve(
            peer,
            endpoint.id.clone(),
            self.script.clone(),
            kill,
            notes_rx,
        ));
        Ok(Box::new(transport))
    }
}

/// Manager over `files` (read, write) and `web` (fetch) backed by `connector`.
pub fn scripted_manager(connector: Arc<ScriptedConnector>) -> SessionManager {
    let connector = connector
        .with_tools(
            "files",
            vec![text_tool("read", "path"), text_tool("write", "path")],
        )
        .with_tools("web", vec![text_tool("fetch", "url")]);
    SessionManager::new(
        vec![
            ServerEndpoint::stdio("files", "unused", Vec::new()),
            ServerEndpoint::websocket("web", "ws://localhost:1"),
        ],
        test_config(),
    )
    .expect("valid endpoints")
    .with_connector(connector)
}

pub async fn exposed_names(manager: &SessionManager) -> Vec<String> {
    manager
        .list_tools()
        .await
        .into_iter()
        .map(|tool| tool.key.exposed_name())
        .collect()
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

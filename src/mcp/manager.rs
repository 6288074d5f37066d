//! Owns one [`ProtocolSession`] per configured endpoint and routes tool calls.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::protocol::NegotiatedCapabilities;
use super::registry::{RegisteredTool, ToolKey, ToolRegistry};
use super::schema::{ResourceContents, ResourceDescriptor, ToolCallResult};
use super::session::{CallOptions, ProtocolSession, SessionState};
use super::transport::{DefaultConnector, TransportConnector};
use crate::config::{McpToolsConfig, ServerEndpoint, SessionConfig};
use crate::error::{McpToolsError, Result};

/// A registry entry whose session handle is a live [`ProtocolSession`].
pub type SessionTool = RegisteredTool<Arc<ProtocolSession>>;

#[derive(Default)]
struct SlotState {
    session: Option<Arc<ProtocolSession>>,
    connected_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    watcher: Option<JoinHandle<()>>,
}

struct EndpointSlot {
    endpoint: ServerEndpoint,
    /// Held across connect/disconnect so one endpoint never has two live sessions.
    state: Mutex<SlotState>,
}

/// Point-in-time view of one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointStatus {
    pub server_id: String,
    pub label: Option<String>,
    pub transport: &'static str,
    pub address: String,
    pub state: SessionState,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub tool_count: usize,
}

/// Result of connecting one endpoint inside [`SessionManager::connect_all`].
#[derive(Debug)]
pub struct EndpointOutcome {
    pub server_id: String,
    /// Number of tools registered on success.
    pub result: Result<usize>,
}

/// Per-endpoint results of [`SessionManager::connect_all`].
#[derive(Debug, Default)]
pub struct ConnectReport {
    pub outcomes: Vec<EndpointOutcome>,
}

impl ConnectReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .map(|outcome| outcome.server_id.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &McpToolsError)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.result {
            Ok(_) => None,
            Err(error) => Some((outcome.server_id.as_str(), error)),
        })
    }

    pub fn all_connected(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn outcome(&self, server_id: &str) -> Option<&EndpointOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.server_id == server_id)
    }
}

/// Owns the sessions for a fixed set of endpoints.
///
/// Connecting is always explicit: a session that drops is marked
/// disconnected, its tools leave the registry, and nothing reconnects it until
/// [`connect`](Self::connect) or [`reconnect`](Self::reconnect) is called.
pub struct SessionManager {
    config: SessionConfig,
    connector: Arc<dyn TransportConnector>,
    order: Vec<String>,
    slots: HashMap<String, EndpointSlot>,
    registry: Arc<RwLock<ToolRegistry<Arc<ProtocolSession>>>>,
}

impl SessionManager {
    /// Validate endpoints and create a manager using the built-in transports.
    pub fn new(endpoints: Vec<ServerEndpoint>, config: SessionConfig) -> Result<Self> {
        let mut order = Vec::with_capacity(endpoints.len());
        let mut slots = HashMap::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let endpoint = endpoint.normalized()?;
            if slots.contains_key(&endpoint.id) {
                return Err(McpToolsError::Configuration(format!(
                    "Duplicate MCP server id '{}'",
                    endpoint.id
                )));
            }
            order.push(endpoint.id.clone());
            slots.insert(
                endpoint.id.clone(),
                EndpointSlot {
                    endpoint,
                    state: Mutex::new(SlotState::default()),
                },
            );
        }

        let registry = ToolRegistry::with_order(order.iter().cloned());
        Ok(Self {
            config,
            connector: Arc::new(DefaultConnector),
            order,
            slots,
            registry: Arc::new(RwLock::new(registry)),
        })
    }

    pub fn from_config(config: &McpToolsConfig) -> Result<Self> {
        Self::new(config.servers.clone(), config.session_config())
    }

    /// Replace the transport connector.
    pub fn with_connector(mut self, connector: Arc<dyn TransportConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Endpoints in configuration order.
    pub fn endpoints(&self) -> Vec<&ServerEndpoint> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id).map(|slot| &slot.endpoint))
            .collect()
    }

    fn slot(&self, server_id: &str) -> Result<&EndpointSlot> {
        self.slots.get(server_id).ok_or_else(|| {
            McpToolsError::Configuration(format!("Unknown MCP server '{server_id}'"))
        })
    }

    /// Connect every endpoint concurrently. One failure never blocks the others.
    pub async fn connect_all(&self) -> ConnectReport {
        let attempts = self.order.iter().map(|id| async move {
            let result = self
                .connect(id)
                .await
                .map(|session| session.cached_tools().len());
            EndpointOutcome {
                server_id: id.clone(),
                result,
            }
        });
        let report = ConnectReport {
            outcomes: join_all(attempts).await,
        };
        tracing::info!(
            connected = report.succeeded().count(),
            failed = report.failed().count(),
            "MCP connect_all finished"
        );
        report
    }

    /// Bring one endpoint to `Ready` and register its tools.
    ///
    /// A session that is already ready is returned as is.
    pub async fn connect(&self, server_id: &str) -> Result<Arc<ProtocolSession>> {
        let slot = self.slot(server_id)?;
        let mut state = slot.state.lock().await;
        if let Some(session) = state.session.as_ref().filter(|s| s.is_ready()) {
            return Ok(Arc::clone(session));
        }
        self.teardown(&slot.endpoint.id, &mut state).await;
        self.establish(&slot.endpoint, &mut state).await
    }

    /// Drop any existing session for the endpoint and connect a fresh one.
    pub async fn reconnect(&self, server_id: &str) -> Result<Arc<ProtocolSession>> {
        let slot = self.slot(server_id)?;
        let mut state = slot.state.lock().await;
        tracing::info!(server = server_id, "reconnecting MCP server");
        self.teardown(&slot.endpoint.id, &mut state).await;
        self.establish(&slot.endpoint, &mut state).await
    }

    pub async fn disconnect(&self, server_id: &str) -> Result<()> {
        let slot = self.slot(server_id)?;
        let mut state = slot.state.lock().await;
        self.teardown(&slot.endpoint.id, &mut state).await;
        Ok(())
    }

    /// Close every session.
    pub async fn shutdown(&self) {
        join_all(self.order.iter().map(|id| self.disconnect(id))).await;
    }

    async fn establish(
        &self,
        endpoint: &ServerEndpoint,
        state: &mut SlotState,
    ) -> Result<Arc<ProtocolSession>> {
        match self.open_session(endpoint).await {
            Ok((session, count)) => {
                state.watcher = Some(self.watch(&endpoint.id, &session));
                state.session = Some(Arc::clone(&session));
                state.connected_at = Some(Utc::now());
                state.last_error = None;
                tracing::info!(server = %endpoint.id, tools = count, "MCP server connected");
                Ok(session)
            }
            Err(error) => {
                tracing::warn!(server = %endpoint.id, %error, "MCP server connect failed");
                state.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    async fn open_session(&self, endpoint: &ServerEndpoint) -> Result<(Arc<ProtocolSession>, usize)> {
        let session = self
            .config
            .connect_retry
            .run(&endpoint.id, || {
                let session = Arc::new(ProtocolSession::new(endpoint.clone(), self.config.clone()));
                let connector = Arc::clone(&self.connector);
                async move {
                    session.connect_with(connector.as_ref()).await?;
                    Ok::<_, McpToolsError>(session)
                }
            })
            .await?;

        let tools = match session.discover_tools().await {
            Ok(tools) => tools,
            Err(error) => {
                session.close().await;
                return Err(error);
            }
        };
        let resources = session.list_resources().await.unwrap_or_else(|error| {
            tracing::warn!(server = %endpoint.id, %error, "resource listing failed");
            Vec::new()
        });

        let mut registry = self.registry.write().await;
        let count = registry.register(&endpoint.id, Arc::clone(&session), tools);
        registry.register_resources(&endpoint.id, resources)?;
        Ok((session, count))
    }

    async fn teardown(&self, server_id: &str, state: &mut SlotState) {
        let Some(session) = state.session.take() else {
            return;
        };
        self.registry
            .write()
            .await
            .remove_matching(server_id, |current| Arc::ptr_eq(current, &session));
        session.close().await;
        if let Some(watcher) = state.watcher.take() {
            watcher.abort();
        }
        state.connected_at = None;
        tracing::debug!(server = server_id, "MCP session torn down");
    }

    /// Remove a session's registry entries once it ends on its own.
    fn watch(&self, server_id: &str, session: &Arc<ProtocolSession>) -> JoinHandle<()> {
        let mut states = session.subscribe();
        let owned: Weak<ProtocolSession> = Arc::downgrade(session);
        let registry = Arc::clone(&self.registry);
        let server_id = server_id.to_owned();

        tokio::spawn(async move {
            let reason = match states.wait_for(SessionState::is_terminal).await {
                Ok(state) => state.disconnect_reason().map(ToString::to_string),
                Err(_) => None,
            };
            let removed = registry.write().await.remove_matching(&server_id, |current| {
                std::ptr::eq(Arc::as_ptr(current), owned.as_ptr())
            });
            if removed {
                tracing::warn!(
                    server = %server_id,
                    reason = reason.as_deref().unwrap_or("unknown"),
                    "MCP session lost; tools unregistered"
                );
            }
        })
    }

    /// Re-run discovery on a ready session and replace its registry entries.
    ///
    /// A failed resource listing is logged and leaves the previous resources.
    pub async fn refresh_tools(&self, server_id: &str) -> Result<usize> {
        let slot = self.slot(server_id)?;
        let state = slot.state.lock().await;
        let session = state
            .session
            .as_ref()
            .filter(|session| session.is_ready())
            .cloned()
            .ok_or_else(|| {
                McpToolsError::InvalidState(format!("MCP server '{server_id}' is not connected"))
            })?;

        let tools = session.discover_tools().await?;
        let count = self
            .registry
            .write()
            .await
            .register(server_id, Arc::clone(&session), tools);

        match session.list_resources().await {
            Ok(resources) => {
                self.registry
                    .write()
                    .await
                    .register_resources(server_id, resources)?;
            }
            Err(error) => {
                tracing::warn!(server = server_id, %error, "resource listing failed; keeping previous resources");
            }
        }
        tracing::debug!(server = server_id, tools = count, "refreshed MCP tools");
        Ok(count)
    }

    /// Route a call by exposed name (`server__tool`).
    pub async fn route_call(&self, exposed_name: &str, arguments: Value) -> Result<ToolCallResult> {
        self.route_call_with(exposed_name, arguments, CallOptions::default())
            .await
    }

    pub async fn route_call_with(
        &self,
        exposed_name: &str,
        arguments: Value,
        options: CallOptions,
    ) -> Result<ToolCallResult> {
        let key = self.registry.read().await.resolve(exposed_name)?;
        self.call_key(&key, arguments, options).await
    }

    pub async fn call_key(
        &self,
        key: &ToolKey,
        arguments: Value,
        options: CallOptions,
    ) -> Result<ToolCallResult> {
        let entry = self.registry.read().await.lookup(key)?;
        if !entry.session.is_ready() {
            return Err(McpToolsError::ConnectionLost(key.server.clone()));
        }
        tracing::debug!(server = %key.server, tool = %key.tool, "routing tool call");
        entry
            .session
            .call_tool_with(&key.tool, arguments, options)
            .await
    }

    /// Every registered tool in registry order.
    pub async fn list_tools(&self) -> Vec<SessionTool> {
        self.registry.read().await.list_all()
    }

    pub async fn lookup(&self, exposed_name: &str) -> Result<SessionTool> {
        self.registry.read().await.lookup_name(exposed_name)
    }

    pub async fn list_resources(&self) -> Vec<ResourceDescriptor> {
        self.registry.read().await.list_resources()
    }

    pub async fn read_resource(&self, server_id: &str, uri: &str) -> Result<Vec<ResourceContents>> {
        let session = self.session(server_id).await?;
        session.read_resource(uri).await
    }

    /// The ready session for `server_id`.
    pub async fn session(&self, server_id: &str) -> Result<Arc<ProtocolSession>> {
        self.slot(server_id)?;
        self.registry
            .read()
            .await
            .session(server_id)
            .filter(|session| session.is_ready())
            .cloned()
            .ok_or_else(|| {
                McpToolsError::InvalidState(format!("MCP server '{server_id}' is not connected"))
            })
    }

    pub async fn negotiated(&self, server_id: &str) -> Result<NegotiatedCapabilities> {
        let session = self.session(server_id).await?;
        session.negotiated().cloned().ok_or_else(|| {
            McpToolsError::InvalidState(format!("MCP server '{server_id}' has no handshake"))
        })
    }

    pub async fn status(&self, server_id: &str) -> Result<EndpointStatus> {
        let slot = self.slot(server_id)?;
        let state = slot.state.lock().await;
        let (session_state, tool_count) = match &state.session {
            Some(session) => {
                let session_state = session.state();
                let count = if session_state.is_ready() {
                    session.cached_tools().len()
                } else {
                    0
                };
                (session_state, count)
            }
            None => (SessionState::Disconnected(None), 0),
        };
        Ok(EndpointStatus {
            server_id: slot.endpoint.id.clone(),
            label: slot.endpoint.label.clone(),
            transport: slot.endpoint.transport.kind(),
            address: slot.endpoint.transport.address(),
            state: session_state,
            connected_at: state.connected_at,
            last_error: state.last_error.clone(),
            tool_count,
        })
    }

    /// Status of every endpoint in configuration order.
    pub async fn statuses(&self) -> Vec<EndpointStatus> {
        let mut statuses = Vec::with_capacity(self.order.len());
        for id in &self.order {
            if let Ok(status) = self.status(id).await {
                statuses.push(status);
            }
        }
        statuses
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            if let Ok(state) = slot.state.try_lock() {
                if let Some(session) = &state.session {
                    session.cancel();
                }
            }
        }
    }
}

//! One live connection to one MCP server.
//!
//! A [`ProtocolSession`] owns a single [`MCPTransport`] and moves it into a
//! driver task. The driver is the only code that touches the transport: it
//! writes frames queued by callers and demultiplexes inbound frames by
//! correlation id into a table of pending `oneshot` senders. Callers suspend on
//! their receiver until the response arrives, the session disconnects, the
//! timeout elapses or the caller cancels.
//!
//! Lifecycle:
//!
//! ```text
//! Disconnected(None) -> Connecting -> Handshaking -> Ready -> Disconnected(Some(reason))
//! ```
//!
//! `Disconnected(Some(_))` is terminal. Reconnecting means building a new
//! session, which is what [`SessionManager`](super::manager::SessionManager)
//! does.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::protocol::{
    self, correlation_id, error_codes, methods, InboundFrame, InitializeResult,
    NegotiatedCapabilities, RequestId, ResponseOutcome, RpcError,
};
use super::registry::ToolKey;
use super::schema::{
    coerce_tool_arguments, ListResourcesPage, ListToolsPage, ReadResourceResult,
    ResourceContents, ResourceDescriptor, ToolCallResult, ToolDescriptor,
};
use super::transport::{MCPTransport, TransportConnector};
use crate::config::{ServerEndpoint, SessionConfig};
use crate::error::{McpToolsError, Result};
use crate::tools::validation::validate_arguments;
use crate::util::timeout::with_timeout;

/// Upper bound on `nextCursor` pages followed by one listing call.
const MAX_LIST_PAGES: usize = 256;

/// Ids of timed-out or cancelled requests remembered for late-response logging.
const ABANDONED_HISTORY: usize = 128;

const OUTBOUND_QUEUE: usize = 64;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `close()` was called or the session was dropped.
    ClientClosed,
    /// The server closed the connection.
    PeerClosed,
    Transport(String),
    Handshake(String),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientClosed => f.write_str("closed by client"),
            Self::PeerClosed => f.write_str("closed by server"),
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Handshake(message) => write!(f, "handshake failure: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// `None` before the first connect, `Some` once the session has ended.
    Disconnected(Option<DisconnectReason>),
    Connecting,
    Handshaking,
    Ready,
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected(Some(_)))
    }

    pub fn disconnect_reason(&self) -> Option<&DisconnectReason> {
        match self {
            Self::Disconnected(reason) => reason.as_ref(),
            _ => None,
        }
    }
}

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overrides the session's request timeout.
    pub timeout: Option<Duration>,
    /// Cancelling the token fails the call with `Cancelled`. The request
    /// already written to the server is not retracted.
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

struct Outbound {
    frame: Value,
    written: oneshot::Sender<Result<()>>,
}

#[derive(Default)]
struct PendingTable {
    entries: HashMap<RequestId, oneshot::Sender<ResponseOutcome>>,
    abandoned: VecDeque<RequestId>,
    closed: bool,
}

/// State shared between callers and the driver task.
struct Shared {
    server: String,
    pending: Mutex<PendingTable>,
    state: watch::Sender<SessionState>,
    tools_stale: AtomicBool,
}

impl Shared {
    fn pending(&self) -> std::sync::MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: RequestId, tx: oneshot::Sender<ResponseOutcome>) -> Result<()> {
        let mut pending = self.pending();
        if pending.closed {
            return Err(McpToolsError::ConnectionLost(self.server.clone()));
        }
        pending.entries.insert(id, tx);
        Ok(())
    }

    fn abandon(&self, id: RequestId) {
        let mut pending = self.pending();
        if pending.entries.remove(&id).is_some() {
            if pending.abandoned.len() == ABANDONED_HISTORY {
                pending.abandoned.pop_front();
            }
            pending.abandoned.push_back(id);
        }
    }

    fn resolve(&self, id: Value, outcome: ResponseOutcome) {
        let Some(request_id) = correlation_id(&id) else {
            tracing::warn!(server = %self.server, %id, "dropping response with foreign id");
            return;
        };

        let (entry, abandoned) = {
            let mut pending = self.pending();
            let entry = pending.entries.remove(&request_id);
            let abandoned = entry.is_none() && pending.abandoned.contains(&request_id);
            (entry, abandoned)
        };
        match entry {
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    tracing::debug!(server = %self.server, request_id, "caller gave up before response");
                }
            }
            None if abandoned => {
                tracing::debug!(server = %self.server, request_id, "discarding late response");
            }
            None => {
                tracing::warn!(server = %self.server, request_id, "dropping response with unmatched id");
            }
        }
    }

    /// Handle one inbound frame. Returns a reply to write, if any.
    fn dispatch(&self, frame: Value) -> Option<Value> {
        match InboundFrame::classify(frame) {
            Ok(InboundFrame::Response { id, outcome }) => {
                self.resolve(id, outcome);
                None
            }
            Ok(InboundFrame::Request { id, method, .. }) => {
                if method == methods::PING {
                    tracing::trace!(server = %self.server, "answering server ping");
                    Some(protocol::result_response(id, json!({})))
                } else {
                    tracing::debug!(server = %self.server, %method, "rejecting unsupported server request");
                    Some(protocol::error_response(id, RpcError::method_not_found(&method)))
                }
            }
            Ok(InboundFrame::Notification { method, .. }) => {
                if method == methods::TOOLS_LIST_CHANGED {
                    tracing::info!(server = %self.server, "server tool list changed");
                    self.tools_stale.store(true, Ordering::SeqCst);
                } else {
                    tracing::debug!(server = %self.server, %method, "ignoring notification");
                }
                None
            }
            Err(error) => {
                tracing::warn!(server = %self.server, %error, "dropping malformed frame");
                None
            }
        }
    }

    /// Fail every outstanding call and publish the terminal state.
    fn finish(&self, reason: DisconnectReason) {
        let orphaned = {
            let mut pending = self.pending();
            pending.closed = true;
            std::mem::take(&mut pending.entries)
        };
        if !orphaned.is_empty() {
            tracing::debug!(server = %self.server, count = orphaned.len(), "failing pending requests");
        }
        // Dropping the senders wakes each caller with ConnectionLost.
        drop(orphaned);
        self.mark_disconnected(reason);
    }

    fn mark_disconnected(&self, reason: DisconnectReason) {
        let server = &self.server;
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            tracing::info!(server = %server, %reason, "MCP session disconnected");
            *state = SessionState::Disconnected(Some(reason));
            true
        });
    }
}

/// Removes the pending entry unless the response was taken.
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: RequestId,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.abandon(self.id);
        }
    }
}

async fn drive(
    shared: Arc<Shared>,
    mut transport: Box<dyn MCPTransport>,
    mut outbound: mpsc::Receiver<Outbound>,
    shutdown: CancellationToken,
) {
    let reason = loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break DisconnectReason::ClientClosed,
            next = outbound.recv() => {
                let Some(Outbound { frame, written }) = next else {
                    break DisconnectReason::ClientClosed;
                };
                let result = transport.send(frame).await;
                let failure = result.as_ref().err().map(ToString::to_string);
                let _ = written.send(result);
                if let Some(message) = failure {
                    break DisconnectReason::Transport(message);
                }
            }
            inbound = transport.receive() => match inbound {
                Ok(Some(frame)) => {
                    if let Some(reply) = shared.dispatch(frame) {
                        if let Err(error) = transport.send(reply).await {
                            break DisconnectReason::Transport(error.to_string());
                        }
                    }
                }
                Ok(None) => break DisconnectReason::PeerClosed,
                Err(error) => break DisconnectReason::Transport(error.to_string()),
            },
        }
    };

    if let Err(error) = transport.close().await {
        tracing::debug!(server = %shared.server, %error, "error while closing transport");
    }
    shared.finish(reason);
}

/// A connection to one MCP server.
pub struct ProtocolSession {
    endpoint: ServerEndpoint,
    config: SessionConfig,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    outbound: Mutex<Option<mpsc::Sender<Outbound>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
    negotiated: OnceLock<NegotiatedCapabilities>,
    tools: RwLock<Arc<Vec<ToolDescriptor>>>,
}

impl fmt::Debug for ProtocolSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolSession")
            .field("server", &self.endpoint.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ProtocolSession {
    pub fn new(endpoint: ServerEndpoint, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected(None));
        Self {
            shared: Arc::new(Shared {
                server: endpoint.id.clone(),
                pending: Mutex::new(PendingTable::default()),
                state,
                tools_stale: AtomicBool::new(false),
            }),
            endpoint,
            config,
            next_id: AtomicU64::new(1),
            outbound: Mutex::new(None),
            driver: Mutex::new(None),
            shutdown: CancellationToken::new(),
            negotiated: OnceLock::new(),
            tools: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub fn server_id(&self) -> &str {
        &self.endpoint.id
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.shared.state.borrow().is_ready()
    }

    pub fn negotiated(&self) -> Option<&NegotiatedCapabilities> {
        self.negotiated.get()
    }

    /// Tools from the last successful discovery.
    pub fn cached_tools(&self) -> Arc<Vec<ToolDescriptor>> {
        Arc::clone(&self.tools.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Whether the server announced a tool list change since the last discovery.
    pub fn tools_stale(&self) -> bool {
        self.shared.tools_stale.load(Ordering::SeqCst)
    }

    /// Open a transport through `connector`, then handshake.
    ///
    /// The whole sequence is bounded by the configured connect timeout.
    pub async fn connect_with(
        &self,
        connector: &dyn TransportConnector,
    ) -> Result<NegotiatedCapabilities> {
        self.begin_connect()?;
        let attempt = async {
            let transport = connector.connect(&self.endpoint).await?;
            self.start(transport).await
        };
        self.bounded_connect(attempt).await
    }

    /// Handshake over an already-open transport.
    pub async fn connect(&self, transport: Box<dyn MCPTransport>) -> Result<NegotiatedCapabilities> {
        self.begin_connect()?;
        self.bounded_connect(self.start(transport)).await
    }

    fn begin_connect(&self) -> Result<()> {
        let mut began = false;
        self.shared.state.send_if_modified(|state| {
            if *state == SessionState::Disconnected(None) {
                *state = SessionState::Connecting;
                began = true;
            }
            began
        });
        if began {
            tracing::debug!(server = %self.endpoint.id, "connecting MCP session");
            Ok(())
        } else {
            Err(McpToolsError::InvalidState(format!(
                "session '{}' cannot connect from state {}",
                self.endpoint.id,
                self.state()
            )))
        }
    }

    async fn bounded_connect(
        &self,
        attempt: impl std::future::Future<Output = Result<NegotiatedCapabilities>>,
    ) -> Result<NegotiatedCapabilities> {
        match with_timeout(self.config.connect_timeout, attempt).await {
            Ok(negotiated) => Ok(negotiated),
            Err(error) => {
                let reason = match &error {
                    McpToolsError::Handshake { message, .. } => {
                        DisconnectReason::Handshake(message.clone())
                    }
                    other => DisconnectReason::Transport(other.to_string()),
                };
                self.shutdown_driver(reason).await;
                Err(error)
            }
        }
    }

    async fn start(&self, transport: Box<dyn MCPTransport>) -> Result<NegotiatedCapabilities> {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        let handle = tokio::spawn(drive(
            Arc::clone(&self.shared),
            transport,
            rx,
            self.shutdown.clone(),
        ));
        *self.driver.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        self.shared.state.send_replace(SessionState::Handshaking);
        self.handshake().await
    }

    async fn handshake(&self) -> Result<NegotiatedCapabilities> {
        let server = self.endpoint.id.as_str();
        let params = protocol::initialize_params(&self.config);
        let (_, outcome) = self
            .request(methods::INITIALIZE, params, self.config.connect_timeout, None)
            .await?;
        let result = outcome.map_err(|error| {
            McpToolsError::handshake(server, format!("initialize rejected: {}", error.message))
        })?;
        let result: InitializeResult = serde_json::from_value(result).map_err(|error| {
            McpToolsError::handshake(server, format!("malformed initialize result: {error}"))
        })?;

        if !self.config.supports_version(&result.protocol_version) {
            return Err(McpToolsError::handshake(
                server,
                format!(
                    "unsupported protocol version '{}' (supported: {})",
                    result.protocol_version,
                    self.config.protocol_versions.join(", ")
                ),
            ));
        }

        self.notify(methods::INITIALIZED, None).await?;

        let negotiated = NegotiatedCapabilities::from(result);
        let _ = self.negotiated.set(negotiated.clone());
        self.shared.state.send_replace(SessionState::Ready);
        tracing::info!(
            server,
            protocol_version = %negotiated.protocol_version,
            server_name = %negotiated.server_info.name,
            "MCP session ready"
        );
        Ok(negotiated)
    }

    fn sender(&self) -> Result<mpsc::Sender<Outbound>> {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| McpToolsError::ConnectionLost(self.endpoint.id.clone()))
    }

    async fn write(&self, sender: &mpsc::Sender<Outbound>, frame: Value) -> Result<()> {
        let lost = || McpToolsError::ConnectionLost(self.endpoint.id.clone());
        let (written, ack) = oneshot::channel();
        sender
            .send(Outbound { frame, written })
            .await
            .map_err(|_| lost())?;
        ack.await.map_err(|_| lost())?
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let sender = self.sender()?;
        self.write(&sender, protocol::notification(method, params)).await
    }

    /// Send one request and wait for its response.
    async fn request(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<(RequestId, ResponseOutcome)> {
        let sender = self.sender()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared.register(id, tx)?;
        let mut guard = PendingGuard {
            shared: &self.shared,
            id,
            armed: true,
        };

        tracing::debug!(server = %self.endpoint.id, request_id = id, method, "sending request");
        let exchange = async {
            self.write(&sender, protocol::request(id, method, params)).await?;
            rx.await
                .map_err(|_| McpToolsError::ConnectionLost(self.endpoint.id.clone()))
        };
        let exchange = with_timeout(timeout, exchange);

        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    Err(McpToolsError::Cancelled(format!("{method} (request {id})")))
                }
                outcome = exchange => outcome,
            },
            None => exchange.await,
        };

        if let Err(error) = &outcome {
            tracing::debug!(server = %self.endpoint.id, request_id = id, method, %error, "request failed");
        }
        let outcome = outcome?;
        guard.armed = false;
        Ok((id, outcome))
    }

    fn require_ready(&self) -> Result<()> {
        let state = self.state();
        if state.is_ready() {
            Ok(())
        } else {
            Err(McpToolsError::InvalidState(format!(
                "session '{}' is {state}, not ready",
                self.endpoint.id
            )))
        }
    }

    fn default_timeout(&self) -> Duration {
        self.endpoint
            .request_timeout()
            .unwrap_or(self.config.request_timeout)
    }

    fn capabilities_allow(&self, check: impl Fn(&NegotiatedCapabilities) -> bool) -> bool {
        self.negotiated.get().is_some_and(check)
    }

    async fn list_pages(&self, method: &str) -> Result<Vec<Value>> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            if pages.len() == MAX_LIST_PAGES {
                return Err(McpToolsError::Protocol {
                    server: self.endpoint.id.clone(),
                    code: error_codes::INTERNAL_ERROR,
                    message: format!("{method} did not finish after {MAX_LIST_PAGES} pages"),
                });
            }
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let (_, outcome) = self
                .request(method, params, self.default_timeout(), None)
                .await?;
            let page = outcome.map_err(|error| error.into_error(&self.endpoint.id))?;
            cursor = page
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_owned);
            pages.push(page);
            if cursor.is_none() {
                return Ok(pages);
            }
        }
    }

    /// List the server's tools and replace the cached set.
    ///
    /// Tools keep server order. A duplicate name keeps its first entry.
    pub async fn discover_tools(&self) -> Result<Vec<ToolDescriptor>> {
        self.require_ready()?;
        let server = self.endpoint.id.as_str();

        let mut tools = Vec::new();
        if self.capabilities_allow(|n| n.capabilities.supports_tools()) {
            let mut seen = HashSet::new();
            for page in self.list_pages(methods::TOOLS_LIST).await? {
                let page: ListToolsPage = serde_json::from_value(page)?;
                for tool in page.tools {
                    if !seen.insert(tool.name.clone()) {
                        tracing::warn!(server, tool = %tool.name, "ignoring duplicate tool name");
                        continue;
                    }
                    tools.push(tool.into_descriptor(server));
                }
            }
        } else {
            tracing::debug!(server, "server does not advertise tools");
        }

        *self.tools.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(tools.clone());
        self.shared.tools_stale.store(false, Ordering::SeqCst);
        tracing::debug!(server, count = tools.len(), "discovered tools");
        Ok(tools)
    }

    /// Invoke a tool with the session's default timeout.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        self.call_tool_with(name, arguments, CallOptions::default())
            .await
    }

    /// Invoke a tool from the cached set.
    ///
    /// Arguments are checked against the tool's input schema first; on failure
    /// nothing is written to the transport.
    pub async fn call_tool_with(
        &self,
        name: &str,
        arguments: Value,
        options: CallOptions,
    ) -> Result<ToolCallResult> {
        self.require_ready()?;
        let tools = self.cached_tools();
        let descriptor = tools
            .iter()
            .find(|tool| tool.name == name)
            .ok_or_else(|| {
                McpToolsError::UnknownTool(ToolKey::new(&self.endpoint.id, name).exposed_name())
            })?;

        let arguments = coerce_tool_arguments(name, arguments)?;
        validate_arguments(&arguments, &descriptor.input_schema).map_err(|message| {
            McpToolsError::SchemaValidation {
                tool: name.to_owned(),
                message,
            }
        })?;

        let timeout = options.timeout.unwrap_or_else(|| self.default_timeout());
        let (request_id, outcome) = self
            .request(
                methods::TOOLS_CALL,
                json!({ "name": name, "arguments": arguments }),
                timeout,
                options.cancel.as_ref(),
            )
            .await?;
        tracing::debug!(
            server = %self.endpoint.id,
            request_id,
            tool = name,
            success = outcome.is_ok(),
            "tool call completed"
        );
        Ok(ToolCallResult::from_response(
            request_id,
            &self.endpoint.id,
            name,
            outcome,
        ))
    }

    pub async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        self.require_ready()?;
        if !self.capabilities_allow(|n| n.capabilities.supports_resources()) {
            return Ok(Vec::new());
        }
        let mut resources = Vec::new();
        for page in self.list_pages(methods::RESOURCES_LIST).await? {
            let page: ListResourcesPage = serde_json::from_value(page)?;
            resources.extend(page.resources.into_iter().map(|mut resource| {
                resource.server_id = self.endpoint.id.clone();
                resource
            }));
        }
        Ok(resources)
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContents>> {
        self.require_ready()?;
        let (_, outcome) = self
            .request(
                methods::RESOURCES_READ,
                json!({ "uri": uri }),
                self.default_timeout(),
                None,
            )
            .await?;
        let result = outcome.map_err(|error| error.into_error(&self.endpoint.id))?;
        let result: ReadResourceResult = serde_json::from_value(result)?;
        Ok(result.contents)
    }

    /// Round-trip a `ping` request.
    pub async fn ping(&self) -> Result<()> {
        self.require_ready()?;
        let (_, outcome) = self
            .request(methods::PING, Value::Null, self.default_timeout(), None)
            .await?;
        outcome
            .map(|_| ())
            .map_err(|error| error.into_error(&self.endpoint.id))
    }

    /// Signal the driver to stop without waiting for it.
    pub(crate) fn cancel(&self) {
        self.shutdown.cancel();
    }

    /// Close the session and wait for the driver to stop. Idempotent.
    pub async fn close(&self) {
        self.shutdown_driver(DisconnectReason::ClientClosed).await;
    }

    async fn shutdown_driver(&self, reason: DisconnectReason) {
        // Publish the reason first; the driver's own reason is then ignored.
        self.shared.mark_disconnected(reason);
        self.shutdown.cancel();
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let handle = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                if let Err(error) = handle.await {
                    tracing::warn!(server = %self.endpoint.id, %error, "session driver panicked");
                    self.shared.finish(DisconnectReason::ClientClosed);
                }
            }
            // Never started, or already joined.
            None => self.shared.finish(DisconnectReason::ClientClosed),
        }
    }
}

impl Drop for ProtocolSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

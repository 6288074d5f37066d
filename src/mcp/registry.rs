//! Namespaced index of tools and resources across servers.
//!
//! Tools are exposed as `<server_id>__<tool_name>`. Exposed names resolve
//! through a route table rather than by splitting, since a server id may end
//! in `_` and a tool name may contain the separator.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::schema::{ResourceDescriptor, ToolDescriptor};
use crate::error::{McpToolsError, Result};

pub const KEY_SEPARATOR: &str = "__";

/// Globally unique tool identity: owning server plus upstream tool name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolKey {
    pub server: String,
    pub tool: String,
}

impl ToolKey {
    pub fn new(server: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            tool: tool.into(),
        }
    }

    pub fn exposed_name(&self) -> String {
        format!("{}{KEY_SEPARATOR}{}", self.server, self.tool)
    }

    /// Split at the first separator. Ambiguous for server ids ending in `_`;
    /// registered names go through [`ToolRegistry::resolve`] instead.
    pub fn parse(exposed_name: &str) -> Result<Self> {
        match exposed_name.split_once(KEY_SEPARATOR) {
            Some((server, tool)) if !server.is_empty() && !tool.is_empty() => {
                Ok(Self::new(server, tool))
            }
            _ => Err(McpToolsError::UnknownTool(exposed_name.to_owned())),
        }
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.server, self.tool)
    }
}

impl FromStr for ToolKey {
    type Err = McpToolsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A registry entry: descriptor plus a handle to the owning session.
#[derive(Debug, Clone)]
pub struct RegisteredTool<S> {
    pub key: ToolKey,
    pub descriptor: ToolDescriptor,
    pub session: S,
}

struct ServerEntry<S> {
    session: S,
    tools: BTreeMap<String, ToolDescriptor>,
    resources: Vec<ResourceDescriptor>,
}

/// Pure index from [`ToolKey`] to descriptor and owning session.
///
/// `S` is the session handle; the manager uses `Arc<ProtocolSession>`.
pub struct ToolRegistry<S> {
    /// First-registration order. A removed server keeps its slot.
    order: Vec<String>,
    servers: HashMap<String, ServerEntry<S>>,
    /// Exposed name to key, for every listed tool.
    routes: HashMap<String, ToolKey>,
}

impl<S> Default for ToolRegistry<S> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            servers: HashMap::new(),
            routes: HashMap::new(),
        }
    }
}

impl<S: Clone> ToolRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the listing position of `server_ids` before any of them registers.
    pub fn with_order<I, T>(server_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut order: Vec<String> = Vec::new();
        for id in server_ids {
            let id = id.into();
            if !order.contains(&id) {
                order.push(id);
            }
        }
        Self {
            order,
            ..Self::default()
        }
    }

    /// Replace every entry of `server_id` with `descriptors`.
    ///
    /// A tool whose exposed name is already routed to another server is
    /// skipped. Returns the number of tools now registered for that server.
    pub fn register(
        &mut self,
        server_id: &str,
        session: S,
        descriptors: impl IntoIterator<Item = ToolDescriptor>,
    ) -> usize {
        if !self.order.iter().any(|id| id == server_id) {
            self.order.push(server_id.to_owned());
        }

        self.drop_routes(server_id);

        let mut tools = BTreeMap::new();
        for mut descriptor in descriptors {
            descriptor.server_id = server_id.to_owned();
            if tools.contains_key(&descriptor.name) {
                tracing::warn!(server = server_id, tool = %descriptor.name, "duplicate tool name, keeping first");
                continue;
            }
            let key = ToolKey::new(server_id, &descriptor.name);
            let exposed = key.exposed_name();
            if let Some(owner) = self.routes.get(&exposed) {
                tracing::warn!(
                    server = server_id,
                    tool = %descriptor.name,
                    owner = %owner.server,
                    "exposed tool name already taken, skipping"
                );
                continue;
            }
            self.routes.insert(exposed, key);
            tools.insert(descriptor.name.clone(), descriptor);
        }
        let count = tools.len();

        let resources = self
            .servers
            .remove(server_id)
            .map(|previous| previous.resources)
            .unwrap_or_default();
        self.servers.insert(
            server_id.to_owned(),
            ServerEntry {
                session,
                tools,
                resources,
            },
        );
        count
    }

    /// Replace the resources recorded for a registered server.
    pub fn register_resources(
        &mut self,
        server_id: &str,
        resources: Vec<ResourceDescriptor>,
    ) -> Result<()> {
        let entry = self.servers.get_mut(server_id).ok_or_else(|| {
            McpToolsError::InvalidState(format!("server '{server_id}' is not registered"))
        })?;
        entry.resources = resources;
        Ok(())
    }

    /// Remove every entry owned by `server_id`.
    pub fn remove(&mut self, server_id: &str) -> Option<S> {
        self.drop_routes(server_id);
        self.servers.remove(server_id).map(|entry| entry.session)
    }

    /// Remove `server_id` only if its current session satisfies `owned`.
    pub fn remove_matching(&mut self, server_id: &str, owned: impl FnOnce(&S) -> bool) -> bool {
        let matches = self
            .servers
            .get(server_id)
            .is_some_and(|entry| owned(&entry.session));
        if matches {
            self.remove(server_id);
        }
        matches
    }

    pub fn lookup(&self, key: &ToolKey) -> Result<RegisteredTool<S>> {
        self.servers
            .get(&key.server)
            .and_then(|entry| {
                entry.tools.get(&key.tool).map(|descriptor| RegisteredTool {
                    key: key.clone(),
                    descriptor: descriptor.clone(),
                    session: entry.session.clone(),
                })
            })
            .ok_or_else(|| McpToolsError::UnknownTool(key.exposed_name()))
    }

    /// The key a listed exposed name routes to.
    pub fn resolve(&self, exposed_name: &str) -> Result<ToolKey> {
        self.routes
            .get(exposed_name)
            .cloned()
            .ok_or_else(|| McpToolsError::UnknownTool(exposed_name.to_owned()))
    }

    /// Look up by exposed name (`server__tool`).
    pub fn lookup_name(&self, exposed_name: &str) -> Result<RegisteredTool<S>> {
        self.lookup(&self.resolve(exposed_name)?)
    }

    pub fn session(&self, server_id: &str) -> Option<&S> {
        self.servers.get(server_id).map(|entry| &entry.session)
    }

    /// Every tool, ordered by server registration order then tool name.
    pub fn list_all(&self) -> Vec<RegisteredTool<S>> {
        self.registered()
            .flat_map(|(server_id, entry)| {
                entry.tools.values().map(move |descriptor| RegisteredTool {
                    key: ToolKey::new(server_id, &descriptor.name),
                    descriptor: descriptor.clone(),
                    session: entry.session.clone(),
                })
            })
            .collect()
    }

    pub fn list_resources(&self) -> Vec<ResourceDescriptor> {
        self.registered()
            .flat_map(|(_, entry)| entry.resources.iter().cloned())
            .collect()
    }

    /// Registered server ids in registration order.
    pub fn server_ids(&self) -> Vec<String> {
        self.registered().map(|(id, _)| id.to_owned()).collect()
    }

    pub fn len(&self) -> usize {
        self.servers.values().map(|entry| entry.tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn drop_routes(&mut self, server_id: &str) {
        if let Some(entry) = self.servers.get(server_id) {
            for name in entry.tools.keys() {
                self.routes.remove(&ToolKey::new(server_id, name).exposed_name());
            }
        }
    }

    fn registered(&self) -> impl Iterator<Item = (&str, &ServerEntry<S>)> {
        self.order
            .iter()
            .filter_map(|id| self.servers.get(id).map(|entry| (id.as_str(), entry)))
    }
}

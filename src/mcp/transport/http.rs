use std::collections::BTreeMap;

use async_trait::async_trait;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;
use serde_json::Value;

use super::common::{ErasedRoleClientTransport, RmcpFrameTransport};
use super::MCPTransport;
use crate::error::{McpToolsError, Result};

/// Streamable HTTP transport (for remote MCP servers).
pub struct StreamableHttpTransport {
    url: String,
    inner: RmcpFrameTransport,
}

impl StreamableHttpTransport {
    /// Open a transport to `url`. Must be called inside a tokio runtime.
    ///
    /// Only the `Authorization` header is forwarded, as a bearer token.
    pub fn open(server: &str, url: &str, headers: &BTreeMap<String, String>) -> Result<Self> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(McpToolsError::Configuration(format!(
                "server '{server}': streamable HTTP url must be http(s), got '{url}'"
            )));
        }

        let mut config = StreamableHttpClientTransportConfig::with_uri(url);
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("authorization") {
                let token = value
                    .strip_prefix("Bearer ")
                    .or_else(|| value.strip_prefix("bearer "))
                    .unwrap_or(value);
                config = config.auth_header(token.to_owned());
            } else {
                tracing::warn!(server, header = %name, "ignoring unsupported HTTP header");
            }
        }

        let transport = StreamableHttpClientTransport::from_config(config);
        Ok(Self {
            url: url.to_owned(),
            inner: RmcpFrameTransport::new(
                server,
                Box::new(ErasedRoleClientTransport::new(server, transport)),
            ),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MCPTransport for StreamableHttpTransport {
    async fn send(&mut self, frame: Value) -> Result<()> {
        self.inner.send(frame).await
    }

    async fn receive(&mut self) -> Result<Option<Value>> {
        self.inner.receive().await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }
}

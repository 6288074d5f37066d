//! Scripted rmcp client transport for exercising the frame adapter.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rmcp::service::{RoleClient, RxJsonRpcMessage, TxJsonRpcMessage};
use serde_json::{json, Value};

use super::common::DynRoleClientTransport;
use crate::error::Result;

/// What the scripted transport observed.
#[derive(Debug, Default)]
pub(super) struct Observed {
    pub sent: Vec<Value>,
    pub closes: usize,
}

/// Replays server frames in order, then reports end of stream.
pub(super) struct ScriptedInner {
    replies: VecDeque<RxJsonRpcMessage<RoleClient>>,
    observed: Arc<Mutex<Observed>>,
}

impl ScriptedInner {
    pub(super) fn new(replies: Vec<Value>) -> (Self, Arc<Mutex<Observed>>) {
        let observed = Arc::new(Mutex::new(Observed::default()));
        let replies = replies
            .into_iter()
            .map(|frame| serde_json::from_value(frame).expect("scripted frame should decode"))
            .collect();
        (
            Self {
                replies,
                observed: Arc::clone(&observed),
            },
            observed,
        )
    }
}

#[async_trait]
impl DynRoleClientTransport for ScriptedInner {
    async fn send(&mut self, message: TxJsonRpcMessage<RoleClient>) -> Result<()> {
        let frame = serde_json::to_value(message)?;
        self.observed.lock().unwrap().sent.push(frame);
        Ok(())
    }

    async fn receive(&mut self) -> Option<RxJsonRpcMessage<RoleClient>> {
        self.replies.pop_front()
    }

    async fn close(&mut self) -> Result<()> {
        self.observed.lock().unwrap().closes += 1;
        Ok(())
    }
}

pub(super) fn list_tools_request(id: u64) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": "tools/list", "params": {} })
}

pub(super) fn empty_tools_response(id: u64) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": { "tools": [] } })
}

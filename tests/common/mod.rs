#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aditamil_mcp::core::error::ToolError;
use aditamil_mcp::core::server::{self, AppState, McpServer, ToolRegistry};
use aditamil_mcp::gemini::{GenerationParams, TextGenerator};
use aditamil_mcp::tools::ToolContext;
use async_trait::async_trait;
use serde_json::Value;

/// Canned reply for one generate call.
pub enum Reply {
    Text(String),
    Fail(u16, String),
}

/// Generator that replays canned replies in order and records every prompt.
#[derive(Default)]
pub struct StubGenerator {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(String, GenerationParams)>>,
}

impl StubGenerator {
    pub fn with_replies<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stub = Self::default();
        stub.replies
            .lock()
            .unwrap()
            .extend(replies.into_iter().map(|r| Reply::Text(r.into())));
        Arc::new(stub)
    }

    pub fn failing(status: u16, message: &str) -> Arc<Self> {
        let stub = Self::default();
        stub.replies
            .lock()
            .unwrap()
            .push_back(Reply::Fail(status, message.to_string()));
        Arc::new(stub)
    }

    pub fn calls(&self) -> Vec<(String, GenerationParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push((prompt.to_string(), params));
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(status, message)) => Err(ToolError::Api { status, message }),
            None => panic!("stub generator ran out of replies"),
        }
    }
}

pub fn registry(stub: Arc<StubGenerator>) -> Arc<ToolRegistry> {
    server::initialize_tools(&ToolContext::new(stub))
}

pub fn mcp_server(stub: Arc<StubGenerator>) -> McpServer {
    McpServer::new(
        AppState {
            server_name: "aditamil".to_string(),
            server_version: "test".to_string(),
        },
        registry(stub),
    )
}

/// Send one JSON-RPC request through the server and parse the response line.
pub async fn rpc(server: &McpServer, request: Value) -> Value {
    let line = server
        .handle_line(&request.to_string())
        .await
        .expect("request should produce a response");
    serde_json::from_str(&line).unwrap()
}

/// Text of the single content block in a `tools/call` response.
pub fn call_text(response: &Value) -> String {
    let content = response["result"]["content"].as_array().unwrap();
    assert_eq!(content.len(), 1, "expected exactly one content block");
    assert_eq!(content[0]["type"], "text");
    content[0]["text"].as_str().unwrap().to_string()
}

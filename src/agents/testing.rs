//! Test doubles for agents, builders, tools and HTTP endpoints.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::{Agent, AgentBuilder, AgentError, AgentEvent, AgentEventStream, RunConfig, TurnRequest};
use crate::session::{SearchConfig, ThreadId};
use crate::tools::{BoxedTool, Tool, ToolDefinition, ToolError};

type Script = Vec<Result<AgentEvent, AgentError>>;

/// Agent that replays queued event scripts, one per turn.
#[derive(Default)]
pub struct ScriptedAgent {
    turns: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<(TurnRequest, RunConfig)>>,
    forgotten: Mutex<Vec<ThreadId>>,
}

impl ScriptedAgent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the events of the next turn.
    pub fn push_turn(&self, script: Script) {
        self.turns.lock().unwrap().push_back(script);
    }

    /// Every turn started so far.
    pub fn calls(&self) -> Vec<(TurnRequest, RunConfig)> {
        self.calls.lock().unwrap().clone()
    }

    /// Threads the controller asked the agent to forget.
    pub fn forgotten(&self) -> Vec<ThreadId> {
        self.forgotten.lock().unwrap().clone()
    }
}

impl Agent for ScriptedAgent {
    fn model_name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, request: TurnRequest, config: RunConfig) -> AgentEventStream {
        self.calls.lock().unwrap().push((request, config));
        let script = self.turns.lock().unwrap().pop_front().unwrap_or_default();
        AgentEventStream::from_items(script)
    }

    fn forget_thread(&self, thread_id: &ThreadId) {
        self.forgotten.lock().unwrap().push(thread_id.clone());
    }
}

/// Builder handing out a shared [`ScriptedAgent`] and recording each build.
#[derive(Clone)]
pub struct ScriptedBuilder {
    pub agent: Arc<ScriptedAgent>,
    builds: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    fail: Arc<AtomicBool>,
}

impl ScriptedBuilder {
    pub fn new(agent: Arc<ScriptedAgent>) -> Self {
        Self {
            agent,
            builds: Arc::default(),
            fail: Arc::default(),
        }
    }

    /// Make subsequent builds fail.
    pub fn fail_builds(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// `(model, tool names)` of every successful build.
    pub fn builds(&self) -> Vec<(String, Vec<String>)> {
        self.builds.lock().unwrap().clone()
    }
}

impl AgentBuilder for ScriptedBuilder {
    fn build(&self, model: &str, tools: Vec<BoxedTool>) -> Result<Arc<dyn Agent>, AgentError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AgentError::Config("build refused".to_string()));
        }
        let names = tools.iter().map(|t| t.name()).collect();
        self.builds.lock().unwrap().push((model.to_string(), names));
        Ok(self.agent.clone())
    }
}

/// Tool that returns its arguments under an `echo` key.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("echo", "Echo the arguments back")
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        Ok(json!({ "echo": args }))
    }
}

/// Tool that records every search config applied to it.
#[derive(Clone, Default)]
pub struct ConfigRecorderTool {
    pub applied: Arc<Mutex<Vec<SearchConfig>>>,
}

#[async_trait]
impl Tool for ConfigRecorderTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("recorder", "Records applied search configs")
    }

    async fn call(&self, _args: Value) -> Result<Value, ToolError> {
        Ok(json!([]))
    }

    fn apply_search_config(&mut self, config: &SearchConfig) {
        self.applied.lock().unwrap().push(config.clone());
    }
}

/// A `200` response streaming the given JSON payloads as SSE, then `[DONE]`.
pub fn sse_body(payloads: &[String]) -> (u16, String) {
    let mut body = String::new();
    for payload in payloads {
        body.push_str("data: ");
        body.push_str(payload);
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    (200, body)
}

/// Serve one canned response per connection and return the base URL.
pub async fn serve_http(responses: Vec<(u16, String)>) -> String {
    serve_http_capture(responses).await.0
}

/// Like [`serve_http`], also returning the raw requests as they arrive.
pub async fn serve_http_capture(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests: Arc<Mutex<Vec<String>>> = Arc::default();
    let seen = requests.clone();

    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut socket).await;
            seen.lock().unwrap().push(request);

            let content_type = if body.starts_with("data:") {
                "text/event-stream"
            } else {
                "application/json"
            };
            let head = format!(
                "HTTP/1.1 {} {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                status,
                if status == 200 { "OK" } else { "Error" },
                content_type,
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), requests)
}

/// Read a full request (headers plus `content-length` body) and return it.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

//! Model/tool loop with per-thread memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::openai::{ChatMessage, CompletionChunk, OpenAiClient, ToolCall, ToolCallAccumulator};
use super::{Agent, AgentBuilder, AgentError, AgentEvent, AgentEventStream, RunConfig, TurnRequest};
use crate::session::{Role, ThreadId};
use crate::tools::{ArcTool, BoxedTool};

/// Upper bound on model calls within one turn.
pub const MAX_STEPS: usize = 8;

const EVENT_BUFFER: usize = 256;

type Memory = Arc<Mutex<HashMap<String, Vec<ChatMessage>>>>;

fn system_prompt() -> String {
    format!(
        "You are a helpful research assistant with access to a web search tool. \
         Search whenever a question depends on current events or facts you are not sure about, \
         and ground your answer in what the results say. Today's date is {}.",
        chrono::Local::now().format("%Y-%m-%d")
    )
}

/// Builds [`ReactAgent`]s against one API endpoint.
#[derive(Debug, Clone)]
pub struct ReactAgentBuilder {
    client: OpenAiClient,
}

impl ReactAgentBuilder {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

impl AgentBuilder for ReactAgentBuilder {
    fn build(&self, model: &str, tools: Vec<BoxedTool>) -> Result<Arc<dyn Agent>, AgentError> {
        if model.trim().is_empty() {
            return Err(AgentError::Config("no model selected".to_string()));
        }
        if !self.client.has_api_key() {
            return Err(AgentError::Config(
                "no model API key configured (set OPENAI_API_KEY)".to_string(),
            ));
        }
        let tools: Vec<ArcTool> = tools.into_iter().map(ArcTool::from).collect();
        Ok(Arc::new(ReactAgent::new(self.client.clone(), model, tools)))
    }
}

/// Agent that alternates model calls and tool calls until the model answers.
///
/// Each thread id keeps its own message history. History is only saved when
/// a turn finishes, so a failed turn leaves the thread as it was.
#[derive(Clone)]
pub struct ReactAgent {
    client: OpenAiClient,
    model: String,
    tools: Vec<ArcTool>,
    memory: Memory,
}

impl ReactAgent {
    pub fn new(client: OpenAiClient, model: impl Into<String>, tools: Vec<ArcTool>) -> Self {
        Self {
            client,
            model: model.into(),
            tools,
            memory: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn memory(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<ChatMessage>>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Messages remembered for a thread.
    pub fn thread_history(&self, thread_id: &str) -> Vec<ChatMessage> {
        self.memory().get(thread_id).cloned().unwrap_or_default()
    }

    /// Number of threads with remembered messages.
    pub fn thread_count(&self) -> usize {
        self.memory().len()
    }

    async fn run_turn(
        self,
        request: TurnRequest,
        config: RunConfig,
        tx: mpsc::Sender<Result<AgentEvent, AgentError>>,
    ) {
        if let Err(e) = self.drive(request, &config, &tx).await {
            warn!(thread = %config.thread_id, error = %e, "Turn failed");
            let _ = tx.send(Err(e)).await;
        }
    }

    async fn drive(
        &self,
        request: TurnRequest,
        config: &RunConfig,
        tx: &mpsc::Sender<Result<AgentEvent, AgentError>>,
    ) -> Result<(), AgentError> {
        let thread = config.thread_id.as_str();
        let mut history = self.thread_history(thread);
        if history.is_empty() {
            history.push(ChatMessage::system(system_prompt()));
        }
        for (role, text) in request.messages {
            history.push(match role {
                Role::User => ChatMessage::user(text),
                Role::Assistant => ChatMessage::assistant(text, Vec::new()),
            });
        }

        let tool_defs: Vec<Value> = self
            .tools
            .iter()
            .map(|t| t.definition().to_openai())
            .collect();

        for step in 0..MAX_STEPS {
            debug!(thread, step, "Model step");
            let (text, calls) = self.complete(&history, &tool_defs, tx).await?;
            history.push(ChatMessage::assistant(text, calls.clone()));

            if calls.is_empty() {
                info!(thread, steps = step + 1, "Turn finished");
                self.memory().insert(thread.to_string(), history);
                return Ok(());
            }

            for call in calls {
                let args = call.parsed_arguments();
                emit(
                    tx,
                    AgentEvent::tool_start(&call.id, &call.function.name, args.clone()),
                )
                .await?;
                let result = self.call_tool(&call, args).await;
                history.push(ChatMessage::tool(&call.id, result.to_string()));
                emit(
                    tx,
                    AgentEvent::tool_result(&call.id, &call.function.name, result),
                )
                .await?;
            }
        }

        Err(AgentError::Model(format!(
            "no final answer after {} steps",
            MAX_STEPS
        )))
    }

    /// One streamed model call; forwards text and returns the finished tool calls.
    async fn complete(
        &self,
        history: &[ChatMessage],
        tool_defs: &[Value],
        tx: &mpsc::Sender<Result<AgentEvent, AgentError>>,
    ) -> Result<(String, Vec<ToolCall>), AgentError> {
        let mut chunks = self
            .client
            .stream_chat(&self.model, history, tool_defs)
            .await?;
        let mut text = String::new();
        let mut calls = ToolCallAccumulator::default();

        while let Some(chunk) = chunks.next().await {
            match chunk? {
                CompletionChunk::Text(delta) => {
                    text.push_str(&delta);
                    emit(tx, AgentEvent::text(delta)).await?;
                }
                CompletionChunk::ToolCallDelta {
                    index,
                    id,
                    name,
                    arguments,
                } => calls.push(index, id, name, &arguments)?,
                CompletionChunk::Done => break,
            }
        }

        Ok((text, calls.finish()))
    }

    /// Run a tool; failures become an error payload the model can read.
    async fn call_tool(&self, call: &ToolCall, args: Value) -> Value {
        let name = call.function.name.as_str();
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!(tool = name, "Model asked for an unknown tool");
            return json!({ "error": format!("unknown tool: {}", name) });
        };

        match tool.call(args).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                json!({ "error": e.to_string() })
            }
        }
    }
}

async fn emit(
    tx: &mpsc::Sender<Result<AgentEvent, AgentError>>,
    event: AgentEvent,
) -> Result<(), AgentError> {
    tx.send(Ok(event))
        .await
        .map_err(|_| AgentError::Transport("event receiver dropped".to_string()))
}

impl Agent for ReactAgent {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn stream(&self, request: TurnRequest, config: RunConfig) -> AgentEventStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(self.clone().run_turn(request, config, tx));
        AgentEventStream::new(rx)
    }

    fn forget_thread(&self, thread_id: &ThreadId) {
        if self.memory().remove(thread_id.as_str()).is_some() {
            debug!(thread = %thread_id, "Forgot thread");
        }
    }
}

//! Minimal OpenAI-compatible chat completions client with SSE streaming.

use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use super::AgentError;

/// Default API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// A message in the chat completions wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    /// An assistant reply, possibly carrying tool calls.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let content = content.into();
        Self {
            role: "assistant".to_string(),
            // The API rejects an empty string next to tool calls.
            content: if content.is_empty() && !tool_calls.is_empty() {
                None
            } else {
                Some(content)
            },
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A complete tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Arguments parsed as JSON; an empty string counts as `{}`.
    pub fn parsed_arguments(&self) -> Value {
        let raw = self.function.arguments.trim();
        if raw.is_empty() {
            return json!({});
        }
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    }
}

/// One decoded piece of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionChunk {
    Text(String),
    /// Part of a tool call; fragments sharing an `index` belong together.
    ToolCallDelta {
        index: usize,
        id: Option<String>,
        name: Option<String>,
        arguments: String,
    },
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCall {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
struct StreamFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Splits a server-sent event byte stream into decoded chunks.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network reads survive intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return every chunk completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<CompletionChunk, AgentError>> {
        self.buffer.extend_from_slice(bytes);
        let mut chunks = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            parse_sse_line(line.trim(), &mut chunks);
        }

        chunks
    }
}

fn parse_sse_line(line: &str, out: &mut Vec<Result<CompletionChunk, AgentError>>) {
    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
        // Blank separators, comments and `event:` lines carry nothing for us.
        return;
    };

    if data == "[DONE]" {
        out.push(Ok(CompletionChunk::Done));
        return;
    }

    if let Ok(body) = serde_json::from_str::<ApiErrorBody>(data) {
        out.push(Err(AgentError::Model(body.error.message)));
        return;
    }

    let parsed: StreamResponse = match serde_json::from_str(data) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Skipping unparseable stream line");
            return;
        }
    };

    let Some(choice) = parsed.choices.into_iter().next() else {
        return;
    };

    if let Some(content) = choice.delta.content {
        if !content.is_empty() {
            out.push(Ok(CompletionChunk::Text(content)));
        }
    }

    for tc in choice.delta.tool_calls.unwrap_or_default() {
        let (name, arguments) = match tc.function {
            Some(f) => (f.name, f.arguments.unwrap_or_default()),
            None => (None, String::new()),
        };
        out.push(Ok(CompletionChunk::ToolCallDelta {
            index: tc.index,
            id: tc.id,
            name,
            arguments,
        }));
    }
}

/// Highest number of tool calls accepted in one model reply.
pub const MAX_TOOL_CALLS: usize = 64;

/// Assembles streamed tool call fragments into complete calls.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: Vec<ToolCall>,
}

impl ToolCallAccumulator {
    /// Merge one fragment into the call at `index`.
    pub fn push(
        &mut self,
        index: usize,
        id: Option<String>,
        name: Option<String>,
        arguments: &str,
    ) -> Result<(), AgentError> {
        if index >= MAX_TOOL_CALLS {
            return Err(AgentError::Model(format!(
                "tool call index {} exceeds the limit of {}",
                index, MAX_TOOL_CALLS
            )));
        }
        while self.calls.len() <= index {
            self.calls.push(ToolCall::new("", "", ""));
        }
        let call = &mut self.calls[index];
        if let Some(id) = id {
            call.id = id;
        }
        if let Some(name) = name {
            call.function.name.push_str(&name);
        }
        call.function.arguments.push_str(arguments);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The finished calls, skipping slots the model never named.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .enumerate()
            .filter(|(_, c)| !c.function.name.is_empty())
            .map(|(i, mut c)| {
                if c.id.is_empty() {
                    c.id = format!("call_{}", i);
                }
                c
            })
            .collect()
    }
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a streamed completion.
    pub async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<BoxStream<'static, Result<CompletionChunk, AgentError>>, AgentError> {
        let mut body = json!({
            "model": model,
            "messages": messages,
            "stream": true,
        });
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }

        debug!(model, messages = messages.len(), tools = tools.len(), "Chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&text) {
                return Err(AgentError::Model(format!("{} ({})", err.error.message, status)));
            }
            return Err(AgentError::Model(format!(
                "API returned {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let mut decoder = SseDecoder::new();
        Ok(response
            .bytes_stream()
            .flat_map(move |item| {
                let chunks = match item {
                    Ok(bytes) => {
                        trace!(len = bytes.len(), "Stream bytes");
                        decoder.feed(&bytes)
                    }
                    Err(e) => vec![Err(AgentError::from(e))],
                };
                futures::stream::iter(chunks)
            })
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_chunks(decoder: &mut SseDecoder, input: &str) -> Vec<CompletionChunk> {
        decoder
            .feed(input.as_bytes())
            .into_iter()
            .map(|c| c.unwrap())
            .collect()
    }

    // =========================================================================
    // SSE decoding
    // =========================================================================

    #[test]
    fn test_decodes_text_and_done() {
        let mut decoder = SseDecoder::new();
        let input = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Par\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"is\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        assert_eq!(
            ok_chunks(&mut decoder, input),
            vec![
                CompletionChunk::Text("Par".into()),
                CompletionChunk::Text("is".into()),
                CompletionChunk::Done,
            ]
        );
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut decoder = SseDecoder::new();
        assert!(ok_chunks(&mut decoder, "data: {\"choices\":[{\"delta\":{\"con").is_empty());
        assert_eq!(
            ok_chunks(&mut decoder, "tent\":\"hi\"}}]}\n"),
            vec![CompletionChunk::Text("hi".into())]
        );
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let mut decoder = SseDecoder::new();
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n";
        let bytes = line.as_bytes();
        let split = line.find('é').unwrap() + 1;

        assert!(decoder.feed(&bytes[..split]).is_empty());
        let chunks = decoder.feed(&bytes[split..]);
        assert_eq!(chunks, vec![Ok(CompletionChunk::Text("café".into()))]);
    }

    #[test]
    fn test_decodes_tool_call_fragments() {
        let mut decoder = SseDecoder::new();
        let input = concat!(
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"web_search\",\"arguments\":\"\"}}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"query\\\":\"}}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"rust\\\"}\"}}]}}]}\n",
        );

        let mut acc = ToolCallAccumulator::default();
        for chunk in ok_chunks(&mut decoder, input) {
            match chunk {
                CompletionChunk::ToolCallDelta {
                    index,
                    id,
                    name,
                    arguments,
                } => acc.push(index, id, name, &arguments).unwrap(),
                other => panic!("unexpected chunk {:?}", other),
            }
        }

        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.name, "web_search");
        assert_eq!(calls[0].parsed_arguments(), json!({"query": "rust"}));
    }

    #[test]
    fn test_ignores_comments_and_garbage() {
        let mut decoder = SseDecoder::new();
        let input = ": keep-alive\nevent: message\ndata: not json\ndata: {\"choices\":[]}\n";
        assert!(decoder.feed(input.as_bytes()).is_empty());
    }

    #[test]
    fn test_error_payload_becomes_model_error() {
        let mut decoder = SseDecoder::new();
        let chunks = decoder.feed(b"data: {\"error\":{\"message\":\"overloaded\"}}\n");
        assert_eq!(chunks, vec![Err(AgentError::Model("overloaded".into()))]);
    }

    // =========================================================================
    // Tool calls and messages
    // =========================================================================

    #[test]
    fn test_accumulator_names_missing_ids() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(1, None, Some("web_search".into()), "{}").unwrap();
        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
    }

    #[test]
    fn test_accumulator_rejects_out_of_range_index() {
        let mut acc = ToolCallAccumulator::default();
        let err = acc
            .push(usize::MAX, None, Some("web_search".into()), "{}")
            .unwrap_err();
        assert!(matches!(err, AgentError::Model(msg) if msg.contains("exceeds the limit")));
        assert!(acc.is_empty());

        acc.push(MAX_TOOL_CALLS - 1, None, Some("web_search".into()), "{}")
            .unwrap();
        assert_eq!(acc.finish().len(), 1);
    }

    #[test]
    fn test_parsed_arguments_fallbacks() {
        assert_eq!(ToolCall::new("a", "t", "").parsed_arguments(), json!({}));
        assert_eq!(
            ToolCall::new("a", "t", "not json").parsed_arguments(),
            json!("not json")
        );
    }

    #[test]
    fn test_assistant_message_with_tool_calls_omits_empty_content() {
        let msg = ChatMessage::assistant("", vec![ToolCall::new("c1", "web_search", "{}")]);
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("content").is_none());
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["name"], "web_search");
    }

    #[test]
    fn test_tool_message_serialization() {
        let value = serde_json::to_value(ChatMessage::tool("c1", "[]")).unwrap();
        assert_eq!(value, json!({"role": "tool", "content": "[]", "tool_call_id": "c1"}));
    }

    #[test]
    fn test_client_trims_base_url_and_redacts_key() {
        let client = OpenAiClient::new("sk-secret", "http://localhost:1234/v1/");
        assert_eq!(client.base_url(), "http://localhost:1234/v1");
        assert!(client.has_api_key());
        assert!(!format!("{:?}", client).contains("sk-secret"));
    }
}

//! Stream handling for a single agent turn.
//!
//! [`handle_stream`] drains an [`AgentEventStream`] in arrival order. Text
//! deltas grow the live answer on the render surface; resolved tool calls
//! are shown as tool blocks at the point they resolved. The caller gets
//! back everything it needs to persist the turn.

pub mod format;

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::agents::{AgentError, AgentEvent, AgentEventStream};
use crate::messaging::{tool_block_label, RenderSurface};

pub use format::{format_hits, format_search_result, SearchHit, NO_RESULTS};

/// One thing the handler pushed to the render surface.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderSnapshot {
    /// The full answer buffer after a delta was appended.
    Text(String),
    /// A tool block inserted when a call resolved.
    ToolBlock { tool_name: String, markdown: String },
}

/// A tool call that completed during the turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRecord {
    pub tool_name: String,
    /// Arguments from the matching start event, `null` if none was seen.
    pub tool_args: Value,
    pub tool_result: Value,
}

impl ToolRecord {
    /// The result as display markdown.
    pub fn formatted(&self) -> String {
        format_search_result(&self.tool_result)
    }
}

/// Everything a finished turn produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOutcome {
    pub snapshots: Vec<RenderSnapshot>,
    pub tool_records: Vec<ToolRecord>,
    pub answer: String,
}

/// The stream failed before the agent finished the turn.
///
/// Output already rendered stays on the surface; the tool calls that
/// completed before the failure are handed back for the caller to decide on.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct StreamError {
    pub source: AgentError,
    pub completed_tools: Vec<ToolRecord>,
    pub snapshots: Vec<RenderSnapshot>,
}

/// Consume one turn's events, rendering as they arrive.
pub async fn handle_stream(
    surface: &mut dyn RenderSurface,
    stream: &mut AgentEventStream,
) -> Result<StreamOutcome, StreamError> {
    let mut outcome = StreamOutcome::default();
    // call_id -> args of tool calls that started but have not resolved
    let mut pending_args: HashMap<String, Value> = HashMap::new();

    while let Some(item) = stream.recv().await {
        let event = match item {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, tools = outcome.tool_records.len(), "Agent stream failed mid-turn");
                return Err(StreamError {
                    source: e,
                    completed_tools: outcome.tool_records,
                    snapshots: outcome.snapshots,
                });
            }
        };

        match event {
            AgentEvent::TextDelta { text } => {
                if text.is_empty() {
                    continue;
                }
                outcome.answer.push_str(&text);
                surface.update_live(&outcome.answer);
                outcome
                    .snapshots
                    .push(RenderSnapshot::Text(outcome.answer.clone()));
            }
            AgentEvent::ToolStart {
                call_id,
                tool_name,
                args,
            } => {
                debug!(%call_id, %tool_name, ?args, "Tool call started");
                pending_args.insert(call_id, args);
            }
            AgentEvent::ToolResult {
                call_id,
                tool_name,
                result,
            } => {
                let tool_args = pending_args.remove(&call_id).unwrap_or_else(|| {
                    warn!(%call_id, %tool_name, "Tool result without a matching start");
                    Value::Null
                });
                let record = ToolRecord {
                    tool_name,
                    tool_args,
                    tool_result: result,
                };
                let markdown = record.formatted();
                surface.tool_block(&tool_block_label(&record.tool_name), &markdown);
                debug!(tool = %record.tool_name, "Tool call resolved");

                outcome.snapshots.push(RenderSnapshot::ToolBlock {
                    tool_name: record.tool_name.clone(),
                    markdown,
                });
                outcome.tool_records.push(record);
            }
            AgentEvent::Other => {}
        }
    }

    if !pending_args.is_empty() {
        debug!(unresolved = pending_args.len(), "Turn ended with unresolved tool calls");
    }

    Ok(outcome)
}

//! The narrow protocol spoken against the remote agent platform.
//!
//! [`AgentPlatform`] covers exactly the calls the conversation loop needs:
//! agent and thread lifecycle, run polling, tool-output round-trips, and
//! message collection. [`HttpAgentPlatform`] implements it over an
//! Assistants-style REST surface.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;

#[derive(Clone, Debug, Serialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AgentHandle {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ThreadHandle {
    pub id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// A pending tool invocation surfaced by a requires-action run.
#[derive(Clone, Debug)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

#[derive(Clone, Debug)]
pub struct RunState {
    pub id: String,
    pub status: RunStatus,
    pub last_error: Option<RunError>,
    pub required_action: Vec<ToolCall>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug)]
pub struct ThreadMessage {
    pub role: MessageRole,
    pub text: String,
    pub url_citations: Vec<String>,
}

/// The remote agent platform, reduced to the calls the loop needs.
#[async_trait]
pub trait AgentPlatform: Send + Sync {
    async fn create_agent(&self, request: CreateAgentRequest) -> Result<AgentHandle, AgentError>;
    async fn delete_agent(&self, agent_id: &str) -> Result<(), AgentError>;
    async fn create_thread(&self) -> Result<ThreadHandle, AgentError>;
    async fn post_message(&self, thread_id: &str, content: &str) -> Result<(), AgentError>;
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<RunState, AgentError>;
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunState, AgentError>;
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunState, AgentError>;
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), AgentError>;
    /// Request URLs of grounding calls made during the run, if any.
    async fn list_grounding_requests(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Vec<String>, AgentError>;
    /// Thread messages, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AgentError>;
}

pub struct HttpAgentPlatform {
    client: reqwest::Client,
    base_url: String,
    credential: String,
}

impl HttpAgentPlatform {
    pub fn new(
        endpoint: &str,
        credential: String,
        request_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, base_url: endpoint.trim_end_matches('/').to_string(), credential })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, AgentError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.credential)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    async fn get_json(&self, path: &str) -> Result<reqwest::Response, AgentError> {
        let response =
            self.client.get(self.url(path)).bearer_auth(&self.credential).send().await?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(AgentError::Api { status: status.as_u16(), body })
}

#[async_trait]
impl AgentPlatform for HttpAgentPlatform {
    async fn create_agent(&self, request: CreateAgentRequest) -> Result<AgentHandle, AgentError> {
        Ok(self.post_json("/assistants", &request).await?.json().await?)
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), AgentError> {
        let response = self
            .client
            .delete(self.url(&format!("/assistants/{agent_id}")))
            .bearer_auth(&self.credential)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn create_thread(&self) -> Result<ThreadHandle, AgentError> {
        Ok(self.post_json("/threads", &serde_json::json!({})).await?.json().await?)
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<(), AgentError> {
        self.post_json(
            &format!("/threads/{thread_id}/messages"),
            &serde_json::json!({ "role": "user", "content": content }),
        )
        .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<RunState, AgentError> {
        let wire: WireRun = self
            .post_json(
                &format!("/threads/{thread_id}/runs"),
                &serde_json::json!({ "assistant_id": agent_id }),
            )
            .await?
            .json()
            .await?;
        Ok(wire.into())
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunState, AgentError> {
        let wire: WireRun =
            self.get_json(&format!("/threads/{thread_id}/runs/{run_id}")).await?.json().await?;
        Ok(wire.into())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunState, AgentError> {
        let wire: WireRun = self
            .post_json(
                &format!("/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
                &serde_json::json!({ "tool_outputs": outputs }),
            )
            .await?
            .json()
            .await?;
        Ok(wire.into())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), AgentError> {
        self.post_json(
            &format!("/threads/{thread_id}/runs/{run_id}/cancel"),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    async fn list_grounding_requests(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Vec<String>, AgentError> {
        let steps: Value = self
            .get_json(&format!("/threads/{thread_id}/runs/{run_id}/steps"))
            .await?
            .json()
            .await?;
        let mut request_urls = Vec::new();
        collect_request_urls(&steps, &mut request_urls);
        Ok(request_urls)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AgentError> {
        let wire: WireMessageList = self
            .get_json(&format!("/threads/{thread_id}/messages?order=desc"))
            .await?
            .json()
            .await?;
        Ok(wire.data.into_iter().map(ThreadMessage::from).collect())
    }
}

// Grounding request URLs sit at varying depths of the run-step payload
// depending on the tool, so the whole document is scanned.
fn collect_request_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                match nested.as_str() {
                    Some(url) if key == "request_url" || key == "requesturl" => {
                        out.push(url.to_string());
                    }
                    _ => collect_request_urls(nested, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_request_urls(item, out);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct WireRun {
    id: String,
    status: RunStatus,
    #[serde(default)]
    last_error: Option<RunError>,
    #[serde(default)]
    required_action: Option<WireRequiredAction>,
}

#[derive(Default, Deserialize)]
struct WireRequiredAction {
    #[serde(default)]
    submit_tool_outputs: WireSubmitToolOutputs,
}

#[derive(Default, Deserialize)]
struct WireSubmitToolOutputs {
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(default)]
    function: WireFunction,
}

#[derive(Default, Deserialize)]
struct WireFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<WireRun> for RunState {
    fn from(wire: WireRun) -> Self {
        let required_action = wire
            .required_action
            .map(|action| {
                action
                    .submit_tool_outputs
                    .tool_calls
                    .into_iter()
                    .map(|call| ToolCall {
                        id: call.id,
                        name: call.function.name,
                        // Arguments travel as a JSON-encoded string; an
                        // unparsable payload is kept verbatim.
                        arguments: serde_json::from_str(&call.function.arguments)
                            .unwrap_or(Value::String(call.function.arguments)),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { id: wire.id, status: wire.status, last_error: wire.last_error, required_action }
    }
}

#[derive(Deserialize)]
struct WireMessageList {
    #[serde(default)]
    data: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct WireMessage {
    role: MessageRole,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text { text: WireText },
    #[serde(other)]
    Other,
}

#[derive(Default, Deserialize)]
struct WireText {
    #[serde(default)]
    value: String,
    #[serde(default)]
    annotations: Vec<WireAnnotation>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireAnnotation {
    UrlCitation { url_citation: WireUrlCitation },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct WireUrlCitation {
    url: String,
}

impl From<WireMessage> for ThreadMessage {
    fn from(wire: WireMessage) -> Self {
        let mut text = String::new();
        let mut url_citations = Vec::new();
        for content in wire.content {
            let WireContent::Text { text: part } = content else {
                continue;
            };
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&part.value);
            for annotation in part.annotations {
                if let WireAnnotation::UrlCitation { url_citation } = annotation {
                    url_citations.push(url_citation.url);
                }
            }
        }
        Self { role: wire.role, text, url_citations }
    }
}

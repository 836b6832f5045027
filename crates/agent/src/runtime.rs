//! The conversation loop against the remote agent platform.
//!
//! One [`AgentRuntime::ask`] call owns one agent, one thread, and one run:
//! create, converse, poll to a terminal state, collect the newest
//! assistant message, and tear the transient agent down again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::platform::{
    AgentPlatform, CreateAgentRequest, MessageRole, RunStatus, ToolOutput,
};
use crate::tools::ToolRegistry;

/// Behavioral constraints shared by every agent this service creates.
const BEHAVIOR_INSTRUCTIONS: &str = "回答は必ず入力と同じ言語で行ってください。\
事実に基づかない情報を生成しないでください。\
回答にツール固有の注釈や制御文字などの書式の痕跡を含めないでください。";

/// The search capability attached to a conversation, if any.
#[derive(Clone, Debug)]
pub enum ToolDescriptor {
    WebGrounding,
    SubsidySearch { spec: Value },
}

impl ToolDescriptor {
    /// The tool definition embedded in the create-agent request.
    pub fn definition(&self) -> Value {
        match self {
            Self::WebGrounding => json!({ "type": "web_grounding" }),
            Self::SubsidySearch { spec } => json!({
                "type": "openapi",
                "openapi": {
                    "name": "get_subsidies",
                    "description": "Search subsidies with conditions",
                    "spec": spec,
                    "auth": { "type": "anonymous" },
                }
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    pub citations: Vec<String>,
    pub query: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RuntimeOptions {
    pub model: String,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
}

pub struct AgentRuntime {
    platform: Arc<dyn AgentPlatform>,
    tools: ToolRegistry,
    options: RuntimeOptions,
}

impl AgentRuntime {
    pub fn new(platform: Arc<dyn AgentPlatform>, options: RuntimeOptions) -> Self {
        Self { platform, tools: ToolRegistry::default(), options }
    }

    /// Registers a local executor for requires-action tool calls.
    pub fn register_tool<T>(&mut self, tool: T)
    where
        T: crate::tools::Tool + 'static,
    {
        self.tools.register(tool);
    }

    /// Sends one message through a fresh agent and thread and returns the
    /// newest assistant reply.
    pub async fn ask(
        &self,
        message: &str,
        tool: Option<ToolDescriptor>,
    ) -> Result<AgentReply, AgentError> {
        let profile = AgentProfile::for_tool(tool.as_ref());
        let agent = self
            .platform
            .create_agent(CreateAgentRequest {
                name: profile.name.to_string(),
                description: profile.description.to_string(),
                instructions: format!("{}\n\n{BEHAVIOR_INSTRUCTIONS}", profile.instructions),
                model: self.options.model.clone(),
                tools: tool.iter().map(ToolDescriptor::definition).collect(),
            })
            .await?;

        let outcome = self.converse(&agent.id, message).await;

        // Transient agents are torn down on every path; a failed delete is
        // not worth failing the request over.
        if let Err(error) = self.platform.delete_agent(&agent.id).await {
            warn!(
                event_name = "agent.cleanup_failed",
                agent_id = %agent.id,
                error = %error,
                "failed to delete transient agent"
            );
        }

        outcome
    }

    async fn converse(&self, agent_id: &str, message: &str) -> Result<AgentReply, AgentError> {
        let thread = self.platform.create_thread().await?;
        self.platform.post_message(&thread.id, message).await?;
        let mut run = self.platform.create_run(&thread.id, agent_id).await?;
        let started = Instant::now();

        loop {
            match run.status {
                RunStatus::Completed => break,
                RunStatus::Failed => {
                    let message = run
                        .last_error
                        .map(|last_error| last_error.message)
                        .filter(|detail| !detail.is_empty())
                        .unwrap_or_else(|| "run failed without detail".to_string());
                    return Err(AgentError::RunFailed { message });
                }
                RunStatus::Cancelled | RunStatus::Expired | RunStatus::Unknown => break,
                RunStatus::RequiresAction => {
                    let calls = std::mem::take(&mut run.required_action);
                    if calls.is_empty() {
                        self.platform.cancel_run(&thread.id, &run.id).await?;
                        break;
                    }
                    let outputs: Vec<ToolOutput> = self.tools.execute_calls(&calls).await;
                    if outputs.is_empty() {
                        self.platform.cancel_run(&thread.id, &run.id).await?;
                        break;
                    }
                    run = self.platform.submit_tool_outputs(&thread.id, &run.id, outputs).await?;
                    continue;
                }
                RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling => {}
            }

            if started.elapsed() >= self.options.run_timeout {
                return Err(AgentError::RunTimeout { waited_secs: started.elapsed().as_secs() });
            }
            tokio::time::sleep(self.options.poll_interval).await;
            run = self.platform.get_run(&thread.id, &run.id).await?;
        }

        // Grounding metadata is best-effort; the reply matters more.
        let grounding_requests = match self.platform.list_grounding_requests(&thread.id, &run.id).await
        {
            Ok(request_urls) => request_urls,
            Err(error) => {
                debug!(
                    event_name = "agent.grounding_lookup_failed",
                    error = %error,
                    "could not list grounding requests"
                );
                Vec::new()
            }
        };
        let query = grounding_requests.iter().find_map(|request_url| search_query(request_url));

        let messages = self.platform.list_messages(&thread.id).await?;
        let reply = messages.into_iter().find(|message| message.role == MessageRole::Assistant);

        Ok(match reply {
            Some(message) => {
                AgentReply { text: message.text, citations: message.url_citations, query }
            }
            None => AgentReply { text: "No response found".to_string(), citations: Vec::new(), query },
        })
    }
}

struct AgentProfile {
    name: &'static str,
    description: &'static str,
    instructions: &'static str,
}

impl AgentProfile {
    fn for_tool(tool: Option<&ToolDescriptor>) -> Self {
        match tool {
            Some(ToolDescriptor::SubsidySearch { .. }) => Self {
                name: "補助金情報案内AIエージェント",
                description: "補助金情報案内AIエージェント",
                instructions: "あなたは補助金申請のエキスパートアシスタントです。\n\
                    ユーザーからの質問に対して、OpenAPIツールを使用して補助金情報を検索し、\n\
                    わかりやすく回答してください。",
            },
            Some(ToolDescriptor::WebGrounding) => Self {
                name: "補助金相談AIエージェント",
                description: "Web検索で裏付けを取りながら回答するAIエージェント",
                instructions: "あなたは補助金申請のエキスパートアシスタントです。\n\
                    Web検索ツールで最新の情報を確認し、出典を添えてわかりやすく回答してください。",
            },
            None => Self {
                name: "文章生成AIエージェント",
                description: "依頼されたテキストを生成するAIエージェント",
                instructions: "あなたは有能なアシスタントです。依頼された内容に簡潔かつ正確に答えてください。",
            },
        }
    }
}

fn search_query(request_url: &str) -> Option<String> {
    let parsed = url::Url::parse(request_url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "q" || key == "query")
        .map(|(_, value)| value.into_owned())
}

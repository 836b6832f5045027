//! Scripted in-memory platform for conversation-loop tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::platform::{
    AgentHandle, AgentPlatform, CreateAgentRequest, MessageRole, RunState, RunStatus,
    ThreadHandle, ThreadMessage, ToolOutput,
};

pub(crate) fn run_with_status(status: RunStatus) -> RunState {
    RunState { id: "run-test".to_string(), status, last_error: None, required_action: Vec::new() }
}

pub(crate) fn assistant_message(text: &str, url_citations: Vec<&str>) -> ThreadMessage {
    ThreadMessage {
        role: MessageRole::Assistant,
        text: text.to_string(),
        url_citations: url_citations.into_iter().map(str::to_string).collect(),
    }
}

/// Replays a scripted sequence of run states; the final state repeats so a
/// pending run can be polled forever.
#[derive(Default)]
pub(crate) struct MockPlatform {
    pub run_states: Mutex<VecDeque<RunState>>,
    pub messages: Mutex<Vec<ThreadMessage>>,
    pub grounding_requests: Mutex<Vec<String>>,
    pub deleted_agents: AtomicUsize,
    pub cancelled_runs: AtomicUsize,
    pub submitted_outputs: Mutex<Vec<ToolOutput>>,
    pub created_agents: Mutex<Vec<CreateAgentRequest>>,
}

impl MockPlatform {
    pub fn with_run_states(states: Vec<RunState>) -> Self {
        Self { run_states: Mutex::new(states.into()), ..Self::default() }
    }

    pub fn push_message(&self, message: ThreadMessage) {
        self.messages.lock().expect("lock").push(message);
    }

    fn next_run(&self) -> RunState {
        let mut queue = self.run_states.lock().expect("lock");
        if queue.len() > 1 {
            queue.pop_front().expect("non-empty queue")
        } else {
            queue.front().cloned().unwrap_or_else(|| run_with_status(RunStatus::Completed))
        }
    }
}

#[async_trait]
impl AgentPlatform for MockPlatform {
    async fn create_agent(&self, request: CreateAgentRequest) -> Result<AgentHandle, AgentError> {
        self.created_agents.lock().expect("lock").push(request);
        Ok(AgentHandle { id: "agent-test".to_string() })
    }

    async fn delete_agent(&self, _agent_id: &str) -> Result<(), AgentError> {
        self.deleted_agents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_thread(&self) -> Result<ThreadHandle, AgentError> {
        Ok(ThreadHandle { id: "thread-test".to_string() })
    }

    async fn post_message(&self, _thread_id: &str, _content: &str) -> Result<(), AgentError> {
        Ok(())
    }

    async fn create_run(&self, _thread_id: &str, _agent_id: &str) -> Result<RunState, AgentError> {
        Ok(self.next_run())
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<RunState, AgentError> {
        Ok(self.next_run())
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunState, AgentError> {
        self.submitted_outputs.lock().expect("lock").extend(outputs);
        Ok(self.next_run())
    }

    async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<(), AgentError> {
        self.cancelled_runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_grounding_requests(
        &self,
        _thread_id: &str,
        _run_id: &str,
    ) -> Result<Vec<String>, AgentError> {
        Ok(self.grounding_requests.lock().expect("lock").clone())
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, AgentError> {
        Ok(self.messages.lock().expect("lock").clone())
    }
}

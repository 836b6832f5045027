use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::platform::{ToolCall, ToolOutput};

/// A tool executed locally when the remote run pauses on requires-action.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Executes the pending calls of a requires-action run.
    ///
    /// Calls with no registered executor and calls whose execution fails
    /// produce no output; the conversation loop cancels the run when the
    /// result is empty.
    pub async fn execute_calls(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::new();
        for call in calls {
            let Some(tool) = self.tools.get(&call.name) else {
                warn!(
                    event_name = "agent.tool.unknown",
                    tool_name = %call.name,
                    tool_call_id = %call.id,
                    "no local executor registered for tool call"
                );
                continue;
            };
            match tool.execute(call.arguments.clone()).await {
                Ok(value) => outputs.push(ToolOutput {
                    tool_call_id: call.id.clone(),
                    output: stringify_output(&value),
                }),
                Err(error) => {
                    warn!(
                        event_name = "agent.tool.failed",
                        tool_name = %call.name,
                        tool_call_id = %call.id,
                        error = %error,
                        "tool execution failed"
                    );
                }
            }
        }
        outputs
    }
}

/// Tool outputs travel as strings on the wire; non-string values are
/// serialized to JSON text rather than dropped.
pub fn stringify_output(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::{stringify_output, Tool, ToolRegistry};
    use crate::platform::ToolCall;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn execute(&self, input: Value) -> Result<Value> {
            Ok(json!({ "echoed": input }))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn execute(&self, _input: Value) -> Result<Value> {
            Err(anyhow!("boom"))
        }
    }

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall { id: id.to_string(), name: name.to_string(), arguments: json!({"k": "v"}) }
    }

    #[tokio::test]
    async fn registered_tools_produce_stringified_outputs() {
        let mut registry = ToolRegistry::default();
        registry.register(EchoTool);

        let outputs = registry.execute_calls(&[call("c-1", "echo")]).await;

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].tool_call_id, "c-1");
        assert_eq!(outputs[0].output, r#"{"echoed":{"k":"v"}}"#);
    }

    #[tokio::test]
    async fn unknown_and_failing_tools_are_skipped() {
        let mut registry = ToolRegistry::default();
        registry.register(FailingTool);

        let outputs = registry.execute_calls(&[call("c-1", "missing"), call("c-2", "broken")]).await;

        assert!(outputs.is_empty());
    }

    #[test]
    fn string_outputs_pass_through_unquoted() {
        assert_eq!(stringify_output(&Value::String("素の文字列".to_string())), "素の文字列");
        assert_eq!(stringify_output(&json!({"nested": [1, 2]})), r#"{"nested":[1,2]}"#);
    }
}

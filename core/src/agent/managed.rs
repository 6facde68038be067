use crate::agent::AgentLoop;
use crate::tools::extract_string_arg;
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

/// Exposes a complete agent as a tool of another agent: the manager hands it
/// a task, the wrapped loop runs to completion, and its final answer comes
/// back as the observation.
pub struct ManagedAgent {
    name: String,
    description: String,
    agent: AgentLoop,
}

impl ManagedAgent {
    pub fn new(name: impl Into<String>, description: impl Into<String>, agent: AgentLoop) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent,
        }
    }
}

#[async_trait]
impl Tool for ManagedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "The task or query to delegate to this agent"
                }
            },
            "required": ["task"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let task = extract_string_arg(&args, "task")?;

        match self.agent.run(&task).await {
            Ok(answer) => Ok(ToolResult::success(answer)),
            Err(e) => Ok(ToolResult::error(format!(
                "Managed agent '{}' failed: {}",
                self.name, e
            ))),
        }
    }
}

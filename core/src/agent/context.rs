use crate::traits::{ChatMessage, ToolSpec};
use std::fmt::Write;

/// Assembles the system prompt sent ahead of every run: task instructions,
/// the tool-use protocol for backends without native tool calling, and the
/// runtime context.
#[derive(Default)]
pub struct ContextBuilder {
    pub instructions: Option<String>,
    pub tool_specs: Vec<ToolSpec>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_tool_specs(mut self, tool_specs: Vec<ToolSpec>) -> Self {
        self.tool_specs = tool_specs;
        self
    }

    pub fn build_system_prompt(&self) -> String {
        let mut parts = vec![];

        if let Some(instructions) = &self.instructions {
            parts.push(instructions.clone());
        }

        let tool_instructions = self.get_tool_instructions();
        if !tool_instructions.is_empty() {
            parts.push(tool_instructions);
        }

        parts.push(self.get_runtime_context());

        parts.join("\n\n---\n\n")
    }

    fn get_tool_instructions(&self) -> String {
        if self.tool_specs.is_empty() {
            return String::new();
        }

        let mut instructions = String::new();
        instructions.push_str("## Tool Use Protocol\n\n");
        instructions.push_str("If your backend does not support structured tool calls, wrap a JSON object in <tool_call> tags:\n\n");
        instructions.push_str("```\n<tool_call>\n{\"name\": \"tool_name\", \"arguments\": {\"param\": \"value\"}}\n</tool_call>\n```\n\n");
        instructions.push_str(
            "After tool execution, results appear as tool observations. Continue reasoning with the results until you can give a final answer. Answer in plain text when you are done.\n\n",
        );
        instructions.push_str("### Available Tools\n\n");

        for tool in &self.tool_specs {
            let _ = writeln!(
                instructions,
                "**{}**: {}\nParameters: `{}`\n",
                tool.name, tool.description, tool.parameters_schema
            );
        }

        instructions
    }

    fn get_runtime_context(&self) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!("## Runtime Context\n\n### Current Time\n{}", timestamp)
    }

    pub fn build_messages(
        &self,
        history: Vec<ChatMessage>,
        current_message: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.build_system_prompt())];
        messages.extend(history);
        messages.push(ChatMessage::user(current_message));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn system_prompt_lists_registered_tools() {
        let builder = ContextBuilder::new()
            .with_instructions("You are a travel planner.")
            .with_tool_specs(vec![ToolSpec {
                name: "get_travel_duration".into(),
                description: "Travel time between two places".into(),
                parameters_schema: json!({"type": "object"}),
            }]);

        let prompt = builder.build_system_prompt();
        assert!(prompt.contains("You are a travel planner."));
        assert!(prompt.contains("**get_travel_duration**"));
        assert!(prompt.contains("## Tool Use Protocol"));
    }

    #[test]
    fn no_tool_protocol_without_tools() {
        let prompt = ContextBuilder::new().build_system_prompt();
        assert!(!prompt.contains("Tool Use Protocol"));
    }

    #[test]
    fn messages_start_with_system_and_end_with_user() {
        let builder = ContextBuilder::new();
        let history = vec![
            ChatMessage::user("earlier"),
            ChatMessage::assistant("reply"),
        ];
        let messages = builder.build_messages(history, "now");

        assert_eq!(messages.first().unwrap().role, "system");
        assert_eq!(messages.last().unwrap().role, "user");
        assert_eq!(messages.last().unwrap().content, "now");
        assert_eq!(messages.len(), 4);
    }
}

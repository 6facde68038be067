use crate::ChatRequest;
use crate::agent::{ContextBuilder, ToolRegistry};
use crate::error::AgentError;
use crate::traits::{ChatMessage, Provider, ToolCall};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_MAX_STEPS: usize = 10;

const TOOL_CALL_OPEN_TAG: &str = "<tool_call>";
const TOOL_CALL_CLOSE_TAG: &str = "</tool_call>";

/// The tool-augmented request loop: send the accumulated context to the
/// backend, execute any requested tools, append the observations, repeat.
/// Stops on a plain-text answer or fails with
/// [`AgentError::StepLimitExceeded`] once the step budget is spent.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    context_builder: ContextBuilder,
    tool_registry: Arc<ToolRegistry>,
    max_steps: usize,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        context_builder: ContextBuilder,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        let context_builder = context_builder.with_tool_specs(tool_registry.get_specs());
        Self {
            provider,
            context_builder,
            tool_registry,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub async fn run(&self, task: &str) -> Result<String> {
        self.run_with_history(task, vec![]).await
    }

    pub async fn run_with_history(&self, task: &str, history: Vec<ChatMessage>) -> Result<String> {
        let mut messages = self.context_builder.build_messages(history, task);

        for step in 0..self.max_steps {
            let tools = self.tool_registry.get_specs();
            let request = ChatRequest {
                messages: &messages,
                tools: if tools.is_empty() { None } else { Some(&tools) },
            };

            let response = self.provider.chat(request).await?;

            let (assistant_text, tool_calls) = if response.has_tool_calls() {
                (
                    response.text.clone().unwrap_or_default(),
                    response.tool_calls.clone(),
                )
            } else if let Some(text) = &response.text {
                parse_tool_calls_fallback(text)
            } else {
                return Err(AgentError::EmptyResponse.into());
            };

            if tool_calls.is_empty() {
                return Ok(assistant_text);
            }

            debug!(step, calls = tool_calls.len(), "executing tool calls");

            messages.push(ChatMessage::assistant_with_tool_calls(
                assistant_text,
                tool_calls.clone(),
            ));

            for tool_call in tool_calls {
                let observation = self.execute_call(&tool_call).await;
                messages.push(ChatMessage::tool_result(tool_call.id, observation));
            }
        }

        Err(AgentError::StepLimitExceeded(self.max_steps).into())
    }

    /// Runs one tool call and renders the observation. Malformed arguments
    /// and tool failures become observation strings, never loop errors.
    async fn execute_call(&self, tool_call: &ToolCall) -> String {
        let args: serde_json::Value = match serde_json::from_str(&tool_call.arguments) {
            Ok(args) => args,
            Err(e) => {
                let result = crate::traits::ToolResult::error(format!(
                    "Malformed arguments for '{}': {}",
                    tool_call.name, e
                ));
                return serde_json::to_string(&result).unwrap_or_default();
            }
        };

        let result = self.tool_registry.execute(&tool_call.name, args).await;
        serde_json::to_string(&result).unwrap_or_default()
    }
}

/// Extracts `<tool_call>{json}</tool_call>` blocks emitted by backends
/// without native tool calling. Returns the surrounding text and the parsed
/// calls.
fn parse_tool_calls_fallback(response: &str) -> (String, Vec<ToolCall>) {
    let mut text_parts = Vec::new();
    let mut calls = Vec::new();
    let mut remaining = response;

    while let Some(start) = remaining.find(TOOL_CALL_OPEN_TAG) {
        let before = &remaining[..start];
        if !before.trim().is_empty() {
            text_parts.push(before.trim().to_string());
        }

        let after_open = &remaining[start + TOOL_CALL_OPEN_TAG.len()..];
        if let Some(close_idx) = after_open.find(TOOL_CALL_CLOSE_TAG) {
            let inner = &after_open[..close_idx];
            for value in extract_json_values(inner) {
                if let Some(call) = parse_tool_call_value(&value) {
                    calls.push(call);
                }
            }

            remaining = &after_open[close_idx + TOOL_CALL_CLOSE_TAG.len()..];
        } else {
            break;
        }
    }

    if !remaining.trim().is_empty() {
        text_parts.push(remaining.trim().to_string());
    }

    let text = text_parts.join("\n");
    (text, calls)
}

fn extract_json_values(text: &str) -> Vec<serde_json::Value> {
    let mut values = Vec::new();
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        match ch {
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start
                        && let Ok(value) = serde_json::from_str::<serde_json::Value>(&text[s..=i])
                    {
                        values.push(value);
                    }
                    start = None;
                }
            }
            '"' if !escape_next => {
                in_string = !in_string;
            }
            '\\' if in_string => {
                escape_next = true;
            }
            _ => {
                escape_next = false;
            }
        }
    }

    values
}

fn parse_tool_call_value(value: &serde_json::Value) -> Option<ToolCall> {
    let name = value.get("name")?.as_str()?.to_string();
    let arguments = value.get("arguments")?;
    let arguments_str = serde_json::to_string(arguments).ok()?;
    let digest = md5::compute(arguments_str.as_bytes());
    let id = format!("call_{:x}", digest);

    Some(ToolCall {
        id,
        name,
        arguments: arguments_str,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::traits::{ChatResponse, Tool, ToolResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays a scripted sequence of responses.
    #[derive(Debug)]
    struct ScriptedProvider {
        responses: Mutex<VecDeque<ChatResponse>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ChatResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn chat(&self, _request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the given text"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }

        async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::success(format!(
                "echo: {}",
                args["text"].as_str().unwrap_or_default()
            )))
        }
    }

    fn tool_call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn final_answer(text: &str) -> ChatResponse {
        ChatResponse {
            text: Some(text.into()),
            tool_calls: vec![],
        }
    }

    fn tool_response(name: &str, arguments: &str) -> ChatResponse {
        ChatResponse {
            text: None,
            tool_calls: vec![tool_call(name, arguments)],
        }
    }

    fn make_loop(responses: Vec<ChatResponse>) -> AgentLoop {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Box::new(EchoTool)).unwrap();
        AgentLoop::new(
            Arc::new(ScriptedProvider::new(responses)),
            ContextBuilder::new(),
            registry,
        )
    }

    #[tokio::test]
    async fn plain_answer_ends_the_loop() {
        let agent = make_loop(vec![final_answer("42")]);
        assert_eq!(agent.run("meaning of life").await.unwrap(), "42");
    }

    #[tokio::test]
    async fn tool_call_then_answer() {
        let agent = make_loop(vec![
            tool_response("echo", r#"{"text":"hi"}"#),
            final_answer("done"),
        ]);
        assert_eq!(agent.run("say hi").await.unwrap(), "done");
    }

    #[tokio::test]
    async fn step_limit_is_a_typed_error() {
        let responses = (0..3)
            .map(|_| tool_response("echo", r#"{"text":"again"}"#))
            .collect();
        let agent = make_loop(responses).with_max_steps(3);

        let err = agent.run("loop forever").await.unwrap_err();
        match err.downcast_ref::<AgentError>() {
            Some(AgentError::StepLimitExceeded(3)) => {}
            other => panic!("expected StepLimitExceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_tool_becomes_observation_and_loop_continues() {
        let agent = make_loop(vec![
            tool_response("missing", r#"{"text":"hi"}"#),
            final_answer("recovered"),
        ]);
        assert_eq!(agent.run("go").await.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn malformed_arguments_become_observation() {
        let agent = make_loop(vec![
            tool_response("echo", "{not json"),
            final_answer("recovered"),
        ]);
        assert_eq!(agent.run("go").await.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn fallback_tags_are_parsed_into_calls() {
        let tagged = format!(
            "Let me check.\n{}\n{{\"name\": \"echo\", \"arguments\": {{\"text\": \"hi\"}}}}\n{}",
            TOOL_CALL_OPEN_TAG, TOOL_CALL_CLOSE_TAG
        );
        let agent = make_loop(vec![final_answer(&tagged), final_answer("done")]);
        assert_eq!(agent.run("go").await.unwrap(), "done");
    }

    #[test]
    fn fallback_parser_splits_text_and_calls() {
        let input = "before <tool_call>{\"name\":\"echo\",\"arguments\":{\"text\":\"x\"}}</tool_call> after";
        let (text, calls) = parse_tool_calls_fallback(input);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "echo");
        assert!(text.contains("before"));
        assert!(text.contains("after"));
    }

    #[test]
    fn fallback_parser_passes_plain_text_through() {
        let (text, calls) = parse_tool_calls_fallback("just an answer");
        assert!(calls.is_empty());
        assert_eq!(text, "just an answer");
    }
}

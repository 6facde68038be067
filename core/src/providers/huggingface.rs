use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct HfRequest<'a> {
    model: String,
    messages: Vec<HfMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<HfTool>>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct HfMessage<'a> {
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<HfToolCallRequest<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct HfToolCallRequest<'a> {
    id: &'a str,
    r#type: &'a str,
    function: HfFunctionRequest<'a>,
}

#[derive(Debug, Serialize)]
struct HfFunctionRequest<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Serialize)]
struct HfTool {
    r#type: String,
    function: HfToolFunction,
}

#[derive(Debug, Serialize)]
struct HfToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct HfResponse {
    choices: Vec<HfChoice>,
}

#[derive(Debug, Deserialize)]
struct HfChoice {
    message: HfResponseMessage,
}

#[derive(Debug, Deserialize)]
struct HfResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<HfToolCall>>,
}

#[derive(Debug, Deserialize)]
struct HfToolCall {
    id: String,
    function: HfFunction,
}

#[derive(Debug, Deserialize)]
struct HfFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Hugging Face inference-router backend. Speaks the OpenAI-compatible
/// chat-completions wire format against the router base url.
#[derive(Debug)]
pub struct HuggingFaceProvider {
    client: reqwest::Client,
    token: String,
    model: String,
    base_url: String,
    temperature: f64,
    max_tokens: Option<u32>,
}

impl HuggingFaceProvider {
    pub fn new(token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            token: token.into(),
            model: "Qwen/Qwen2.5-Coder-32B-Instruct".to_string(),
            base_url: "https://router.huggingface.co/v1".to_string(),
            temperature: 0.2,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn convert_messages<'a>(&self, messages: &'a [ChatMessage]) -> Vec<HfMessage<'a>> {
        messages
            .iter()
            .map(|m| {
                let tool_calls = m.tool_calls.as_ref().map(|tcs| {
                    tcs.iter()
                        .map(|tc| HfToolCallRequest {
                            id: &tc.id,
                            r#type: "function",
                            function: HfFunctionRequest {
                                name: &tc.name,
                                arguments: &tc.arguments,
                            },
                        })
                        .collect()
                });

                HfMessage {
                    role: &m.role,
                    content: if m.content.is_empty() {
                        None
                    } else {
                        Some(&m.content)
                    },
                    tool_calls,
                    tool_call_id: m.tool_call_id.as_deref(),
                }
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<HfTool> {
        tools
            .iter()
            .map(|t| HfTool {
                r#type: "function".to_string(),
                function: HfToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters_schema.clone(),
                },
            })
            .collect()
    }
}

#[async_trait]
impl Provider for HuggingFaceProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let hf_request = HfRequest {
            model: self.model.clone(),
            messages: self.convert_messages(request.messages),
            tools: request.tools.map(Self::convert_tools),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&hf_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Inference API error {}: {}",
                status,
                error_text
            ));
        }

        let hf_response: HfResponse = response.json().await?;

        let choice = hf_response
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("No choices in response"))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .as_ref()
            .map(|calls| {
                calls
                    .iter()
                    .map(|c| {
                        // Some router models send arguments as an object
                        // rather than a string.
                        let arguments = match &c.function.arguments {
                            serde_json::Value::String(s) => s.clone(),
                            other => serde_json::to_string(other).unwrap_or_default(),
                        };
                        ToolCall {
                            id: c.id.clone(),
                            name: c.function.name.clone(),
                            arguments,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let has_content = choice
            .message
            .content
            .as_ref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_content && tool_calls.is_empty() {
            return Err(anyhow::anyhow!(
                "Empty response from API: no content or tool calls"
            ));
        }

        Ok(ChatResponse {
            text: choice.message.content.clone(),
            tool_calls,
        })
    }
}

use crate::tools::{extract_string_arg, extract_string_arg_opt, web_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.e2b.dev/v1";
const DEFAULT_LANGUAGE: &str = "python";

#[derive(Debug, Deserialize)]
struct ExecutionResponse {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    error: Option<String>,
}

/// Runs model-written code in a remote isolated sandbox. The sandbox itself
/// is an external service; this tool only submits snippets and relays the
/// captured output.
pub struct CodeSandboxTool {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CodeSandboxTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: web_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Tool for CodeSandboxTool {
    fn name(&self) -> &str {
        "run_code"
    }

    fn description(&self) -> &str {
        "Execute a code snippet in a remote isolated sandbox and return its output."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The code to execute"
                },
                "language": {
                    "type": "string",
                    "description": "Language of the snippet (default: python)"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let code = extract_string_arg(&args, "code")?;
        let language = extract_string_arg_opt(&args, "language", DEFAULT_LANGUAGE);

        let response = self
            .client
            .post(format!("{}/executions", self.base_url))
            .header("X-API-Key", &self.api_key)
            .json(&json!({ "code": code, "language": language }))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return Ok(ToolResult::error(format!("Sandbox unreachable: {}", e))),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Ok(ToolResult::error(format!(
                "Sandbox error ({}): {}",
                status, body
            )));
        }

        let execution: ExecutionResponse = match response.json().await {
            Ok(execution) => execution,
            Err(e) => return Ok(ToolResult::error(format!("Sandbox response malformed: {}", e))),
        };

        Ok(render_execution(&execution))
    }
}

fn render_execution(execution: &ExecutionResponse) -> ToolResult {
    if let Some(error) = &execution.error {
        return ToolResult::error(error.clone());
    }

    let mut output = execution.stdout.clone();
    if !execution.stderr.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&execution.stderr);
    }

    if output.is_empty() {
        ToolResult::success("(no output)")
    } else {
        ToolResult::success(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ExecutionResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn stdout_is_the_observation() {
        let result = render_execution(&parse(r#"{"stdout": "42\n", "stderr": ""}"#));
        assert!(result.success);
        assert_eq!(result.output, "42\n");
    }

    #[test]
    fn stderr_is_appended() {
        let result = render_execution(&parse(r#"{"stdout": "ok", "stderr": "warning"}"#));
        assert_eq!(result.output, "ok\nwarning");
    }

    #[test]
    fn service_error_is_an_error_observation() {
        let result = render_execution(&parse(r#"{"error": "NameError: name 'x' is not defined"}"#));
        assert!(!result.success);
        assert!(result.observation().contains("NameError"));
    }

    #[test]
    fn silent_execution_still_reports() {
        let result = render_execution(&parse(r#"{}"#));
        assert_eq!(result.output, "(no output)");
    }
}

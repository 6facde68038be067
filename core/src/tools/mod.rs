use serde_json::Value;

pub mod code_sandbox;
pub mod image_gen;
pub mod model_hub;
pub mod travel;
pub mod visit_webpage;
pub mod web_search;

pub use code_sandbox::CodeSandboxTool;
pub use image_gen::{ImageGenConfig, TextToImageTool};
pub use model_hub::ModelDownloadTool;
pub use travel::TravelDurationTool;
pub use visit_webpage::VisitWebpageTool;
pub use web_search::WebSearchTool;

pub fn extract_string_arg(args: &Value, key: &str) -> anyhow::Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
        .map(|s| s.to_string())
}

pub fn extract_string_arg_opt(args: &Value, key: &str, default: &str) -> String {
    args.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

pub fn extract_usize_arg_opt(args: &Value, key: &str, default: usize) -> usize {
    args.get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Shared HTTP client settings for tools that talk to the open web.
pub(crate) fn web_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; gizmo/0.1)")
        .timeout(std::time::Duration::from_secs(30))
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

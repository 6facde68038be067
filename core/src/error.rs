use thiserror::Error;

/// Terminal failure conditions of the request loop. Tool-level failures are
/// never errors here: they are folded back into the conversation as
/// observations so the model can retry or choose differently.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("step limit of {0} reached without a final answer")]
    StepLimitExceeded(usize),

    #[error("model backend returned neither text nor tool calls")]
    EmptyResponse,
}

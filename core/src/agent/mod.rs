pub mod context;
pub mod loop_;
pub mod managed;
pub mod registry;
pub mod session;

pub use context::ContextBuilder;
pub use loop_::AgentLoop;
pub use managed::ManagedAgent;
pub use registry::ToolRegistry;
pub use session::{ChatSession, SessionEvent, SessionState};

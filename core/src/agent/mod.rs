pub mod context;
pub mod loop_;
pub mod registry;
pub mod session;

pub use context::PromptAssembler;
pub use loop_::AgentLoop;
pub use registry::ToolRegistry;
pub use session::SessionManager;

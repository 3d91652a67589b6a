pub mod agent;
pub mod config;
pub mod error;
pub mod memory;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, PromptAssembler, SessionManager, ToolRegistry};
pub use config::*;
pub use error::*;
pub use memory::*;
pub use providers::*;
pub use tools::*;
pub use traits::*;

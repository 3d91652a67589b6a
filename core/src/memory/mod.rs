pub mod factory;
pub mod store;
pub mod summarizer;
pub mod turn;

pub use factory::create_memory;
pub use store::{ERROR_NOTE_PREFIX, MemorySettings, MemoryStore, SUMMARY_PREFIX};
pub use summarizer::ModelSummarizer;
pub use turn::{Conversation, Role, Turn};

use crate::config::AgentConfig;
use crate::error::ConfigError;
use crate::memory::{Conversation, MemorySettings, MemoryStore};
use crate::traits::Summarizer;
use std::sync::Arc;

/// Builds the memory store for a new session, seeded with `conversation`.
pub fn create_memory(
    config: &AgentConfig,
    summarizer: Option<Arc<dyn Summarizer>>,
    conversation: Conversation,
) -> Result<MemoryStore, ConfigError> {
    config.validate()?;
    let store = MemoryStore::new(MemorySettings::from(config)).with_conversation(conversation);
    Ok(match summarizer {
        Some(summarizer) => store.with_summarizer(summarizer),
        None => store,
    })
}

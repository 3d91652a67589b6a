use crate::memory::Turn;
use async_trait::async_trait;

/// Lossy compression of a run of turns into a single piece of text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, turns: &[Turn]) -> anyhow::Result<String>;
}

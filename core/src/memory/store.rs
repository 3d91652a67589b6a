use crate::config::{AgentConfig, MemoryPolicy};
use crate::memory::{Conversation, Role, Turn};
use crate::traits::Summarizer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const SUMMARY_PREFIX: &str = "[Conversation summary]";

/// Prefix of the system note written when a turn fails.
pub const ERROR_NOTE_PREFIX: &str = "[error]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySettings {
    pub policy: MemoryPolicy,
    pub window_tokens: usize,
    pub summarize_threshold: usize,
    pub retain_recent_turns: usize,
    pub summarize_timeout: Duration,
}

impl From<&AgentConfig> for MemorySettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            policy: config.memory_policy,
            window_tokens: config.memory_window_tokens,
            summarize_threshold: config.summarize_threshold,
            retain_recent_turns: config.retain_recent_turns,
            summarize_timeout: config.model_timeout(),
        }
    }
}

/// Conversation history of one session plus the policy deciding which part of
/// it goes into the next prompt.
pub struct MemoryStore {
    conversation: Conversation,
    settings: MemorySettings,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl MemoryStore {
    pub fn new(settings: MemorySettings) -> Self {
        Self {
            conversation: Conversation::new(),
            settings,
            summarizer: None,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn summarizer(&self) -> Option<&Arc<dyn Summarizer>> {
        self.summarizer.as_ref()
    }

    pub fn len(&self) -> usize {
        self.conversation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }

    pub fn append(&mut self, turn: Turn) {
        self.conversation.push(turn);
    }

    /// Appends and immediately applies the summarization policy.
    pub async fn record(&mut self, turn: Turn) {
        self.append(turn);
        self.compact().await;
    }

    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Turns to include in the next prompt.
    pub fn window(&self) -> Vec<Turn> {
        self.window_before(0)
    }

    /// Same as [`window`](Self::window) over all but the newest `tail` turns.
    ///
    /// The token budget drops the oldest unpinned turns first. Instruction and
    /// summary turns are pinned even if they alone exceed the budget; error
    /// notes are not.
    pub fn window_before(&self, tail: usize) -> Vec<Turn> {
        let turns = self.conversation.turns();
        let history = &turns[..turns.len().saturating_sub(tail)];

        let mut used: usize = history.iter().map(Turn::estimated_tokens).sum();
        let mut keep = vec![true; history.len()];

        for (idx, turn) in history.iter().enumerate() {
            if used <= self.settings.window_tokens {
                break;
            }
            if is_pinned(turn) {
                continue;
            }
            keep[idx] = false;
            used -= turn.estimated_tokens();
        }

        history
            .iter()
            .zip(keep)
            .filter_map(|(turn, keep)| keep.then(|| turn.clone()))
            .collect()
    }

    /// Number of oldest turns the summarized policy would collapse right now.
    fn compactable_prefix(&self) -> usize {
        let len = self.conversation.len();
        if self.settings.policy != MemoryPolicy::Summarized
            || len <= self.settings.summarize_threshold
        {
            return 0;
        }
        let over = len - self.settings.summarize_threshold + 1;
        let unprotected = len.saturating_sub(self.settings.retain_recent_turns);
        let count = over.min(unprotected);
        // A one-turn segment would not shrink the history.
        if count < 2 { 0 } else { count }
    }

    /// Collapses the oldest segment into a summary turn once the history is
    /// over the threshold. Falls back to dropping the segment when the
    /// summarizer is missing or fails.
    pub async fn compact(&mut self) {
        let count = self.compactable_prefix();
        if count == 0 {
            return;
        }

        let segment = &self.conversation.turns()[..count];
        let summary = match &self.summarizer {
            Some(summarizer) => {
                match tokio::time::timeout(
                    self.settings.summarize_timeout,
                    summarizer.summarize(segment),
                )
                .await
                {
                    Ok(Ok(summary)) if !summary.trim().is_empty() => Some(summary),
                    Ok(Ok(_)) => {
                        warn!("Summarizer returned an empty summary, truncating instead");
                        None
                    }
                    Ok(Err(e)) => {
                        warn!("Summarization failed, truncating instead: {}", e);
                        None
                    }
                    Err(_) => {
                        warn!(
                            "Summarization timed out after {:?}, truncating instead",
                            self.settings.summarize_timeout
                        );
                        None
                    }
                }
            }
            None => None,
        };

        debug!(
            collapsed = count,
            summarized = summary.is_some(),
            "Compacting conversation history"
        );

        let replacement =
            summary.map(|s| Turn::system(format!("{}\n{}", SUMMARY_PREFIX, s.trim())));
        self.conversation.replace_prefix(count, replacement);
    }
}

fn is_pinned(turn: &Turn) -> bool {
    turn.role == Role::System && !turn.content.starts_with(ERROR_NOTE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingSummarizer {
        seen: Mutex<Vec<Vec<Turn>>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, turns: &[Turn]) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(turns.to_vec());
            let joined: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
            Ok(format!("summary of {}", joined.join(", ")))
        }
    }

    struct FailingSummarizer;

    struct HangingSummarizer;

    #[async_trait]
    impl Summarizer for HangingSummarizer {
        async fn summarize(&self, _turns: &[Turn]) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".into())
        }
    }

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _turns: &[Turn]) -> anyhow::Result<String> {
            anyhow::bail!("summarizer unavailable")
        }
    }

    fn full(window_tokens: usize) -> MemorySettings {
        MemorySettings {
            policy: MemoryPolicy::Full,
            window_tokens,
            summarize_threshold: 20,
            retain_recent_turns: 4,
            summarize_timeout: Duration::from_secs(5),
        }
    }

    fn summarized(threshold: usize, retain: usize) -> MemorySettings {
        MemorySettings {
            policy: MemoryPolicy::Summarized,
            window_tokens: 10_000,
            summarize_threshold: threshold,
            retain_recent_turns: retain,
            summarize_timeout: Duration::from_secs(5),
        }
    }

    fn contents(turns: &[Turn]) -> Vec<&str> {
        turns.iter().map(|t| t.content.as_str()).collect()
    }

    #[test]
    fn full_window_returns_everything_within_budget() {
        let mut store = MemoryStore::new(full(1000));
        store.append(Turn::system("be nice"));
        store.append(Turn::user("hi"));
        store.append(Turn::assistant("hello"));
        assert_eq!(contents(&store.window()), vec!["be nice", "hi", "hello"]);
    }

    #[test]
    fn full_window_drops_oldest_non_system_first() {
        // Each 40-char turn costs 11 tokens; budget fits the system turn plus two more.
        let mut store = MemoryStore::new(full(35));
        store.append(Turn::system("s".repeat(40)));
        for n in 0..4 {
            store.append(Turn::user(format!("{}", n).repeat(40)));
        }
        let window = store.window();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].role, Role::System);
        assert!(window[1].content.starts_with('2'));
        assert!(window[2].content.starts_with('3'));
    }

    #[test]
    fn system_turns_survive_a_tiny_budget() {
        let mut store = MemoryStore::new(full(1));
        store.append(Turn::system("pinned instructions"));
        store.append(Turn::user("question"));
        let window = store.window();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].role, Role::System);
    }

    #[test]
    fn error_notes_do_not_escape_the_budget() {
        let mut store = MemoryStore::new(full(100));
        store.append(Turn::system("be nice"));
        for n in 0..50 {
            store.append(Turn::user(format!("question {}", n)));
            store.append(Turn::system(format!(
                "{} tool 'weather' not found",
                ERROR_NOTE_PREFIX
            )));
        }

        let window = store.window();
        let used: usize = window.iter().map(Turn::estimated_tokens).sum();
        assert!(used <= 100, "window uses {} tokens", used);
        assert_eq!(window[0].content, "be nice");
        assert!(window.last().unwrap().content.starts_with(ERROR_NOTE_PREFIX));
        assert!(window.iter().any(|t| t.content == "question 49"));
        assert!(!window.iter().any(|t| t.content == "question 0"));
    }

    #[test]
    fn summary_turns_stay_pinned() {
        let mut store = MemoryStore::new(full(1));
        store.append(Turn::system(format!("{}
earlier chat", SUMMARY_PREFIX)));
        store.append(Turn::system(format!("{} model call timed out", ERROR_NOTE_PREFIX)));
        store.append(Turn::user("question"));
        let window = store.window();
        assert_eq!(window.len(), 1);
        assert!(window[0].content.starts_with(SUMMARY_PREFIX));
    }

    #[test]
    fn window_is_idempotent() {
        let mut store = MemoryStore::new(full(12));
        for n in 0..10 {
            store.append(Turn::user(format!("message number {}", n)));
        }
        assert_eq!(store.window(), store.window());
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn window_before_excludes_tail() {
        let mut store = MemoryStore::new(full(1000));
        store.append(Turn::user("old"));
        store.append(Turn::user("current"));
        store.append(Turn::tool_result("calculator", "4"));
        assert_eq!(contents(&store.window_before(2)), vec!["old"]);
        assert!(store.window_before(5).is_empty());
    }

    #[tokio::test]
    async fn summarizes_oldest_segment_after_threshold() {
        let summarizer = Arc::new(RecordingSummarizer {
            seen: Mutex::new(vec![]),
        });
        let mut store = MemoryStore::new(summarized(6, 4)).with_summarizer(summarizer.clone());

        for n in 1..=6 {
            store.record(Turn::user(format!("t{}", n))).await;
        }
        assert_eq!(store.len(), 6);
        assert!(summarizer.seen.lock().unwrap().is_empty());

        store.record(Turn::user("t7")).await;

        let turns = store.conversation().turns();
        assert_eq!(turns.len(), 6);
        assert_eq!(turns[0].role, Role::System);
        assert!(turns[0].content.starts_with(SUMMARY_PREFIX));
        assert!(turns[0].content.contains("summary of t1, t2"));
        assert_eq!(contents(&turns[1..]), vec!["t3", "t4", "t5", "t6", "t7"]);
        assert_eq!(summarizer.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn never_touches_recent_turns() {
        let summarizer = Arc::new(RecordingSummarizer {
            seen: Mutex::new(vec![]),
        });
        let mut store = MemoryStore::new(summarized(5, 4)).with_summarizer(summarizer.clone());
        for n in 1..=12usize {
            store.record(Turn::user(format!("t{}", n))).await;
            let turns = store.conversation().turns();
            assert!(turns.len() <= 5);
            let tail = contents(&turns[turns.len().saturating_sub(4)..]);
            let expected: Vec<String> = (n.saturating_sub(3).max(1)..=n)
                .map(|i| format!("t{}", i))
                .collect();
            assert_eq!(tail, expected.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn failing_summarizer_degrades_to_truncation() {
        let mut store =
            MemoryStore::new(summarized(6, 4)).with_summarizer(Arc::new(FailingSummarizer));
        for n in 1..=7 {
            store.record(Turn::user(format!("t{}", n))).await;
        }
        assert_eq!(
            contents(store.conversation().turns()),
            vec!["t3", "t4", "t5", "t6", "t7"]
        );
    }

    #[tokio::test]
    async fn hanging_summarizer_times_out_and_truncates() {
        let settings = MemorySettings {
            summarize_timeout: Duration::from_millis(50),
            ..summarized(5, 2)
        };
        let mut store = MemoryStore::new(settings).with_summarizer(Arc::new(HangingSummarizer));
        for n in 1..=5 {
            store.append(Turn::user(format!("t{}", n)));
        }

        let started = std::time::Instant::now();
        store.record(Turn::user("t6")).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(
            contents(store.conversation().turns()),
            vec!["t3", "t4", "t5", "t6"]
        );
    }

    #[tokio::test]
    async fn full_policy_never_compacts() {
        let mut store = MemoryStore::new(full(1000));
        for n in 0..30 {
            store.record(Turn::user(format!("t{}", n))).await;
        }
        assert_eq!(store.len(), 30);
    }

    #[tokio::test]
    async fn retained_turns_keep_chronological_order() {
        let mut store = MemoryStore::new(summarized(6, 2));
        for n in 0..20 {
            store.record(Turn::user(format!("{:02}", n))).await;
        }
        let turns = contents(store.conversation().turns());
        let mut sorted = turns.clone();
        sorted.sort();
        assert_eq!(turns, sorted);
    }
}

use crate::agent::{AgentLoop, ToolRegistry};
use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult, ConfigError};
use crate::memory::{Conversation, create_memory};
use crate::traits::{ModelClient, Summarizer, ToolDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type SharedLoop = Arc<Mutex<AgentLoop>>;

/// Entry point for chat front ends. Each session id owns its own agent loop
/// and memory; sessions only share the read-only tool registry, the model
/// client and the summarizer, so different sessions run concurrently while
/// turns within one session are serialized.
pub struct SessionManager {
    client: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    summarizer: Option<Arc<dyn Summarizer>>,
    config: AgentConfig,
    sessions: RwLock<HashMap<String, SharedLoop>>,
}

impl SessionManager {
    pub fn new(
        client: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client,
            tools,
            summarizer: None,
            config,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn tools(&self) -> Vec<ToolDescription> {
        self.tools.list_descriptions()
    }

    fn build_loop(&self, conversation: Conversation) -> AgentResult<AgentLoop> {
        let memory = create_memory(&self.config, self.summarizer.clone(), conversation)?;
        Ok(AgentLoop::new(
            self.client.clone(),
            self.tools.clone(),
            memory,
            self.config.clone(),
        )?)
    }

    async fn get(&self, session_id: &str) -> Option<SharedLoop> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn get_or_create(&self, session_id: &str) -> AgentResult<SharedLoop> {
        if let Some(session) = self.get(session_id).await {
            return Ok(session);
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(session_id) {
            return Ok(session.clone());
        }
        tracing::debug!("Opening session {}", session_id);
        let session = Arc::new(Mutex::new(self.build_loop(Conversation::new())?));
        sessions.insert(session_id.to_string(), session.clone());
        Ok(session)
    }

    /// Runs one user turn in `session_id`, creating the session on first use.
    ///
    /// Cancelling (dropping) the future between steps is allowed, but tool
    /// side effects that already happened are not undone; tools are not
    /// assumed to be idempotent.
    pub async fn submit_turn(&self, session_id: &str, user_text: &str) -> AgentResult<String> {
        let session = self.get_or_create(session_id).await?;
        let mut agent = session.lock().await;
        agent.submit(user_text).await
    }

    /// Replaces (or creates) `session_id` with a previously exported conversation.
    pub async fn resume(&self, session_id: &str, conversation: Conversation) -> AgentResult<()> {
        let session = Arc::new(Mutex::new(self.build_loop(conversation)?));
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), session);
        Ok(())
    }

    pub async fn export(&self, session_id: &str) -> AgentResult<Conversation> {
        let session = self
            .get(session_id)
            .await
            .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;
        let agent = session.lock().await;
        Ok(agent.conversation().clone())
    }

    pub async fn clear(&self, session_id: &str) -> AgentResult<()> {
        let session = self.get_or_create(session_id).await?;
        session.lock().await.clear();
        Ok(())
    }

    pub async fn summary(&self, session_id: &str) -> AgentResult<String> {
        let session = self.get_or_create(session_id).await?;
        let agent = session.lock().await;
        Ok(agent.summary().await)
    }

    /// Removes the session, returning its final conversation.
    pub async fn close(&self, session_id: &str) -> Option<Conversation> {
        let session = self.sessions.write().await.remove(session_id)?;
        let agent = session.lock().await;
        Some(agent.conversation().clone())
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

use std::sync::Arc;
use std::time::Duration;

use crate::agent::ChatAgent;
use crate::core::config::{AppPaths, AppSettings, ConfigService};
use crate::llm::{LlmClient, LlmService};
use crate::rag::{Embedder, OpenAiEmbedder, RetrievalOrchestrator, SessionRegistry};
use crate::tools::{TavilySearch, WebSearch};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Contains:
/// - Resolved settings
/// - Per-session index snapshots
/// - The retrieval orchestrator and chat agent, both built over hosted APIs
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub sessions: Arc<SessionRegistry>,
    pub orchestrator: Arc<RetrievalOrchestrator>,
    pub chat_agent: Arc<ChatAgent>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Loading and validating configuration
    /// 2. Building the embedding, LLM and search clients
    /// 3. Wiring them into the retrieval orchestrator and chat agent
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths);
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let embedder = OpenAiEmbedder::from_settings(&settings.embedding, settings.retry)
            .map_err(|e| InitializationError::Embedding(e.into()))?;
        if settings.embedding.api_key.is_empty() {
            tracing::warn!("No embedding API key configured; uploads will fail to index");
        }

        let llm = LlmService::new(&settings).map_err(|e| InitializationError::Llm(e.into()))?;

        let search = TavilySearch::new(
            &settings.search,
            Duration::from_secs(settings.llm_timeout_secs),
            settings.retry,
        )
        .map_err(|e| InitializationError::Search(e.into()))?;
        let search: Option<Arc<dyn WebSearch>> = if search.is_configured() {
            Some(Arc::new(search))
        } else {
            tracing::info!("TAVILY_API_KEY is not set; web search is disabled");
            None
        };

        Self::with_components(settings, Arc::new(embedder), Arc::new(llm), search)
    }

    /// Assembles state from already-built clients.
    pub fn with_components(
        settings: AppSettings,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        search: Option<Arc<dyn WebSearch>>,
    ) -> Result<Arc<Self>, InitializationError> {
        let orchestrator = RetrievalOrchestrator::new(
            embedder,
            llm.clone(),
            settings.rag.clone(),
            settings.embedding.dimensions,
        )
        .map_err(|e| InitializationError::Rag(e.into()))?;

        let chat_agent = ChatAgent::new(
            llm,
            search,
            settings.providers.clone(),
            settings.chat.clone(),
        );

        tracing::info!(
            "RAG answers via {} {} (top_k={}, chunk_size={}, overlap={})",
            settings.rag.provider,
            settings.rag.model,
            settings.rag.top_k,
            settings.rag.chunk_size,
            settings.rag.chunk_overlap
        );

        let sessions = SessionRegistry::with_capacity(settings.rag.max_sessions);

        Ok(Arc::new(AppState {
            settings: Arc::new(settings),
            sessions: Arc::new(sessions),
            orchestrator: Arc::new(orchestrator),
            chat_agent: Arc::new(chat_agent),
        }))
    }
}

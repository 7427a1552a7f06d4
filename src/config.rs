//! Engine configuration with environment overrides.

use std::time::Duration;

/// Tunables for segmentation, embedding, and retrieval.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Size budget for chunks cut from the whole-document text.
    pub doc_chunk_budget: usize,
    /// Size budget for chunks cut from a single page's text.
    pub page_chunk_budget: usize,
    /// Inputs shorter than this become a single `general` chunk.
    pub small_text_threshold: usize,
    /// How many chunks retrieval returns and chat grounds on.
    pub retrieval_top_k: usize,
    /// How many embedding calls may be in flight at once during a build.
    pub embed_concurrency: usize,
    pub providers: ProviderSettings,
}

impl EngineConfig {
    pub const DEFAULT_DOC_CHUNK_BUDGET: usize = 800;
    pub const DEFAULT_PAGE_CHUNK_BUDGET: usize = 600;
    pub const DEFAULT_SMALL_TEXT_THRESHOLD: usize = 200;
    pub const DEFAULT_TOP_K: usize = 15;
    pub const DEFAULT_EMBED_CONCURRENCY: usize = 4;

    /// Defaults plus provider settings resolved from the environment.
    ///
    /// Reads `.env` via dotenvy, then `OLLAMA_BASE_URL`, `OLLAMA_CHAT_MODEL`,
    /// `OLLAMA_EMBED_MODEL`, `GEMINI_API_KEY`, and `GEMINI_MODEL`.
    pub fn from_env() -> Self {
        Self {
            providers: ProviderSettings::from_env(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.retrieval_top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_providers(mut self, providers: ProviderSettings) -> Self {
        self.providers = providers;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            doc_chunk_budget: Self::DEFAULT_DOC_CHUNK_BUDGET,
            page_chunk_budget: Self::DEFAULT_PAGE_CHUNK_BUDGET,
            small_text_threshold: Self::DEFAULT_SMALL_TEXT_THRESHOLD,
            retrieval_top_k: Self::DEFAULT_TOP_K,
            embed_concurrency: Self::DEFAULT_EMBED_CONCURRENCY,
            providers: ProviderSettings::default(),
        }
    }
}

/// Connection settings for the remote capabilities.
#[derive(Clone, Debug)]
pub struct ProviderSettings {
    pub ollama_base_url: String,
    pub chat_model: String,
    pub embed_model: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
    /// Generation calls (chat, segmentation) get the long budget.
    pub generate_timeout: Duration,
    pub embed_timeout: Duration,
    pub health_timeout: Duration,
}

impl ProviderSettings {
    pub const DEFAULT_OLLAMA_URL: &'static str = "http://localhost:11434";
    pub const DEFAULT_CHAT_MODEL: &'static str = "llama3";
    pub const DEFAULT_EMBED_MODEL: &'static str = "nomic-embed-text";
    pub const DEFAULT_GEMINI_URL: &'static str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_GEMINI_MODEL: &'static str = "gemini-2.0-flash-exp";

    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            chat_model: std::env::var("OLLAMA_CHAT_MODEL").unwrap_or(defaults.chat_model),
            embed_model: std::env::var("OLLAMA_EMBED_MODEL").unwrap_or(defaults.embed_model),
            gemini_base_url: defaults.gemini_base_url,
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            generate_timeout: defaults.generate_timeout,
            embed_timeout: defaults.embed_timeout,
            health_timeout: defaults.health_timeout,
        }
    }

    #[must_use]
    pub fn with_ollama_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.ollama_base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            ollama_base_url: Self::DEFAULT_OLLAMA_URL.to_string(),
            chat_model: Self::DEFAULT_CHAT_MODEL.to_string(),
            embed_model: Self::DEFAULT_EMBED_MODEL.to_string(),
            gemini_base_url: Self::DEFAULT_GEMINI_URL.to_string(),
            gemini_model: Self::DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_key: None,
            generate_timeout: Duration::from_secs(120),
            embed_timeout: Duration::from_secs(60),
            health_timeout: Duration::from_secs(5),
        }
    }
}

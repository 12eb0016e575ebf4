use std::sync::Arc;

use intervue_core::catalog::{CatalogError, QuestionCatalog};
use intervue_core::config::AppConfig;
use intervue_core::random::ThreadRandom;
use intervue_core::types::Candidate;
use intervue_engine::engine::{EngineConfig, InterviewEngine};
use intervue_engine::traits::{FrameOracle, ResultStore, TextOracle};
use thiserror::Error;

use crate::detector::HttpFrameOracle;
use crate::llm::OpenAiCompatibleTextOracle;
use crate::mock::{MockFrameOracle, MockTextOracle};
use crate::secrets::{LLM_API_KEY_ENV, SecretKey, resolve_secret};
use crate::store::SqliteStore;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no LLM API key: set {LLM_API_KEY_ENV} or store one in the keyring")]
    MissingApiKey,

    #[error("look up API keys: {0:#}")]
    Secret(anyhow::Error),

    #[error("read question catalog {path}: {source}")]
    CatalogRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("question catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("catalog cannot fill {required} questions per interview")]
    CatalogTooSmall { required: usize },

    #[error("build oracle client: {0:#}")]
    Client(anyhow::Error),

    #[error("open result store: {0:#}")]
    Store(anyhow::Error),
}

/// Everything an interview needs, validated once at startup.
///
/// In mock mode a fresh canned text oracle is built per candidate; otherwise
/// every engine shares the same HTTP-backed oracles.
pub struct InterviewRuntime {
    config: AppConfig,
    catalog: QuestionCatalog,
    text: Option<Arc<dyn TextOracle>>,
    frames: Arc<dyn FrameOracle>,
    store: SqliteStore,
}

impl std::fmt::Debug for InterviewRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewRuntime")
            .field("mock_oracles", &self.config.mock_oracles)
            .field("catalog_len", &self.catalog.len())
            .field("store", &self.store)
            .finish()
    }
}

/// Oracle credentials resolved outside the config file.
#[derive(Default, Clone)]
pub struct ApiKeys {
    pub llm: Option<String>,
    // Optional; local detectors usually run without auth.
    pub detector: Option<String>,
}

impl ApiKeys {
    pub fn llm(key: impl Into<String>) -> Self {
        Self {
            llm: Some(key.into()),
            detector: None,
        }
    }

    /// Environment first, then the keyring, for each key.
    pub fn resolve() -> anyhow::Result<Self> {
        Ok(Self {
            llm: resolve_secret(SecretKey::LlmApiKey)?,
            detector: resolve_secret(SecretKey::DetectorApiKey)?,
        })
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("llm", &self.llm.as_ref().map(|_| "[REDACTED]"))
            .field("detector", &self.detector.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Resolves the API keys from the environment or keyring, then builds.
pub fn build_runtime_from_config(cfg: AppConfig) -> Result<InterviewRuntime, ConfigError> {
    let keys = if cfg.mock_oracles {
        ApiKeys::default()
    } else {
        ApiKeys::resolve().map_err(ConfigError::Secret)?
    };
    build_runtime_with_keys(cfg, keys)
}

/// Fails fast on a missing LLM API key (unless mocked), an unreadable
/// catalog, a catalog too small for the configured plan, or an unopenable
/// database.
pub fn build_runtime_with_keys(
    mut cfg: AppConfig,
    keys: ApiKeys,
) -> Result<InterviewRuntime, ConfigError> {
    let catalog = load_catalog(&cfg)?;
    check_catalog(&cfg, &catalog)?;

    let (text, frames): (Option<Arc<dyn TextOracle>>, Arc<dyn FrameOracle>) = if cfg.mock_oracles
    {
        log::warn!("running with mock oracles; replies are placeholders");
        let frames: Arc<dyn FrameOracle> = Arc::new(MockFrameOracle);
        (None, frames)
    } else {
        let key = keys
            .llm
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        cfg.llm_api_key_present = true;

        let text = OpenAiCompatibleTextOracle::new(&cfg.llm.base_url, key, &cfg.llm.model)
            .map_err(ConfigError::Client)?;
        let mut frames =
            HttpFrameOracle::new(&cfg.detector.base_url).map_err(ConfigError::Client)?;
        if let Some(detector_key) = keys.detector {
            frames = frames.with_api_key(detector_key);
        }
        let text: Arc<dyn TextOracle> = Arc::new(text);
        let frames: Arc<dyn FrameOracle> = Arc::new(frames);
        (Some(text), frames)
    };

    let store = SqliteStore::open(&cfg.database_path).map_err(ConfigError::Store)?;

    Ok(InterviewRuntime {
        config: cfg,
        catalog,
        text,
        frames,
        store,
    })
}

fn load_catalog(cfg: &AppConfig) -> Result<QuestionCatalog, ConfigError> {
    match &cfg.catalog_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
                path: path.clone(),
                source,
            })?;
            Ok(QuestionCatalog::from_json(&raw)?)
        }
        None => Ok(QuestionCatalog::builtin()?),
    }
}

fn check_catalog(cfg: &AppConfig, catalog: &QuestionCatalog) -> Result<(), ConfigError> {
    // Dry run with a throwaway source; a real selection happens per session.
    let mut rng = ThreadRandom::seeded(0);
    match catalog.select(cfg.interview.selection_plan(), &mut rng) {
        Ok(_) => Ok(()),
        Err(CatalogError::NotEnough { .. }) => Err(ConfigError::CatalogTooSmall {
            required: cfg.interview.selection_plan().total(),
        }),
        Err(e) => Err(e.into()),
    }
}

impl InterviewRuntime {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn frame_oracle(&self) -> Arc<dyn FrameOracle> {
        self.frames.clone()
    }

    /// Oracle for requests not tied to one candidate, such as report summaries.
    pub fn text_oracle(&self) -> Arc<dyn TextOracle> {
        match &self.text {
            Some(text) => text.clone(),
            None => Arc::new(MockTextOracle::new()),
        }
    }

    pub fn text_oracle_for(&self, candidate: &Candidate) -> Arc<dyn TextOracle> {
        match &self.text {
            Some(text) => text.clone(),
            None => Arc::new(MockTextOracle::for_candidate(&candidate.name)),
        }
    }

    /// A fresh engine with its own random source.
    pub fn build_engine(&self, candidate: &Candidate) -> InterviewEngine {
        let store: Arc<dyn ResultStore> = Arc::new(self.store.clone());
        InterviewEngine::new(
            EngineConfig {
                settings: self.config.interview.clone(),
                catalog: self.catalog.clone(),
            },
            self.text_oracle_for(candidate),
            store,
            Box::new(ThreadRandom::new()),
        )
    }
}

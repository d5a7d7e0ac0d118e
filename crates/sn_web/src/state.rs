use std::sync::Arc;

use sn_core::{ArticleStorage, Result};
use sn_ingest::IngestManager;
use sn_ranking::{ArticleSelector, SelectorConfig};
use tokio::sync::Mutex;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    pub selector: ArticleSelector,
    pub ingest: IngestManager,
    /// Held for the whole of a selection run; runs never interleave.
    pub selection_lock: Mutex<()>,
}

impl AppState {
    pub fn new(storage: Arc<dyn ArticleStorage>, config: SelectorConfig, ingest: IngestManager) -> Result<Self> {
        Ok(Self {
            selector: ArticleSelector::new(storage.clone(), config)?,
            storage,
            ingest,
            selection_lock: Mutex::new(()),
        })
    }

    /// State with no configured feeds.
    pub fn with_storage(storage: Arc<dyn ArticleStorage>, config: SelectorConfig) -> Result<Self> {
        let ingest = IngestManager::new(storage.clone());
        Self::new(storage, config, ingest)
    }
}

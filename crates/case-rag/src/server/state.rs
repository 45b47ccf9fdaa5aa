//! Application state for the case Q&A server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::engine::CaseEngine;
use crate::error::Result;
use crate::ingestion::UploadStore;
use crate::types::{Document, IndexHandle};

/// The document questions are currently answered from
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    /// Uploaded document
    pub document: Document,
    /// Its built index
    pub index: IndexHandle,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    engine: CaseEngine,
    uploads: UploadStore,
    /// Most recently indexed upload
    active: RwLock<Option<ActiveDocument>>,
}

impl AppState {
    /// Create state over a prepared engine
    pub fn new(config: RagConfig, engine: CaseEngine) -> Result<Self> {
        let uploads = UploadStore::new(config.upload.upload_dir.clone())?;
        tracing::info!("Upload directory: {}", uploads.dir().display());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                uploads,
                active: RwLock::new(None),
            }),
        })
    }

    /// Create state with the default providers
    pub fn from_config(config: RagConfig, api_key: impl Into<String>) -> Result<Self> {
        let engine = CaseEngine::from_config(&config, api_key)?;
        Self::new(config, engine)
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the engine
    pub fn engine(&self) -> &CaseEngine {
        &self.inner.engine
    }

    /// Get the upload store
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// Snapshot of the active document
    pub fn active(&self) -> Option<ActiveDocument> {
        self.inner.active.read().clone()
    }

    /// Make a freshly indexed document the active one
    pub fn set_active(&self, document: Document, index: IndexHandle) {
        tracing::info!("Active document is now {} ({})", document.filename, index.collection);
        *self.inner.active.write() = Some(ActiveDocument { document, index });
    }
}

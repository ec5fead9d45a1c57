//! Application state for the HTTP server

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RagConfig;
use crate::pipeline::QueryPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Query pipeline over the loaded index
    pipeline: Arc<QueryPipeline>,
    /// Ready state
    ready: RwLock<bool>,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state around a loaded pipeline
    pub fn new(config: RagConfig, pipeline: QueryPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline: Arc::new(pipeline),
                ready: RwLock::new(false),
                started_at: Utc::now(),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the query pipeline
    pub fn pipeline(&self) -> &Arc<QueryPipeline> {
        &self.inner.pipeline
    }

    /// Upper bound for one pipeline call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.inner.config.server.request_timeout_secs)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}

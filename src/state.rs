//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::highlights::OffsetResolver;
use crate::html::MarkupConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    markup: MarkupConfig,
}

impl AppState {
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let markup = MarkupConfig::default().with_class_prefix(&config.highlights.class_prefix);

        Self {
            inner: Arc::new(AppStateInner { config, db, markup }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Markup settings for server-side renders
    pub fn markup(&self) -> &MarkupConfig {
        &self.inner.markup
    }

    /// Selection resolver honoring the configured minimum length
    pub fn resolver(&self) -> OffsetResolver {
        OffsetResolver::new(self.inner.config.highlights.min_selection_len)
    }
}

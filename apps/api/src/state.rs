use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::layout::PageConfig;
use crate::standards::registry::PackRegistry;
use crate::standards::selection::StandardSelection;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Page geometry used by every worksheet render.
    pub page_config: PageConfig,
    /// Loaded standards packs. Registration is last-writer-wins on pack id.
    pub packs: Arc<RwLock<PackRegistry>>,
    /// Standards chosen for the next worksheet.
    pub selection: Arc<RwLock<StandardSelection>>,
}

impl AppState {
    pub fn new(config: Config, page_config: PageConfig) -> Self {
        Self {
            config,
            page_config,
            packs: Arc::new(RwLock::new(PackRegistry::default())),
            selection: Arc::new(RwLock::new(StandardSelection::default())),
        }
    }
}

use std::sync::Arc;

use hpcl_core::{Config, RouteProcessor, RouteStore};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn RouteStore>,
    processor: Arc<dyn RouteProcessor>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn RouteStore>,
        processor: Arc<dyn RouteProcessor>,
    ) -> Self {
        Self {
            config,
            store,
            processor,
        }
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RouteStore> {
        &self.store
    }

    pub fn processor(&self) -> &Arc<dyn RouteProcessor> {
        &self.processor
    }
}

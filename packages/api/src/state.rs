use std::sync::Arc;

use lignage_extractor::ExtractOptions;

use crate::config::ApiConfig;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    /// Dictionaries loaded once at startup, shared read-only.
    pub options: Arc<ExtractOptions>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(config: ApiConfig, options: ExtractOptions) -> Self {
        Self {
            store: RecordStore::new(),
            options: Arc::new(options),
            config: Arc::new(config),
        }
    }
}

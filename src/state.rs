use std::sync::Arc;

use crate::config::Config;
use crate::sheets::SheetStore;
use crate::utils::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SheetStore>,
    pub sessions: SessionStore,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn SheetStore>, config: Config) -> Self {
        Self {
            store,
            sessions: SessionStore::new(config.session_ttl),
            config,
        }
    }
}

use std::sync::Arc;

use crate::config::Settings;
use crate::gateway::PaymentGateway;
use crate::store::Store;

/// Shared handles injected into handlers and middleware. Tests build one
/// over the in-memory store and a stub gateway.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>, settings: Settings) -> Self {
        Self {
            store,
            gateway,
            settings: Arc::new(settings),
        }
    }
}

//! Shared application state for all routes.

use crate::store::Datastore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Built once at startup; handlers never open their own.
    pub store: Arc<dyn Datastore>,
}

impl AppState {
    pub fn new(store: impl Datastore + 'static) -> Self {
        AppState { store: Arc::new(store) }
    }
}

use crate::store::Store;

/// Shared by every handler. The store is the only state requests have in common.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

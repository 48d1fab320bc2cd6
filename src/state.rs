use crate::aggregator::Aggregator;
use crate::storage::JsonStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub aggregator: Aggregator<JsonStore>,
}

impl AppState {
    pub fn new(store: JsonStore) -> Self {
        let store = Arc::new(store);
        Self {
            aggregator: Aggregator::new(Arc::clone(&store)),
            store,
        }
    }
}

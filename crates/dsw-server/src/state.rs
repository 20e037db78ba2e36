use crate::executor::Executor;
use dsw_core::Action;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
///
/// The action map is a snapshot taken when the server starts. Actions
/// created afterwards only show up after a restart.
#[derive(Clone)]
pub struct AppState {
    pub actions: Arc<BTreeMap<String, Action>>,
    pub executor: Arc<Executor>,
}

impl AppState {
    pub fn new(actions: BTreeMap<String, Action>, executor: Executor) -> Self {
        Self {
            actions: Arc::new(actions),
            executor: Arc::new(executor),
        }
    }
}

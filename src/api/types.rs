//! Shared state for the mock API router.

use std::sync::Arc;

use crate::backend::MockBackend;

/// Handed to every handler (as `State`) and middleware (as an `Extension`).
#[derive(Clone)]
pub struct ApiContext {
    pub backend: Arc<MockBackend>,
    /// When set, requests must carry `Authorization: Bearer <token>`.
    pub required_token: Option<Arc<str>>,
}

impl ApiContext {
    pub fn new(backend: Arc<MockBackend>) -> Self {
        Self {
            backend,
            required_token: None,
        }
    }

    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(Arc::from(token));
        self
    }
}

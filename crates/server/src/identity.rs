//! Bearer-token resolution.

use std::sync::Arc;

use async_trait::async_trait;
use engine::{Caller, Engine, EngineError};

/// Turns an opaque bearer token into the [`Caller`] every engine operation
/// runs under. `Ok(None)` rejects the request with 401; an error means the
/// lookup itself failed and is answered like any other engine error.
#[async_trait]
pub trait Identity: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<Caller>, EngineError>;
}

/// Looks tokens up in the `users` table.
pub struct DatabaseIdentity {
    engine: Arc<Engine>,
}

impl DatabaseIdentity {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Identity for DatabaseIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<Caller>, EngineError> {
        self.engine.resolve_token(token).await
    }
}

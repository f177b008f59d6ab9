//! Application State

use std::sync::Arc;

use crypto_assistant::TurnGraph;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Turn graph; owns the provider, market data and session checkpoints
    pub graph: Arc<TurnGraph>,
}

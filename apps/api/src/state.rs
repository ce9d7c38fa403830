use std::sync::Arc;

use crate::config::Config;
use crate::nesting::oracle::NestingOracle;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable; requests share nothing else.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable placement backend. Default: ShelfOracle.
    pub oracle: Arc<dyn NestingOracle>,
}

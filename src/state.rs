use std::time::Instant;

use crate::config::Environment;
use crate::provider::client::ProdamusClient;

#[derive(Debug, Clone)]
pub struct AppState {
    pub client: ProdamusClient,
    pub environment: Environment,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(client: ProdamusClient, environment: Environment) -> Self {
        Self {
            client,
            environment,
            started_at: Instant::now(),
        }
    }

    pub fn expose_internal(&self) -> bool {
        self.environment.exposes_internal_errors()
    }
}

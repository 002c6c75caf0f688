//! Application state shared across handlers

use std::sync::Arc;

use moot_debate::DebateService;
use moot_llm::Metrics;

#[derive(Clone)]
pub struct AppState {
    service: Arc<DebateService>,
}

impl AppState {
    pub fn new(service: Arc<DebateService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> Arc<DebateService> {
        self.service.clone()
    }

    /// Metrics collector owned by the debate service
    pub fn metrics(&self) -> Arc<Metrics> {
        self.service.metrics().clone()
    }
}

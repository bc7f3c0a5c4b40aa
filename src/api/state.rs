//! API shared state

use crate::engine::MonitorEngine;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// The monitoring engine owned by the process entry point
    pub engine: MonitorEngine,
}

impl ApiState {
    pub fn new(engine: MonitorEngine) -> Self {
        Self { engine }
    }
}

//! Request and response bodies of the REST surface
//!
//! Target listings reuse [`TargetSnapshot`](crate::registry::TargetSnapshot)
//! directly so the REST and WebSocket feeds share one wire shape.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/websites` and `DELETE /api/websites`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteInput {
    pub url: String,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub targets: usize,
    pub listeners: usize,
}

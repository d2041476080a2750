//! # Data Models
//!
//! SeaORM entities and the small response types shared by the handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod option;
pub mod widget;

pub use option::Entity as StoredOption;
pub use widget::Entity as Widget;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "social-metadata".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadinessStatus {
    pub status: String,
}

impl ReadinessStatus {
    pub fn ready() -> Self {
        Self {
            status: "ready".to_string(),
        }
    }
}

pub mod companies;
pub mod invoices;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Confirmation returned by the delete routes
#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StatusResponse {
    /// Always `"deleted"`
    pub status: String,
}

impl StatusResponse {
    pub fn deleted() -> Self {
        StatusResponse {
            status: "deleted".to_string(),
        }
    }
}

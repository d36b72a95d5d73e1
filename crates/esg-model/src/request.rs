//! Invocation boundary types.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Request to map spreadsheet headers onto a target entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRequest {
    pub source_headers: Vec<String>,
    pub target_entity: String,
    pub company_id: String,
}

impl MapRequest {
    pub fn new(
        source_headers: Vec<String>,
        target_entity: impl Into<String>,
        company_id: impl Into<String>,
    ) -> Self {
        Self {
            source_headers,
            target_entity: target_entity.into(),
            company_id: company_id.into(),
        }
    }

    /// Parses a request from a raw JSON body.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| ModelError::InvalidRequest(e.to_string()))
    }
}

/// Error body returned by the service for any failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

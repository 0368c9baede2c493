//! Response models for the encryption endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inline (base64-JSON) representation of an encrypted document.
///
/// Returned when the client asked for `return_base64=true` or sent
/// `Accept: application/json`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EncryptResponse {
    /// The encrypted PDF, base64-encoded (standard alphabet)
    pub base64: String,
    /// Suggested file name for the encrypted document
    pub filename: String,
}

/// JSON body returned on every error path.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of the failure
    pub error: String,
}

//! Wire types for the strategy admin API.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Standard response envelope used by every admin endpoint.
///
/// Conflicts arrive in more than one shape: a transport-level 409, or a
/// business error embedded in a 200 body as `{"success": false,
/// "errorCode": "409"}`. [`ApiEnvelope::into_engine_result`] is the single
/// adapter that inspects both and emits one [`EngineError::Conflict`]; the
/// rest of the engine never looks at status codes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Canonicalize the envelope plus its HTTP status into the engine error
    /// taxonomy.
    pub fn into_engine_result(self, http_status: u16) -> Result<Option<T>, EngineError> {
        let message = |fallback: String| self.message.clone().unwrap_or(fallback);

        if http_status == 409 || (!self.success && self.error_code.as_deref() == Some("409")) {
            return Err(EngineError::Conflict(
                message("duplicate template identity".to_string()),
            ));
        }

        if !(200..300).contains(&http_status) {
            return Err(EngineError::Transport(message(format!(
                "server returned status {http_status}"
            ))));
        }

        if !self.success {
            return Err(EngineError::Transport(message(
                "server reported failure".to_string(),
            )));
        }

        Ok(self.data)
    }
}

/// Filter for allocation listings. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
}

/// Filter for template listings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_stock_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
}

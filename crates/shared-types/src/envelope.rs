//! # Correlation Envelope
//!
//! Wire-level contract external systems must honor.
//!
//! - Outbound: `{ "uuid": <id>, "request": <payload> }`
//! - Inbound success: `{ "uuid": <id>, "response": <payload> }`
//! - Inbound failure: `{ "uuid": <id>, "error": { "message", "code" } }`
//!
//! An inbound body that is undecodable, or carries neither `response` nor
//! `error`, is a validation failure.

use crate::errors::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outbound request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// Correlation id linking this request to its eventual response.
    pub uuid: Uuid,
    /// Event-specific request payload.
    pub request: Value,
}

impl OutboundEnvelope {
    /// Wrap a payload under a correlation id.
    #[must_use]
    pub fn new(uuid: Uuid, request: Value) -> Self {
        Self { uuid, request }
    }
}

/// Domain-level failure reported by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Provider-supplied message.
    pub message: String,
    /// Provider-assigned error code.
    pub code: i64,
}

/// Decoded inbound envelope body.
#[derive(Debug, Clone, Deserialize)]
struct InboundBody {
    uuid: Uuid,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    error: Option<RemoteError>,
}

/// A validated inbound envelope: either a response payload or a remote
/// error, always under a correlation id.
#[derive(Debug, Clone)]
pub struct InboundEnvelope {
    /// Correlation id carried by the message.
    pub uuid: Uuid,
    /// Success payload or remote failure.
    pub outcome: Result<Value, RemoteError>,
}

impl InboundEnvelope {
    /// Decode raw transport bytes into a validated envelope.
    ///
    /// # Errors
    ///
    /// `CoreError::Validation` when the body is not JSON, lacks a uuid,
    /// or carries neither `response` nor `error`.
    pub fn decode(raw: &[u8]) -> Result<Self, CoreError> {
        let body: InboundBody = serde_json::from_slice(raw)
            .map_err(|e| CoreError::validation(format!("malformed envelope: {e}")))?;

        let outcome = match (body.response, body.error) {
            (Some(response), _) => Ok(response),
            (None, Some(error)) => Err(error),
            (None, None) => {
                return Err(CoreError::validation(
                    "envelope carries neither response nor error",
                ))
            }
        };

        Ok(Self {
            uuid: body.uuid,
            outcome,
        })
    }

    /// Encode a success envelope (used by tests and the mock provider).
    #[must_use]
    pub fn encode_response(uuid: Uuid, response: Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({ "uuid": uuid, "response": response }))
            .unwrap_or_default()
    }

    /// Encode a failure envelope.
    #[must_use]
    pub fn encode_error(uuid: Uuid, error: &RemoteError) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({ "uuid": uuid, "error": error }))
            .unwrap_or_default()
    }
}

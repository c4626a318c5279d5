//! # Wire Payloads
//!
//! Request/response payloads exchanged with the external certification
//! authority. These ride inside the correlation envelope's `request` /
//! `response` fields; field names follow the authority's camelCase
//! contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{SignAlgorithm, SignedDocument};

/// Outbound issuance request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateRequest {
    /// Identifier value the record was inserted under.
    pub identifier: String,
    /// Requested signing algorithm.
    pub sign_algo: SignAlgorithm,
    /// Identity payload assembled by the document/profile collaborator.
    pub identity: Value,
}

/// Inbound issuance confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateIssuedPayload {
    /// Identifier value the confirmation refers to.
    pub identifier: String,
    /// Serial number of the issued certificate.
    pub serial_number: String,
    /// Authority registry the certificate lives in.
    pub registry_id: String,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

/// Outbound revocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeCertificateRequest {
    /// Identifier value to revoke.
    pub identifier: String,
}

/// Outbound hashed-file signing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignHashesRequest {
    /// Identifier value performing the signing.
    pub identifier: String,
    /// File hashes to sign.
    pub hashes: Vec<SignedDocument>,
}

/// Inbound hashed-file signing acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignHashesResponse {
    /// Resource id assigned by the authority for this engagement.
    pub resource_id: String,
}

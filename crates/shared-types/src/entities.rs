//! # Core Domain Entities
//!
//! Defines the durable records of the signing core.
//!
//! ## Clusters
//!
//! - **Identity**: `IdentifierKey`, `IdentifierRecord`, `CertificateMetadata`
//! - **Journal**: `SigningHistoryEntry`, `StatusChange`, `SignedDocument`
//! - **Subscriptions**: `SubscriptionRecord`, `SubscriptionFlags`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Opaque identifier of an application user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque identifier of a mobile device installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Signing algorithm a certificate is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignAlgorithm {
    /// DSTU 4145 (national standard).
    Dstu,
    /// ECDSA over NIST curves.
    Ecdsa,
}

impl fmt::Display for SignAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dstu => write!(f, "dstu"),
            Self::Ecdsa => write!(f, "ecdsa"),
        }
    }
}

/// Natural key of a signing identifier.
///
/// At most one non-Expired, non-Revoked identifier may exist per key
/// at any time; every store mutation is conditional on this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifierKey {
    /// Owning user.
    pub user: UserId,
    /// Device the identifier is bound to.
    pub device: DeviceId,
    /// Algorithm of the requested certificate.
    pub algorithm: SignAlgorithm,
}

impl IdentifierKey {
    /// Construct a key from its parts.
    #[must_use]
    pub fn new(user: UserId, device: DeviceId, algorithm: SignAlgorithm) -> Self {
        Self {
            user,
            device,
            algorithm,
        }
    }
}

/// Lifecycle state of a signing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierStatus {
    /// Creation requested, awaiting external confirmation.
    Pending,
    /// Certificate issued and usable for signing.
    Active,
    /// Explicitly revoked. Terminal.
    Revoked,
    /// Pending record abandoned past its TTL. Terminal.
    Expired,
}

/// Certificate metadata populated once an identifier becomes Active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    /// Serial number assigned by the certification authority.
    pub serial_number: String,
    /// Identifier of the authority registry the certificate lives in.
    pub registry_id: String,
    /// Issuance time reported by the authority.
    pub issued_at: DateTime<Utc>,
    /// Expiry time reported by the authority.
    pub expires_at: DateTime<Utc>,
}

/// A durable signing identifier record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierRecord {
    /// Natural key.
    pub key: IdentifierKey,
    /// The identifier value communicated to the external authority.
    pub identifier: String,
    /// Current lifecycle state.
    pub status: IdentifierStatus,
    /// Certificate metadata; `None` until Active.
    pub certificate: Option<CertificateMetadata>,
    /// When the Pending record was created; drives TTL abandonment.
    pub pending_created_at: DateTime<Utc>,
    /// Correlation id of an in-flight revocation request, if any.
    pub revocation_event: Option<Uuid>,
}

impl IdentifierRecord {
    /// Create a fresh Pending record for a natural key.
    #[must_use]
    pub fn pending(key: IdentifierKey, identifier: String, now: DateTime<Utc>) -> Self {
        Self {
            key,
            identifier,
            status: IdentifierStatus::Pending,
            certificate: None,
            pending_created_at: now,
            revocation_event: None,
        }
    }
}

// =============================================================================
// CLUSTER B: SIGNING HISTORY
// =============================================================================

/// Status of a signing or sharing engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningStatus {
    /// Request dispatched, outcome unknown.
    Processing,
    /// Engagement completed successfully.
    Done,
    /// Engagement refused or failed.
    Refuse,
}

/// One element of an entry's append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// The status delivered.
    pub status: SigningStatus,
    /// When the journal recorded it (arrival time, not origin time).
    pub recorded_at: DateTime<Utc>,
}

/// A document that took part in a signing engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDocument {
    /// Caller-facing file name.
    pub file_name: String,
    /// Hash of the file content, as submitted for signing.
    pub hash: String,
}

/// Relying-party metadata attached to a journal entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMeta {
    /// Acquirer (relying party) display name, if known.
    pub acquirer: Option<String>,
    /// Recipient display name, if known.
    pub recipient: Option<String>,
    /// Public service code the engagement belongs to, if any.
    pub public_service: Option<String>,
}

/// A durable, append-only audit record of one signing/sharing engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningHistoryEntry {
    /// Idempotency key. Assigned by the caller, or synthesized locally
    /// when the engagement failed before any external id existed.
    pub resource_id: String,
    /// Owning user.
    pub user: UserId,
    /// Session id deterministically derived from the device id. All
    /// entries from one device fall into one browsable session.
    pub session_id: String,
    /// Append-only list of delivered statuses, in arrival order.
    pub status_history: Vec<StatusChange>,
    /// Documents covered by the engagement.
    pub documents: Vec<SignedDocument>,
    /// Optional relying-party metadata.
    pub meta: EngagementMeta,
}

impl SigningHistoryEntry {
    /// Current status, defined as the last delivered status.
    #[must_use]
    pub fn current_status(&self) -> Option<SigningStatus> {
        self.status_history.last().map(|c| c.status)
    }
}

// =============================================================================
// CLUSTER C: SUBSCRIPTIONS
// =============================================================================

/// Per-domain boolean/segment subscription flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFlags {
    /// Flag matrix keyed by item code (document type, service code).
    pub items: HashMap<String, bool>,
    /// Segment ids the user is enrolled in, where the provider uses them.
    pub segments: Vec<String>,
}

/// A user's durable subscription record.
///
/// Mutated exclusively through strategy-produced modifiers so provider
/// logic stays centralized; no direct field writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Owning user.
    pub user: UserId,
    /// External subscription id per provider code.
    pub provider_ids: HashMap<String, String>,
    /// Document-domain flags.
    pub documents: SubscriptionFlags,
    /// Public-service-domain flags.
    pub public_services: SubscriptionFlags,
}

impl SubscriptionRecord {
    /// An empty record for a user.
    #[must_use]
    pub fn empty(user: UserId) -> Self {
        Self {
            user,
            provider_ids: HashMap::new(),
            documents: SubscriptionFlags::default(),
            public_services: SubscriptionFlags::default(),
        }
    }
}

//! # Session Derivation
//!
//! Session ids group all journal entries from one device into one
//! browsable session without a session table. The id is a keyed one-way
//! hash of the device id: statelessly reproducible across instances,
//! not reversible to the device id.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared_types::DeviceId;

type HmacSha256 = Hmac<Sha256>;

/// Hex length of a derived session id.
const SESSION_ID_LEN: usize = 32;

/// Derive the session id for a device under a service-level key.
#[must_use]
pub fn derive_session_id(key: &[u8], device: &DeviceId) -> String {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(device.as_str().as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut session = hex::encode(digest);
    session.truncate(SESSION_ID_LEN);
    session
}

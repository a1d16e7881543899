//! Reservation lookup hashes

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Deterministic lookup hash for a booking
///
/// The same visitor asking for the same start time always maps to the same
/// hash, which lets a retried request find the reservation it already
/// created. `email` must already be normalized.
pub fn lookup_hash(salt: &str, email: &str, name: &str, start: DateTime<Utc>) -> String {
    let stamp = start.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut hasher = Sha256::new();
    for part in [salt, email, name.trim(), stamp.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}

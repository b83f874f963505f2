//! HMAC-SHA256 request signing for outbound webhook deliveries.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded signature of `timestamp + "." + body`.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const EVENT_HEADER: &str = "X-Webhook-Event";
pub const ID_HEADER: &str = "X-Webhook-Id";
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";

/// Sign `timestamp + "." + body` with `secret`, returning the hex-encoded
/// HMAC-SHA256 digest. Binding the timestamp into the signed material is
/// what makes a replayed delivery's signature differ from the original's.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification, for completeness -- delivery targets (not
/// this crate) are the ones that actually need to verify inbound requests,
/// but the logic is colocated with `sign` since it must match exactly.
pub fn verify(secret: &str, timestamp: &str, body: &[u8], signature: &str) -> bool {
    let expected = sign(secret, timestamp, body);
    let expected = expected.as_bytes();
    let actual = signature.as_bytes();
    if expected.len() != actual.len() {
        return false;
    }
    expected
        .iter()
        .zip(actual)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

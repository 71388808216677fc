use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Key for the comparison MACs; it only needs to be the same on both sides
const COMPARE_KEY: &[u8] = b"timed-links/admin-secret";

fn mac_of(value: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(COMPARE_KEY).ok()?;
    mac.update(value.as_bytes());
    Some(mac)
}

/// Compares a caller supplied secret with the configured one.
///
/// Both sides go through HMAC-SHA256 and the tags are checked with
/// `verify_slice`, so the comparison time does not depend on the inputs.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let (Some(expected_mac), Some(provided_mac)) = (mac_of(expected), mac_of(provided)) else {
        return false;
    };
    let expected_tag = expected_mac.finalize().into_bytes();

    provided_mac.verify_slice(&expected_tag).is_ok()
}

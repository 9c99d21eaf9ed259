//! Per-request identifiers sent with the crypto-token request.

use chrono::Utc;
use rand::RngCore;

/// Current UTC time formatted `YYYYMMDDHHMMSS`, the format the identity
/// provider expects in the crypto-token request and key derivation.
pub fn request_timestamp() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Fresh 30-character hex nonce for one verification request.
pub fn fresh_nonce() -> String {
    let mut bytes = [0u8; 15];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_has_expected_shape() {
        let ts = request_timestamp();
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn nonces_are_fresh_and_sized() {
        let a = fresh_nonce();
        let b = fresh_nonce();
        assert_eq!(a.len(), 30);
        assert_ne!(a, b);
    }
}

//! Key derivation, AES-CBC encryption, and HMAC integrity tags.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Symmetric material for one verification request.
///
/// Derived deterministically on both sides of the handshake; never reused
/// beyond the single request it was derived for.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKeys {
    pub key: [u8; 16],
    pub iv: [u8; 16],
    pub hmac_key: [u8; 32],
}

// Key material must never reach logs, even through Debug formatting.
impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKeys(<redacted>)")
    }
}

/// Derive key, IV, and HMAC key for one request.
///
/// SHA-256 over the trimmed concatenation of timestamp, nonce, and
/// token-version id; the base64 form of the digest is sliced into segments:
/// key = first 16 bytes, IV = last 16 bytes, HMAC key = first 32 bytes.
/// The hash is applied once — both sides compute identical material without
/// a separate key-exchange channel.
pub fn derive_keys(
    request_timestamp: &str,
    request_nonce: &str,
    token_version_id: &str,
) -> DerivedKeys {
    let mut hasher = Sha256::new();
    hasher.update(request_timestamp.trim().as_bytes());
    hasher.update(request_nonce.trim().as_bytes());
    hasher.update(token_version_id.trim().as_bytes());
    let digest = hasher.finalize();

    // 32-byte digest -> 44 base64 bytes, enough for every slice below.
    let material = BASE64.encode(digest);
    let bytes = material.as_bytes();

    let mut key = [0u8; 16];
    key.copy_from_slice(&bytes[..16]);
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&bytes[bytes.len() - 16..]);
    let mut hmac_key = [0u8; 32];
    hmac_key.copy_from_slice(&bytes[..32]);

    DerivedKeys { key, iv, hmac_key }
}

/// AES-128-CBC/PKCS7 encrypt, returning base64 ciphertext.
pub fn encrypt(plaintext: &[u8], keys: &DerivedKeys) -> String {
    let ciphertext = Aes128CbcEnc::new(&keys.key.into(), &keys.iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    BASE64.encode(ciphertext)
}

/// Decrypt base64 AES-128-CBC ciphertext.
///
/// Callers must check the integrity tag first (or use [`open`]); a
/// successful decrypt alone proves nothing about authenticity.
pub fn decrypt(enc_data: &str, keys: &DerivedKeys) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = BASE64
        .decode(enc_data.trim())
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;

    Aes128CbcDec::new(&keys.key.into(), &keys.iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CryptoError::Decrypt("invalid padding or truncated ciphertext".into()))
}

/// Compute the base64 HMAC-SHA256 integrity tag over the base64 ciphertext.
pub fn sign(enc_data: &str, keys: &DerivedKeys) -> String {
    let mut mac = HmacSha256::new_from_slice(&keys.hmac_key).expect("HMAC accepts any key length");
    mac.update(enc_data.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Constant-time integrity check of `integrity_value` against `enc_data`.
pub fn verify(enc_data: &str, integrity_value: &str, keys: &DerivedKeys) -> bool {
    let Ok(tag) = BASE64.decode(integrity_value.trim()) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(&keys.hmac_key).expect("HMAC accepts any key length");
    mac.update(enc_data.as_bytes());
    mac.verify_slice(&tag).is_ok()
}

/// Verify the integrity tag, then decrypt.
///
/// A failed tag surfaces as [`CryptoError::Integrity`] and the ciphertext is
/// never decrypted — a tampered or mismatched response must not reach the
/// parser.
pub fn open(
    enc_data: &str,
    integrity_value: &str,
    keys: &DerivedKeys,
) -> Result<Vec<u8>, CryptoError> {
    if !verify(enc_data, integrity_value, keys) {
        return Err(CryptoError::Integrity);
    }
    decrypt(enc_data, keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_keys() -> DerivedKeys {
        derive_keys("20260829103000", "a1b2c3d4e5f6a7b8c9d0a1b2c3d4e5", "tv-20260829-0001")
    }

    // ── Key derivation ───────────────────────────────────────────────────

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_keys("20260829103000", "nonce", "tv");
        let b = derive_keys("20260829103000", "nonce", "tv");
        assert_eq!(a, b);
    }

    #[test]
    fn derivation_trims_inputs() {
        let a = derive_keys(" 20260829103000 ", "nonce\n", "tv ");
        let b = derive_keys("20260829103000", "nonce", "tv");
        assert_eq!(a, b);
    }

    #[test]
    fn different_token_version_different_keys() {
        let a = derive_keys("20260829103000", "nonce", "tv-1");
        let b = derive_keys("20260829103000", "nonce", "tv-2");
        assert_ne!(a, b);
    }

    #[test]
    fn debug_never_exposes_material() {
        assert_eq!(format!("{:?}", test_keys()), "DerivedKeys(<redacted>)");
    }

    // ── Round trip ───────────────────────────────────────────────────────

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let keys = test_keys();
        let plaintext = br#"{"requestno":"n-1","returnurl":"https://app.example.com/verify/return"}"#;
        let enc = encrypt(plaintext, &keys);
        assert_ne!(enc.as_bytes(), plaintext.as_slice());
        assert_eq!(decrypt(&enc, &keys).unwrap(), plaintext);
    }

    proptest! {
        #[test]
        fn roundtrip_any_payload(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let keys = test_keys();
            let enc = encrypt(&payload, &keys);
            prop_assert_eq!(decrypt(&enc, &keys).unwrap(), payload);
        }

        #[test]
        fn signed_payload_verifies(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
            let keys = test_keys();
            let enc = encrypt(&payload, &keys);
            let tag = sign(&enc, &keys);
            prop_assert!(verify(&enc, &tag, &keys));
        }
    }

    // ── Integrity ────────────────────────────────────────────────────────

    #[test]
    fn bit_flip_in_ciphertext_fails_verify() {
        let keys = test_keys();
        let enc = encrypt(b"payload", &keys);
        let tag = sign(&enc, &keys);

        let mut raw = BASE64.decode(&enc).unwrap();
        for i in 0..raw.len() {
            raw[i] ^= 0x01;
            let tampered = BASE64.encode(&raw);
            assert!(!verify(&tampered, &tag, &keys), "flip at byte {i} passed verify");
            raw[i] ^= 0x01;
        }
    }

    #[test]
    fn wrong_hmac_key_fails_verify() {
        let keys = test_keys();
        let enc = encrypt(b"payload", &keys);
        let tag = sign(&enc, &keys);

        let mut other = keys.clone();
        other.hmac_key[0] ^= 0xFF;
        assert!(!verify(&enc, &tag, &other));
    }

    #[test]
    fn open_rejects_tampered_tag_before_decrypting() {
        let keys = test_keys();
        let enc = encrypt(b"payload", &keys);
        let mut tag_bytes = BASE64.decode(sign(&enc, &keys)).unwrap();
        tag_bytes[0] ^= 0xFF;
        let tag = BASE64.encode(&tag_bytes);

        assert_eq!(open(&enc, &tag, &keys), Err(CryptoError::Integrity));
    }

    #[test]
    fn open_accepts_genuine_pair() {
        let keys = test_keys();
        let enc = encrypt(b"payload", &keys);
        let tag = sign(&enc, &keys);
        assert_eq!(open(&enc, &tag, &keys).unwrap(), b"payload");
    }

    #[test]
    fn garbage_base64_is_encoding_error() {
        let keys = test_keys();
        assert!(matches!(
            decrypt("not//valid==base64!!", &keys),
            Err(CryptoError::Encoding(_))
        ));
    }

    #[test]
    fn truncated_ciphertext_is_decrypt_error() {
        let keys = test_keys();
        // Valid base64, but not a whole AES block.
        let enc = BASE64.encode([1u8, 2, 3]);
        assert!(matches!(decrypt(&enc, &keys), Err(CryptoError::Decrypt(_))));
    }
}

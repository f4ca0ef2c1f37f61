//! Convergent AES-256-GCM encryption for drop chunks.
//!
//! The ciphertext layout is `nonce(12) || sealed body`, where the nonce is
//! the first 12 bytes of the SHA-256 of the plaintext. Deriving the nonce
//! from the plaintext makes encryption a pure function of `(key, plaintext)`:
//! the same chunk encrypted under the same key yields byte-identical
//! ciphertext, which is what lets the server deduplicate chunks across
//! drops by content address. The tradeoff is that equality of plaintext
//! chunks is visible to anyone holding the key, which is acceptable for an
//! ephemeral handoff where the key travels with the URL.
//!
//! Keys are 32 random bytes, URL-safe base64 in transit (they live in the
//! URL fragment and must never contain `+` or `/`). The [`DropKey`] wrapper
//! zeroizes key material on drop and redacts it from `Debug` output.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE as B64_URL;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a drop key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of the AES-GCM nonce prepended to every ciphertext.
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag appended by seal.
pub const TAG_SIZE: usize = 16;

/// Errors from key handling and chunk encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The encoded key is not valid base64 or has the wrong length.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Decryption failed: wrong key or corrupted data.
    #[error("decryption failed (wrong key or corrupted data)")]
    DecryptionFailed,

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
}

/// A 32-byte symmetric key for one drop, zeroized when dropped.
///
/// The `Debug` implementation is redacted so key material cannot leak into
/// logs. Raw bytes never leave this crate; callers encode, decode, encrypt,
/// and decrypt through the functions below.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DropKey([u8; KEY_SIZE]);

impl DropKey {
    /// Generate a fresh key from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        Self(key.into())
    }

    /// Encode the key as URL-safe base64 for the share-URL fragment.
    #[must_use]
    pub fn encode(&self) -> String {
        B64_URL.encode(self.0)
    }

    /// Decode a key from its URL-safe base64 form.
    ///
    /// Rejects anything that is not valid base64 or does not decode to
    /// exactly 32 bytes.
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let mut bytes = B64_URL
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid base64: {e}")))?;
        if bytes.len() != KEY_SIZE {
            bytes.zeroize();
            return Err(CryptoError::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(key))
    }

    /// Access the raw key bytes (crate-internal only).
    fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DropKey([REDACTED])")
    }
}

/// Encrypt a plaintext chunk, returning `nonce || sealed body`.
///
/// Deterministic: the nonce is the first 12 bytes of SHA-256(plaintext), so
/// repeated calls with the same key and plaintext produce identical output.
pub fn encrypt(key: &DropKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let digest = Sha256::digest(plaintext);
    let nonce = Nonce::from_slice(&digest.as_slice()[..NONCE_SIZE]);

    let sealed = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt a `nonce || sealed body` ciphertext produced by [`encrypt`].
///
/// Any failure (truncated input, wrong key, a single flipped bit) is
/// reported as [`CryptoError::DecryptionFailed`] with no partial output.
pub fn decrypt(key: &DropKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }
    let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_key(byte: u8) -> DropKey {
        DropKey([byte; KEY_SIZE])
    }

    #[test]
    fn roundtrip_encrypt_decrypt() {
        let key = DropKey::generate();
        let plaintext = b"Top secret CodeDrop file data";

        let ciphertext = encrypt(&key, plaintext).unwrap();
        assert_ne!(&ciphertext[NONCE_SIZE..], plaintext.as_slice());

        let decrypted = decrypt(&key, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn encryption_is_deterministic() {
        let key = fixed_key(0x42);
        let plaintext = b"identical chunk contents";

        let a = encrypt(&key, plaintext).unwrap();
        let b = encrypt(&key, plaintext).unwrap();
        assert_eq!(a, b, "same key and plaintext must converge");
    }

    #[test]
    fn different_keys_diverge() {
        let plaintext = b"shared plaintext";
        let a = encrypt(&fixed_key(0x01), plaintext).unwrap();
        let b = encrypt(&fixed_key(0x02), plaintext).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn nonce_is_plaintext_hash_prefix() {
        let key = fixed_key(0x33);
        let plaintext = b"nonce derivation check";
        let ciphertext = encrypt(&key, plaintext).unwrap();
        let digest = Sha256::digest(plaintext);
        assert_eq!(&ciphertext[..NONCE_SIZE], &digest.as_slice()[..NONCE_SIZE]);
    }

    #[test]
    fn ciphertext_length_is_plaintext_plus_overhead() {
        let key = fixed_key(0x55);
        let plaintext = vec![7u8; 1024];
        let ciphertext = encrypt(&key, &plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + NONCE_SIZE + TAG_SIZE);
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = DropKey::generate();
        let mut ciphertext = encrypt(&key, b"sensitive info").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;

        let err = decrypt(&key, &ciphertext).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn wrong_key_fails() {
        let ciphertext = encrypt(&fixed_key(0x11), b"secret message").unwrap();
        let err = decrypt(&fixed_key(0x12), &ciphertext).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let key = DropKey::generate();
        let err = decrypt(&key, &[0u8; NONCE_SIZE - 1]).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn key_encode_decode_roundtrip() {
        let key = DropKey::generate();
        let encoded = key.encode();
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));

        let decoded = DropKey::decode(&encoded).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let short = B64_URL.encode([0u8; 16]);
        let err = DropKey::decode(&short).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));

        let long = B64_URL.encode([0u8; 48]);
        let err = DropKey::decode(&long).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let err = DropKey::decode("not base64 at all!!!").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));
    }

    #[test]
    fn key_debug_is_redacted() {
        let key = fixed_key(0x42);
        let debug = format!("{key:?}");
        assert_eq!(debug, "DropKey([REDACTED])");
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let key = DropKey::generate();
        let ciphertext = encrypt(&key, b"").unwrap();
        assert_eq!(ciphertext.len(), NONCE_SIZE + TAG_SIZE);
        let decrypted = decrypt(&key, &ciphertext).unwrap();
        assert!(decrypted.is_empty());
    }
}

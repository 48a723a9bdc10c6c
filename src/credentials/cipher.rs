//! AES-256-GCM encryption for stored secrets
//!
//! Stored format is `hex(nonce):hex(tag):hex(ciphertext)`. Every call to
//! [`SecretCipher::encrypt`] draws a fresh random 96-bit nonce from the
//! system CSPRNG; nonce reuse under one key breaks GCM.

use crate::error::{AppError, AppResult};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::digest::{SHA256, digest};
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;

const TAG_LEN: usize = 16;

/// Encrypts and decrypts credential secrets with a key derived from a passphrase
pub struct SecretCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Derive the 256-bit key as SHA-256 of the passphrase
    pub fn from_passphrase(passphrase: &str) -> AppResult<Self> {
        if passphrase.is_empty() {
            return Err(AppError::Crypto(
                "encryption passphrase cannot be empty".to_string(),
            ));
        }
        let key_bytes = digest(&SHA256, passphrase.as_bytes());
        let unbound = UnboundKey::new(&AES_256_GCM, key_bytes.as_ref())
            .map_err(|_| AppError::Crypto("failed to create AES-256-GCM key".to_string()))?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| AppError::Crypto("failed to generate random nonce".to_string()))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        let tag = self
            .key
            .seal_in_place_separate_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| AppError::Crypto("AES-256-GCM encryption failed".to_string()))?;

        Ok(format!(
            "{}:{}:{}",
            hex::encode(nonce_bytes),
            hex::encode(tag.as_ref()),
            hex::encode(&in_out)
        ))
    }

    pub fn decrypt(&self, encoded: &str) -> AppResult<String> {
        let mut parts = encoded.split(':');
        let (Some(nonce_hex), Some(tag_hex), Some(ciphertext_hex), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AppError::Crypto(
                "ciphertext must have the form nonce:tag:ciphertext".to_string(),
            ));
        };

        let nonce_bytes: [u8; NONCE_LEN] = decode_hex(nonce_hex, "nonce")?
            .try_into()
            .map_err(|_| AppError::Crypto(format!("nonce must be {} bytes", NONCE_LEN)))?;
        let tag = decode_hex(tag_hex, "tag")?;
        if tag.len() != TAG_LEN {
            return Err(AppError::Crypto(format!("tag must be {} bytes", TAG_LEN)));
        }

        let mut in_out = decode_hex(ciphertext_hex, "ciphertext")?;
        in_out.extend_from_slice(&tag);

        let plaintext = self
            .key
            .open_in_place(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| {
                AppError::Crypto(
                    "AES-256-GCM decryption failed -- wrong key or corrupted data".to_string(),
                )
            })?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| AppError::Crypto("decrypted secret is not valid UTF-8".to_string()))
    }
}

fn decode_hex(value: &str, part: &str) -> AppResult<Vec<u8>> {
    hex::decode(value).map_err(|e| AppError::Crypto(format!("invalid {} encoding: {}", part, e)))
}

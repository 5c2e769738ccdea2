//! Cookie encryption and token signing.
//!
//! Cookie values are AES-256-GCM encrypted under a per-cookie key derived by
//! HMAC from a master key, with the cookie name bound as associated data.
//! Anti-forgery tokens are HMAC-SHA256 tags over the session identifier.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encryption failed inside the AEAD implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cookie encryption failed")]
pub struct EncryptError;

fn master_key(domain: &[u8], secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

fn hmac(key: &[u8], data: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as hmac::Mac>::new_from_slice(key)
        .expect("HMAC accepts any key size");
    mac.update(data);
    mac
}

#[derive(Clone)]
pub struct CookieCrypto {
    master_key: [u8; 32],
}

impl CookieCrypto {
    /// Creates a new `CookieCrypto` instance using the provided secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            master_key: master_key(b"gws-cookie-v1\0", secret),
        }
    }

    /// Encrypts `plaintext` into a URL-safe string bound to `name`.
    pub fn encrypt(&self, name: &str, plaintext: &[u8]) -> Result<String, EncryptError> {
        let mut token = [0u8; TOKEN_LEN];
        OsRng.fill_bytes(&mut token);

        let derived_key = self.derive_key(&token);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived_key));
        let ciphertext = cipher
            .encrypt(nonce, Payload { msg: plaintext, aad: name.as_bytes() })
            .map_err(|_| EncryptError)?;

        let mut combined = Vec::with_capacity(TOKEN_LEN + NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&token);
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(&combined))
    }

    /// Decrypts a value produced by [`encrypt`](Self::encrypt) for the same name.
    ///
    /// Any malformed, truncated or tampered input yields `None`.
    #[must_use]
    pub fn decrypt(&self, name: &str, encoded: &str) -> Option<Vec<u8>> {
        let combined = URL_SAFE_NO_PAD.decode(encoded).ok()?;

        if combined.len() < TOKEN_LEN + NONCE_LEN + TAG_LEN + 1 {
            return None;
        }

        let token = &combined[..TOKEN_LEN];
        let nonce = Nonce::from_slice(&combined[TOKEN_LEN..TOKEN_LEN + NONCE_LEN]);
        let ciphertext = &combined[TOKEN_LEN + NONCE_LEN..];

        let derived_key = self.derive_key(token);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived_key));
        cipher
            .decrypt(nonce, Payload { msg: ciphertext, aad: name.as_bytes() })
            .ok()
    }

    fn derive_key(&self, token: &[u8]) -> [u8; 32] {
        hmac(&self.master_key, token).finalize().into_bytes().into()
    }
}

/// Derives and verifies per-session anti-forgery tokens.
#[derive(Clone)]
pub struct TokenSigner {
    key: [u8; 32],
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: master_key(b"gws-csrf-v1\0", secret),
        }
    }

    /// Token for the given session identifier.
    #[must_use]
    pub fn sign(&self, session_id: &str) -> String {
        let tag = hmac(&self.key, session_id.as_bytes()).finalize().into_bytes();
        URL_SAFE_NO_PAD.encode(tag)
    }

    /// Constant-time check of `token` against the session identifier.
    #[must_use]
    pub fn verify(&self, session_id: &str, token: &str) -> bool {
        let Ok(tag) = URL_SAFE_NO_PAD.decode(token.trim()) else {
            return false;
        };
        hmac(&self.key, session_id.as_bytes()).verify_slice(&tag).is_ok()
    }
}

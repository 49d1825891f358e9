// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cryptographic utilities for sealing and digesting page state.
//!
//! `KeyRing` holds the two immutable keys a strategy may need: an AES-256-GCM
//! key for the cipher strategy and an HMAC-SHA256 key for the hash strategy.
//! Keys are read-only after construction, so a ring can be shared freely.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::engine_core::constants::crypto;
use crate::engine_core::errors::CryptoError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct KeyRing {
    cipher_key: [u8; crypto::CIPHER_KEY_LENGTH],
    mac_key: [u8; crypto::MAC_KEY_LENGTH],
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRing").finish_non_exhaustive()
    }
}

impl KeyRing {
    /// Create a ring with fresh random keys
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut cipher_key = [0u8; crypto::CIPHER_KEY_LENGTH];
        let mut mac_key = [0u8; crypto::MAC_KEY_LENGTH];
        rng.fill_bytes(&mut cipher_key);
        rng.fill_bytes(&mut mac_key);
        Self {
            cipher_key,
            mac_key,
        }
    }

    /// Build a ring from hex-encoded keys; a missing key is generated.
    pub fn from_hex(cipher_hex: Option<&str>, mac_hex: Option<&str>) -> Result<Self, CryptoError> {
        let mut ring = Self::generate();
        if let Some(hex_key) = cipher_hex {
            hex::decode_to_slice(hex_key.trim(), &mut ring.cipher_key).map_err(|e| {
                CryptoError::InvalidKey(format!(
                    "cipher key must be {} hex-encoded bytes: {}",
                    crypto::CIPHER_KEY_LENGTH,
                    e
                ))
            })?;
        }
        if let Some(hex_key) = mac_hex {
            hex::decode_to_slice(hex_key.trim(), &mut ring.mac_key).map_err(|e| {
                CryptoError::InvalidKey(format!(
                    "hash key must be {} hex-encoded bytes: {}",
                    crypto::MAC_KEY_LENGTH,
                    e
                ))
            })?;
        }
        Ok(ring)
    }

    /// Encrypt and authenticate. Output: nonce (12 bytes) || ciphertext || tag
    pub fn seal(&self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = <Aes256Gcm as KeyInit>::new_from_slice(&self.cipher_key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        let mut nonce_bytes = [0u8; crypto::NONCE_LENGTH];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::SealError)?;

        let mut out = Vec::with_capacity(crypto::NONCE_LENGTH + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt data produced by `seal`.
    ///
    /// Every failure collapses into `None`: callers must not learn whether the
    /// blob was short, the tag was wrong or the key differed.
    pub fn open(&self, aad: &[u8], sealed: &[u8]) -> Option<Vec<u8>> {
        if sealed.len() < crypto::NONCE_LENGTH + crypto::AEAD_TAG_LENGTH {
            return None;
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(crypto::NONCE_LENGTH);
        let cipher = <Aes256Gcm as KeyInit>::new_from_slice(&self.cipher_key).ok()?;
        cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .ok()
    }

    fn keyed_mac(&self, label: &[u8], parts: &[&[u8]]) -> Result<HmacSha256, CryptoError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.mac_key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        // length-prefix every part so concatenations stay unambiguous
        for part in std::iter::once(&label).chain(parts.iter()) {
            mac.update(&(part.len() as u64).to_be_bytes());
            mac.update(part);
        }
        Ok(mac)
    }

    /// HMAC-SHA256 over a labelled sequence of parts
    pub fn digest(
        &self,
        label: &[u8],
        parts: &[&[u8]],
    ) -> Result<[u8; crypto::STRUCTURE_TAG_LENGTH], CryptoError> {
        let mac = self.keyed_mac(label, parts)?;
        let mut out = [0u8; crypto::STRUCTURE_TAG_LENGTH];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }

    /// Constant-time check of a (possibly left-truncated) tag
    pub fn verify_digest(&self, label: &[u8], parts: &[&[u8]], tag: &[u8]) -> bool {
        if tag.is_empty() {
            return false;
        }
        match self.keyed_mac(label, parts) {
            Ok(mac) => mac.verify_truncated_left(tag).is_ok(),
            Err(_) => false,
        }
    }

    /// Hex-encoded keys, for operators provisioning env configuration
    pub fn to_hex(&self) -> (String, String) {
        (hex::encode(self.cipher_key), hex::encode(self.mac_key))
    }
}

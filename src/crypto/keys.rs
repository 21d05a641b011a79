// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Per-container encryption key generation.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

/// Length of the raw key material in bytes.
pub const KEY_LEN: usize = 32;

/// Generates container encryption keys from the system CSPRNG.
///
/// Keys are 32 random bytes, base64-encoded for storage in the container
/// row. A key is generated exactly once per container and never rotated;
/// at 256 bits the birthday bound makes an explicit uniqueness check
/// unnecessary.
pub struct KeyService {
    rng: SystemRandom,
}

impl KeyService {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Generate a fresh base64-encoded 256-bit key.
    pub fn generate_key(&self) -> Result<String, ring::error::Unspecified> {
        let mut key = [0u8; KEY_LEN];
        self.rng.fill(&mut key)?;
        Ok(STANDARD.encode(key))
    }
}

impl Default for KeyService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_decodes_to_32_bytes() {
        let service = KeyService::new();
        let key = service.generate_key().unwrap();

        let raw = STANDARD.decode(&key).expect("key should be valid base64");
        assert_eq!(raw.len(), KEY_LEN);
    }

    #[test]
    fn generated_keys_are_distinct() {
        let service = KeyService::new();
        let a = service.generate_key().unwrap();
        let b = service.generate_key().unwrap();
        assert_ne!(a, b);
    }
}

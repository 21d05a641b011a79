// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Coffer Contributors

//! Deterministic name encryption.
//!
//! A name string is encrypted under a container key into an opaque token
//! that is safe to use as a path segment and inside a URL. The transform is
//! AES-256-CBC with PKCS#7 padding and a **fixed all-zero IV**, so the same
//! `(name, key)` pair always yields the same token. That determinism is the
//! point: folder and file paths are recomputed from live metadata on every
//! access, never persisted.
//!
//! Token layout: `base64(iv || ciphertext)` with `+`→`-`, `/`→`_`, `=`→`,`
//! substituted. The IV prefix is carried even though it is always zero; the
//! decrypt side reads the IV it was handed rather than assuming it.
//!
//! File names keep their extension in plaintext around the encrypted stem
//! (`<token>.png`), which lets the content type be inferred without a key.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::keys::KEY_LEN;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block length; also the length of the IV prefix inside a token.
const BLOCK_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("token is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token has an invalid length")]
    Length,

    #[error("token did not decrypt under this key")]
    Decrypt,

    #[error("decrypted name is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Deterministic cipher between plaintext names and path-safe tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameCipher;

impl NameCipher {
    pub fn new() -> Self {
        Self
    }

    /// Encrypt a name into a path-safe token.
    ///
    /// Deterministic: encrypting the same name under the same key twice
    /// yields the same token.
    pub fn encrypt(&self, plain: &str, key: &str) -> String {
        let iv = [0u8; BLOCK_LEN];
        let cipher = Aes256CbcEnc::new(&derive_key(key).into(), &iv.into());
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plain.as_bytes());

        let mut combined = Vec::with_capacity(BLOCK_LEN + ciphertext.len());
        combined.extend_from_slice(&iv);
        combined.extend_from_slice(&ciphertext);

        to_path_safe(&STANDARD.encode(combined))
    }

    /// Decrypt a token back into the original name.
    pub fn decrypt(&self, token: &str, key: &str) -> Result<String, CipherError> {
        let combined = STANDARD.decode(from_path_safe(token))?;
        if combined.len() < 2 * BLOCK_LEN || combined.len() % BLOCK_LEN != 0 {
            return Err(CipherError::Length);
        }

        let (iv, ciphertext) = combined.split_at(BLOCK_LEN);
        let mut iv_block = [0u8; BLOCK_LEN];
        iv_block.copy_from_slice(iv);

        let cipher = Aes256CbcDec::new(&derive_key(key).into(), &iv_block.into());
        let plain = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::Decrypt)?;

        Ok(String::from_utf8(plain)?)
    }

    /// Encrypt a file name, keeping its extension in plaintext.
    ///
    /// `"cat.png"` becomes `"<token>.png"`; a name without an extension is
    /// encrypted whole.
    pub fn encrypt_file_name(&self, file_name: &str, key: &str) -> String {
        let (stem, extension) = split_extension(file_name);
        format!("{}{extension}", self.encrypt(stem, key))
    }

    /// Decrypt a stored file name produced by [`Self::encrypt_file_name`].
    pub fn decrypt_file_name(&self, encrypted: &str, key: &str) -> Result<String, CipherError> {
        let (stem, extension) = split_extension(encrypted);
        Ok(format!("{}{extension}", self.decrypt(stem, key)?))
    }
}

/// Derive the AES-256 key from the container key string: UTF-8 bytes,
/// space-padded on the right and truncated to exactly 32 bytes.
fn derive_key(key: &str) -> [u8; KEY_LEN] {
    let mut derived = [b' '; KEY_LEN];
    let bytes = key.as_bytes();
    let len = bytes.len().min(KEY_LEN);
    derived[..len].copy_from_slice(&bytes[..len]);
    derived
}

/// Substitute the base64 characters that are unsafe in paths and URLs.
fn to_path_safe(encoded: &str) -> String {
    encoded
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            '=' => ',',
            other => other,
        })
        .collect()
}

fn from_path_safe(token: &str) -> String {
    token
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            ',' => '=',
            other => other,
        })
        .collect()
}

/// Split a file name into `(stem, extension)`, the extension keeping its
/// leading dot. A leading-dot name like `.gitignore` counts as all stem.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

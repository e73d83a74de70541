//! Cryptographic primitives used by the SRTP pipeline.

use thiserror::Error;

mod aead;
pub use aead::{rtp_iv, AeadAesGcm, RtpIv, IV_LEN, SALT_LEN, TAG_LEN};

/// Errors that can arise in the SRTP ciphers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The key is not a valid AES key (16 or 32 bytes).
    #[error("Invalid key length: {0}")]
    InvalidKeyLength(usize),

    /// The master salt does not fit in one AES block.
    #[error("Invalid master salt length: {0}")]
    InvalidSaltLength(usize),

    /// Encryption failed, or decryption failed to authenticate.
    #[error("AES-GCM {0} failed")]
    Aead(&'static str),
}

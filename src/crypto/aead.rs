//! AEAD AES-GCM for SRTP using RustCrypto.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};

use super::CryptoError;

/// Length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;
/// Length of the GCM nonce.
pub const IV_LEN: usize = 12;
/// Length of the derived session salt.
pub const SALT_LEN: usize = 12;
/// Nonce for one RTP packet, see [`rtp_iv()`].
pub type RtpIv = [u8; IV_LEN];

/// AES-GCM with either a 128 or a 256 bit key.
pub enum AeadAesGcm {
    /// 16 byte key.
    Aes128(Box<Aes128Gcm>),
    /// 32 byte key.
    Aes256(Box<Aes256Gcm>),
}

impl AeadAesGcm {
    /// Creates the cipher. The key length selects the AES variant.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::InvalidKeyLength(key.len());

        match key.len() {
            16 => Ok(Self::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key).map_err(invalid)?,
            ))),
            32 => Ok(Self::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key).map_err(invalid)?,
            ))),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }

    /// Encrypts `input`, returning ciphertext with the tag appended.
    pub fn encrypt(&self, iv: &RtpIv, aad: &[u8], input: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = Nonce::from_slice(iv);
        let payload = Payload { msg: input, aad };

        match self {
            Self::Aes128(c) => c.encrypt(nonce, payload),
            Self::Aes256(c) => c.encrypt(nonce, payload),
        }
        .map_err(|_| CryptoError::Aead("encrypt"))
    }

    /// Verifies the tag at the end of `input` and decrypts the rest.
    pub fn decrypt(&self, iv: &RtpIv, aad: &[u8], input: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if input.len() < TAG_LEN {
            return Err(CryptoError::Aead("decrypt"));
        }

        let nonce = Nonce::from_slice(iv);
        let payload = Payload { msg: input, aad };

        match self {
            Self::Aes128(c) => c.decrypt(nonce, payload),
            Self::Aes256(c) => c.decrypt(nonce, payload),
        }
        .map_err(|_| CryptoError::Aead("decrypt"))
    }
}

impl fmt::Debug for AeadAesGcm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes128(_) => f.debug_struct("AeadAes128Gcm").finish(),
            Self::Aes256(_) => f.debug_struct("AeadAes256Gcm").finish(),
        }
    }
}

/// Builds the RTP IV.
///
/// See: https://www.rfc-editor.org/rfc/rfc7714#section-8.1
pub fn rtp_iv(salt: &[u8], ssrc: u32, roc: u32, seq: u16) -> RtpIv {
    let mut iv = [0; IV_LEN];

    iv[2..6].copy_from_slice(&ssrc.to_be_bytes());
    iv[6..10].copy_from_slice(&roc.to_be_bytes());
    iv[10..12].copy_from_slice(&seq.to_be_bytes());

    for (i, s) in iv.iter_mut().zip(salt.iter()) {
        *i ^= s;
    }

    iv
}

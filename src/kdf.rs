//! SRTP key derivation.
//!
//! https://tools.ietf.org/html/rfc3711#section-4.3

use std::fmt;

use aes::{Aes128, Aes256};
use ctr::cipher::{KeyIvInit, StreamCipher};
use serde::{Deserialize, Serialize};

use crate::crypto::CryptoError;
use crate::rtp_::RtpError;

/// Label for the SRTP session key.
pub const LABEL_RTP_ENCRYPTION: u8 = 0x00;
/// Label for the SRTP authentication key. Unused by the AEAD profiles.
pub const LABEL_RTP_AUTHENTICATION: u8 = 0x01;
/// Label for the SRTP session salt.
pub const LABEL_RTP_SALT: u8 = 0x02;
/// Label for the SRTCP session key.
pub const LABEL_RTCP_ENCRYPTION: u8 = 0x03;
/// Label for the SRTCP authentication key.
pub const LABEL_RTCP_AUTHENTICATION: u8 = 0x04;
/// Label for the SRTCP session salt.
pub const LABEL_RTCP_SALT: u8 = 0x05;

/// Length the master salt is zero padded to.
pub const MASTER_SALT_LEN: usize = 14;

const AES_BLOCK_LEN: usize = 16;

// label (1) + index (6)
const KEY_ID_LEN: usize = 7;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// SRTP protection profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SrtpProfile {
    /// SRTP_AEAD_AES_128_GCM, RFC 7714.
    #[default]
    AeadAes128Gcm,
    /// SRTP_AEAD_AES_256_GCM, RFC 7714.
    AeadAes256Gcm,
}

impl SrtpProfile {
    /// All the profiles we support, ordered from most preferred to least.
    pub const ALL: &'static [SrtpProfile] = &[SrtpProfile::AeadAes128Gcm, SrtpProfile::AeadAes256Gcm];

    /// The DTLS-SRTP protection profile id.
    ///
    /// https://www.iana.org/assignments/srtp-protection/srtp-protection.xhtml
    pub fn id(&self) -> u16 {
        match self {
            SrtpProfile::AeadAes128Gcm => 0x0007,
            SrtpProfile::AeadAes256Gcm => 0x0008,
        }
    }

    /// Session key and salt lengths in bytes.
    #[rustfmt::skip]
    pub fn key_sizes(&self) -> (usize, usize) {
        match self {
            SrtpProfile::AeadAes128Gcm => (16, 12),
            SrtpProfile::AeadAes256Gcm => (32, 12),
        }
    }

    /// Length of the master key.
    pub fn master_key_len(&self) -> usize {
        self.key_sizes().0
    }
}

impl TryFrom<u16> for SrtpProfile {
    type Error = RtpError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        SrtpProfile::ALL
            .iter()
            .find(|p| p.id() == id)
            .copied()
            .ok_or(RtpError::UnsupportedCipher(id))
    }
}

impl fmt::Display for SrtpProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SrtpProfile::AeadAes128Gcm => write!(f, "SRTP_AEAD_AES_128_GCM"),
            SrtpProfile::AeadAes256Gcm => write!(f, "SRTP_AEAD_AES_256_GCM"),
        }
    }
}

#[derive(Clone)]
enum MasterKey {
    Aes128([u8; 16]),
    Aes256([u8; 32]),
}

/// Key derivation function bound to a master key and salt.
///
/// Holds no counters, the same `(label, index, size)` always derives the
/// same bytes.
#[derive(Clone)]
pub struct Kdf {
    master_salt: Vec<u8>,
    master_key: MasterKey,
}

impl Kdf {
    /// Creates a KDF for the master key and salt.
    ///
    /// The salt is zero padded to 14 bytes. The master key must be 16 or 32 bytes.
    pub fn new(master_key: &[u8], master_salt: &[u8]) -> Result<Kdf, CryptoError> {
        if master_salt.len() > AES_BLOCK_LEN {
            return Err(CryptoError::InvalidSaltLength(master_salt.len()));
        }

        let mut salt = master_salt.to_vec();
        if salt.len() < MASTER_SALT_LEN {
            salt.resize(MASTER_SALT_LEN, 0);
        }

        let invalid = |_| CryptoError::InvalidKeyLength(master_key.len());

        let master_key = match master_key.len() {
            16 => MasterKey::Aes128(master_key.try_into().map_err(invalid)?),
            32 => MasterKey::Aes256(master_key.try_into().map_err(invalid)?),
            n => return Err(CryptoError::InvalidKeyLength(n)),
        };

        Ok(Kdf {
            master_salt: salt,
            master_key,
        })
    }

    /// Derive `size` bytes of key material for `label` at the 48 bit `index`.
    pub fn derive(&self, label: u8, index: u64, size: usize) -> Vec<u8> {
        // key_id = label || index (48 bit)
        let mut key_id = [0; KEY_ID_LEN];
        key_id[0] = label;
        key_id[1..].copy_from_slice(&index.to_be_bytes()[2..]);

        // x = key_id XOR master_salt, right aligned
        let mut iv = [0; AES_BLOCK_LEN];
        let salt_len = self.master_salt.len();
        iv[..salt_len].copy_from_slice(&self.master_salt);

        let start = salt_len - KEY_ID_LEN;
        for (x, k) in iv[start..salt_len].iter_mut().zip(key_id.iter()) {
            *x ^= k;
        }

        let mut out = vec![0; size];

        match &self.master_key {
            MasterKey::Aes128(k) => Aes128Ctr::new(&(*k).into(), &iv.into()).apply_keystream(&mut out),
            MasterKey::Aes256(k) => Aes256Ctr::new(&(*k).into(), &iv.into()).apply_keystream(&mut out),
        }

        out
    }

    /// Derive the RTP session key and salt for a profile at a packet index.
    pub fn derive_for_stream(&self, profile: SrtpProfile, index: u64) -> (Vec<u8>, Vec<u8>) {
        let (key_len, salt_len) = profile.key_sizes();

        let key = self.derive(LABEL_RTP_ENCRYPTION, index, key_len);
        let salt = self.derive(LABEL_RTP_SALT, index, salt_len);

        (key, salt)
    }

    /// Derive the RTCP session key and salt for a profile at an SRTCP index.
    ///
    /// RTCP has no rollover counter, the 32 bit index is used as is.
    pub fn derive_for_srtcp_stream(&self, profile: SrtpProfile, srtcp_index: u32) -> (Vec<u8>, Vec<u8>) {
        let (key_len, salt_len) = profile.key_sizes();

        let key = self.derive(LABEL_RTCP_ENCRYPTION, srtcp_index as u64, key_len);
        let salt = self.derive(LABEL_RTCP_SALT, srtcp_index as u64, salt_len);

        (key, salt)
    }
}

impl fmt::Debug for Kdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.master_key {
            MasterKey::Aes128(_) => "AES-128",
            MasterKey::Aes256(_) => "AES-256",
        };
        f.debug_struct("Kdf").field("cipher", &kind).finish()
    }
}

use thiserror::Error;

mod id;
pub use id::{Pt, SeqNo, Ssrc};

mod ext;
pub use ext::{decode_audio_level, encode_audio_level};
pub use ext::{Extension, ExtensionMap, MAX_ID_ONE_BYTE_FORM, MAX_LEN_ONE_BYTE_FORM};

mod ohb;
pub use ohb::Ohb;

mod ekt;
pub use ekt::EktField;

mod packet;
pub use packet::{RtpPacket, DEFAULT_MTU, RTP_HEADER_LEN};

use crate::crypto::CryptoError;

/// Errors that can arise in RTP.
#[derive(Debug, Error)]
pub enum RtpError {
    /// The EKT trailer has an unknown type or a bad length.
    #[error("Invalid EKT field")]
    InvalidEktField,

    /// The EKT trailer does not fit in the packet MTU.
    #[error("EKT too large to fit in packet MTU: {len} > {mtu}")]
    EktTooLargeForMtu {
        /// Length the packet would have had.
        len: usize,
        /// MTU of the packet.
        mtu: usize,
    },

    /// SRTP protection profile id we don't support.
    #[error("Unsupported SRTP cipher: {0:#06x}")]
    UnsupportedCipher(u16),

    /// Extension ids above 14 need the two byte form.
    #[error("Two byte RTP header extensions are not supported: id {0}")]
    TwoByteExtensionUnsupported(u8),

    /// Error arising in the crypto
    #[error("{0}")]
    Crypto(#[from] CryptoError),

    /// Authentication or decryption of an incoming packet failed.
    #[error("Failed to unprotect SRTP: {0}")]
    Unprotect(CryptoError),

    /// Failed to parse RTP header.
    #[error("Failed to parse RTP header")]
    ParseHeader,

    /// One byte extension ids are 1-14.
    #[error("Invalid RTP extension id: {0}")]
    InvalidExtensionId(u8),

    /// One byte extension values are 1-16 bytes.
    #[error("Invalid RTP extension length: {0}")]
    InvalidExtensionLength(usize),

    /// The extension has no id in the session extension map.
    #[error("RTP extension not mapped: {0}")]
    ExtensionNotMapped(String),

    /// The original header block is malformed.
    #[error("Invalid OHB")]
    InvalidOhb,

    /// The session has no master key.
    #[error("No SRTP master key set")]
    NoSrtpKey,

    /// Payload types are 7 bit.
    #[error("Invalid payload type: {0}")]
    InvalidPayloadType(u8),
}

//! SRTP packet pipeline for PERC double encryption.
//!
//! This is a Sans I/O library. An [`RtpSession`] protects and unprotects
//! single RTP packets, it never touches a socket and has no internal threads
//! or async tasks. All operations happen from calls of the public API.
//!
//! The pieces are:
//!
//! * [`kdf`] – the RFC 3711 key derivation, turning a master key and salt
//!   into per packet keys.
//! * [`RtpSession`] – the running `(roc, seq)` packet index. Encode writes
//!   the original header values into an OHB, stamps the session's sequence
//!   number, encrypts with AES-GCM and appends the EKT trailer. Decode
//!   reverses that.
//! * [`rtp::RtpPacket`] – an RTP packet with one byte header extensions
//!   (RFC 8285) and the client audio level (RFC 6464) on top.
//!
//! # Usage
//!
//! ```
//! use perc_srtp::rtp::RtpPacket;
//! use perc_srtp::SessionConfig;
//!
//! let config = SessionConfig::new()
//!     .set_srtp_key(&[0; 16], &[0; 14])
//!     .set_initial_seq(1000)
//!     .set_extension(9, "urn:ietf:params:rtp-hdrext:ssrc-audio-level");
//!
//! // Both ends must start from the same index.
//! let mut sender = config.build().unwrap();
//! let receiver = config.build().unwrap();
//!
//! let mut packet = RtpPacket::new(&[1, 2, 3, 4], 8.into(), 22, 33, 44.into());
//! packet.set_ext_client_volume(&sender, true, -12).unwrap();
//!
//! let wire = sender.encode(&mut packet).unwrap();
//!
//! let back = receiver.decode(&wire).unwrap();
//! assert_eq!(back.payload(), &[1, 2, 3, 4]);
//! assert_eq!(back.ext_client_volume(&receiver), Some((true, -12)));
//!
//! // The relay's view of the original header.
//! let ohb = back.ohb().unwrap();
//! assert_eq!(ohb.sequence_number, Some(22));
//! ```
//!
//! # Ordering
//!
//! Decode derives keys from the receiving session's own index, not from the
//! packet. The transport must deliver packets in order and the receiving side
//! is responsible for moving its session along.

#![forbid(unsafe_code)]
#![allow(clippy::new_without_default)]
#![allow(clippy::manual_range_contains)]
#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod crypto;

pub mod kdf;

#[path = "rtp/mod.rs"]
mod rtp_;

/// RTP packets, header extensions and trailers.
pub mod rtp {
    pub use crate::rtp_::{decode_audio_level, encode_audio_level};
    pub use crate::rtp_::{EktField, Ohb, RtpPacket, DEFAULT_MTU, RTP_HEADER_LEN};
    pub use crate::rtp_::{Extension, ExtensionMap, MAX_ID_ONE_BYTE_FORM, MAX_LEN_ONE_BYTE_FORM};
    pub use crate::rtp_::{Pt, RtpError, SeqNo, Ssrc};
}

mod session;
pub use session::RtpSession;

mod config;
pub use config::SessionConfig;

/// Various error types.
pub mod error {
    pub use crate::crypto::CryptoError;
    pub use crate::rtp_::RtpError;
}

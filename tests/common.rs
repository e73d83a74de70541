#![allow(unused)]
use std::sync::Once;

use perc_srtp::rtp::RtpPacket;
use perc_srtp::{RtpSession, SessionConfig};

pub const MASTER_KEY: [u8; 16] = [
    0xE1, 0xF9, 0x7A, 0x0D, 0x3E, 0x01, 0x8B, 0xE0, //
    0xD6, 0x4F, 0xA3, 0x2C, 0x06, 0xDE, 0x41, 0x39,
];

pub const MASTER_SALT: [u8; 14] = [
    0x0E, 0xC6, 0x75, 0xAD, 0x49, 0x8A, 0xFE, //
    0xEB, 0xB6, 0x96, 0x0B, 0x3A, 0xAB, 0xE6,
];

/// Sender and receiver starting at the same index.
pub fn session_pair(config: SessionConfig) -> (RtpSession, RtpSession) {
    let tx = config.build().expect("sender session");
    let rx = config.build().expect("receiver session");
    (tx, rx)
}

pub fn config(seq: u16) -> SessionConfig {
    SessionConfig::new()
        .set_srtp_key(&MASTER_KEY, &MASTER_SALT)
        .set_initial_seq(seq)
}

pub fn audio_packet(seq: u16, payload: &[u8]) -> RtpPacket {
    RtpPacket::new(payload, 111.into(), seq, seq as u32 * 960, 42.into())
}

pub fn init_log() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    static START: Once = Once::new();

    START.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(env_filter)
            .init();
    });
}

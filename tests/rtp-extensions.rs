use perc_srtp::rtp::{Extension, ExtensionMap, RtpError, RtpPacket};
use perc_srtp::{RtpSession, SessionConfig};

mod common;
use common::{config, init_log, session_pair};

const AUDIO_LEVEL: &str = "urn:ietf:params:rtp-hdrext:ssrc-audio-level";

#[test]
pub fn general_ext_example() {
    init_log();

    let mut p = RtpPacket::new(&[1, 2, 3, 4], 8.into(), 22, 33, 44.into());

    p.set_general_ext(9, &[0xA, 0xB, 0xC]).unwrap();
    p.set_payload(&[200, 11, 12, 13]);

    assert_eq!(p.get_general_ext(9), Some(&[0xA, 0xB, 0xC][..]));
    assert_eq!(p.get_general_ext(1), None);
}

#[test]
pub fn client_volume_via_session_map() {
    init_log();

    let mut session = RtpSession::new();
    session.set_ext_map(11, AUDIO_LEVEL).unwrap();

    let mut p = RtpPacket::new(&[1, 2, 3, 4], 8.into(), 22, 33, 44.into());
    p.set_ext_client_volume(&session, true, -12).unwrap();
    p.set_payload(&[200, 11, 12, 13]);

    assert_eq!(p.ext_client_volume(&session), Some((true, -12)));

    // Rebinding the URI moves where the level is looked up.
    session.set_ext_map(3, AUDIO_LEVEL).unwrap();
    assert_eq!(p.ext_client_volume(&session), None);
    assert_eq!(session.ext_map().lookup(11), None);
}

#[test]
pub fn set_ext_map_one_byte_only() {
    init_log();

    let mut session = RtpSession::new();
    assert!(session.set_ext_map(14, AUDIO_LEVEL).is_ok());

    for id in [15, 16, 200] {
        assert!(matches!(
            session.set_ext_map(id, AUDIO_LEVEL),
            Err(RtpError::TwoByteExtensionUnsupported(x)) if x == id
        ));
    }

    assert_eq!(session.ext_map().lookup(14), Some(&Extension::AudioLevel));
}

#[test]
pub fn extensions_survive_protection() -> Result<(), RtpError> {
    init_log();

    let mut exts = ExtensionMap::empty();
    exts.set(1, Extension::AudioLevel)?;
    exts.set(4, Extension::from_uri("urn:ietf:params:rtp-hdrext:sdes:mid"))?;

    let config = config(40).set_extension_map(exts);
    let (mut tx, rx) = session_pair(config);

    let mut p = RtpPacket::new(&[0xff; 20], 111.into(), 1, 960, 42.into());
    p.set_ext_client_volume(&tx, false, -90)?;
    p.set_general_ext(4, b"audio0")?;
    p.set_general_ext(14, &[0; 16])?;

    let wire = tx.encode(&mut p)?;

    // Extensions are authenticated, not encrypted.
    assert_eq!(&wire[12..14], &[0xbe, 0xde]);

    let back = rx.decode(&wire)?;
    assert_eq!(back.ext_client_volume(&rx), Some((false, -90)));
    assert_eq!(back.get_general_ext(4), Some(&b"audio0"[..]));
    assert_eq!(back.get_general_ext(14), Some(&[0; 16][..]));
    assert_eq!(back.general_exts().len(), 3);
    assert_eq!(back.payload(), &[0xff; 20][..]);

    Ok(())
}

#[test]
pub fn parse_packet_from_wire() {
    init_log();

    // One byte form with padding between entries, as browsers send it.
    let buf = [
        0x90, 0x6f, 0x00, 0x05, 0x00, 0x00, 0x03, 0xc0, //
        0x00, 0x00, 0x00, 0x2a, 0xbe, 0xde, 0x00, 0x02, //
        0x10, 0xaa, 0x00, 0x00, 0x31, 0x01, 0x02, 0x00, //
        0xde, 0xad,
    ];

    let session = SessionConfig::new()
        .set_extension(1, AUDIO_LEVEL)
        .build()
        .unwrap();

    let p = RtpPacket::parse(&buf).unwrap();
    assert_eq!(p.payload_type(), 111.into());
    assert_eq!(p.sequence_number(), 5);
    assert_eq!(p.timestamp(), 960);
    assert_eq!(p.ssrc(), 42.into());
    assert_eq!(p.header_len(), 24);
    assert_eq!(p.ext_client_volume(&session), Some((true, -42)));
    assert_eq!(p.get_general_ext(3), Some(&[0x01, 0x02][..]));
    assert_eq!(p.payload(), &[0xde, 0xad]);
}

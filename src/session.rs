use crate::crypto::{rtp_iv, AeadAesGcm};
use crate::kdf::{Kdf, SrtpProfile};
use crate::rtp::{EktField, Extension, ExtensionMap, Ohb, RtpError, RtpPacket, SeqNo};

/// SRTP session for one media stream.
///
/// Owns the `(roc, seq)` packet index and the key derivation bound to the
/// master key. [`RtpSession::encode()`] advances the index, decode never
/// touches it, which means sender and receiver must see packets in order.
///
/// ```
/// use perc_srtp::rtp::RtpPacket;
/// use perc_srtp::SessionConfig;
///
/// let config = SessionConfig::new()
///     .set_srtp_key(&[0; 16], &[0; 14])
///     .set_initial_seq(22);
///
/// let mut tx = config.build().unwrap();
/// let rx = config.build().unwrap();
///
/// let mut packet = RtpPacket::new(&[1, 2, 3, 4], 8.into(), 99, 33, 44.into());
/// let wire = tx.encode(&mut packet).unwrap();
///
/// let back = rx.decode(&wire).unwrap();
/// assert_eq!(back.payload(), &[1, 2, 3, 4]);
/// assert_eq!(back.ohb().unwrap().sequence_number, Some(99));
/// ```
#[derive(Debug)]
pub struct RtpSession {
    exts: ExtensionMap,
    kdf: Option<Kdf>,
    profile: SrtpProfile,
    seq: u16,
    roc: u32,
}

impl RtpSession {
    /// Session with a random initial sequence number in `0..=0x7fff`.
    ///
    /// No key is set, see [`RtpSession::set_srtp_key()`].
    pub fn new() -> Self {
        RtpSession {
            exts: ExtensionMap::empty(),
            kdf: None,
            profile: SrtpProfile::AeadAes128Gcm,
            seq: fastrand::u16(..) & 0x7fff,
            roc: 0,
        }
    }

    /// Bind the session to a master key and salt.
    ///
    /// The key must be 16 or 32 bytes, the salt at most 16 and is zero
    /// padded to 14.
    pub fn set_srtp_key(&mut self, master_key: &[u8], master_salt: &[u8]) -> Result<(), RtpError> {
        let kdf = Kdf::new(master_key, master_salt)?;
        debug!("Set SRTP master key ({} bytes) for {}", master_key.len(), self.profile);
        self.kdf = Some(kdf);
        Ok(())
    }

    /// The AEAD profile keys are derived for.
    pub fn srtp_profile(&self) -> SrtpProfile {
        self.profile
    }

    /// Select the AEAD profile. This decides the derived session key length.
    pub fn set_srtp_profile(&mut self, profile: SrtpProfile) {
        self.profile = profile;
    }

    /// Map a one byte extension id to a URI.
    ///
    /// Ids above 14 fail with [`RtpError::TwoByteExtensionUnsupported`].
    pub fn set_ext_map(&mut self, id: u8, uri: &str) -> Result<(), RtpError> {
        self.exts.set(id, Extension::from_uri(uri))
    }

    /// The one byte extension ids of this session.
    pub fn ext_map(&self) -> &ExtensionMap {
        &self.exts
    }

    /// Sequence number the next encoded packet gets.
    pub fn seq(&self) -> u16 {
        self.seq
    }

    pub(crate) fn set_seq(&mut self, seq: u16) {
        self.seq = seq;
    }

    /// Rollover counter.
    pub fn roc(&self) -> u32 {
        self.roc
    }

    pub(crate) fn set_roc(&mut self, roc: u32) {
        self.roc = roc;
    }

    /// The 48 bit SRTP index `roc << 16 | seq`.
    pub fn index(&self) -> SeqNo {
        SeqNo::from_roc_seq(self.roc, self.seq)
    }

    /// Protect an outgoing packet.
    ///
    /// The packet's payload type, sequence number and marker are kept in its
    /// OHB and the sequence number is replaced by the session's. On error
    /// neither the packet nor the session counters change.
    pub fn encode(&mut self, packet: &mut RtpPacket) -> Result<Vec<u8>, RtpError> {
        let kdf = self.kdf.as_ref().ok_or(RtpError::NoSrtpKey)?;

        let ohb = Ohb::new(packet.payload_type(), packet.sequence_number(), packet.marker());

        let index = self.index();
        let (key, salt) = kdf.derive_for_stream(self.profile, *index);
        let cipher = AeadAesGcm::new(&key)?;
        let iv = rtp_iv(&salt, *packet.ssrc(), self.roc, self.seq);

        let wire = packet.protect(self.seq, &ohb, &cipher, &iv)?;

        trace!(
            "Encode SRTP {} seq {} -> {} len {}",
            packet.ssrc(),
            packet.sequence_number(),
            self.seq,
            wire.len()
        );

        packet.set_seq(self.seq);
        packet.set_ohb(Some(ohb));

        self.advance();

        Ok(wire)
    }

    /// Step the index as if a packet was encoded.
    ///
    /// Decode leaves the index alone, a receiver calls this once a packet
    /// has been accepted to stay in step with the sender.
    pub fn advance(&mut self) {
        let next = self.index().next();
        if *next == 0 {
            warn!("SRTP index exhausted, the session must be rekeyed");
        }
        self.roc = next.roc();
        self.seq = next.seq();
    }

    /// Unprotect an incoming packet.
    ///
    /// Keys are derived from the session's current index, not from the
    /// packet. The session is unchanged, a failed decode can be followed by
    /// another.
    pub fn decode(&self, wire: &[u8]) -> Result<RtpPacket, RtpError> {
        let (ekt, ekt_len) = EktField::parse_at_end(wire)?;
        let protected = &wire[..wire.len() - ekt_len];

        let kdf = self.kdf.as_ref().ok_or(RtpError::NoSrtpKey)?;

        let mut packet = RtpPacket::parse(protected)?;

        let (key, salt) = kdf.derive_for_stream(self.profile, *self.index());
        let cipher = AeadAesGcm::new(&key)?;
        let iv = rtp_iv(&salt, *packet.ssrc(), self.roc, packet.sequence_number());

        packet.unprotect(&cipher, &iv)?;
        packet.set_ekt(ekt);

        trace!(
            "Decode SRTP {} seq {} len {}",
            packet.ssrc(),
            packet.sequence_number(),
            wire.len()
        );

        Ok(packet)
    }

    /// RTCP receiver reports are not produced by this session.
    pub fn new_rtcp_rr(&self) -> Option<RtpPacket> {
        None
    }
}

impl Default for RtpSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::SessionConfig;

    fn pair(seq: u16, roc: u32) -> (RtpSession, RtpSession) {
        let config = SessionConfig::new()
            .set_srtp_key(&[0; 16], &[0; 14])
            .set_initial_seq(seq)
            .set_initial_roc(roc);
        (config.build().unwrap(), config.build().unwrap())
    }

    fn packet() -> RtpPacket {
        RtpPacket::new(&[1, 2, 3, 4], 8.into(), 22, 33, 44.into())
    }

    #[test]
    fn new_seq_high_bit_clear() {
        for _ in 0..100 {
            let s = RtpSession::new();
            assert!(s.seq() <= 0x7fff);
            assert_eq!(s.roc(), 0);
        }
    }

    #[test]
    fn round_trip() {
        let (mut tx, rx) = pair(1000, 0);

        let mut p = packet();
        p.set_marker(true);
        p.set_general_ext(9, &[0xa, 0xb, 0xc]).unwrap();

        let wire = tx.encode(&mut p).unwrap();
        assert_eq!(p.sequence_number(), 1000);
        assert_eq!(p.ohb(), Some(&Ohb::new(8.into(), 22, true)));

        // header 20, payload 4, ohb 4, tag 16, ekt 1
        assert_eq!(wire.len(), 20 + 4 + 4 + 16 + 1);
        assert_eq!(wire[wire.len() - 1], 0);

        let back = rx.decode(&wire).unwrap();
        let ohb = back.ohb().unwrap();
        assert_eq!(ohb.payload_type, Some(8.into()));
        assert_eq!(ohb.sequence_number, Some(22));
        assert_eq!(ohb.marker, Some(true));
        assert_eq!(back.sequence_number(), 1000);
        assert_eq!(back.payload(), &[1, 2, 3, 4]);
        assert_eq!(back.get_general_ext(9), Some(&[0xa, 0xb, 0xc][..]));
        assert_eq!(back.ekt(), &EktField::Short);

        assert_eq!(tx.seq(), 1001);
        assert_eq!(rx.seq(), 1000);
    }

    #[test]
    fn seq_and_roc_advance() {
        let seq0 = 0xfff0_u16;
        let (mut tx, _) = pair(seq0, 0);

        for n in 1..=40_u64 {
            tx.encode(&mut packet()).unwrap();
            let expected = seq0 as u64 + n;
            assert_eq!(tx.roc() as u64, expected >> 16);
            assert_eq!(tx.seq() as u64, expected & 0xffff);
            assert_eq!(*tx.index(), expected);
        }
    }

    #[test]
    fn roc_wraps() {
        let (mut tx, _) = pair(0xffff, u32::MAX);
        tx.encode(&mut packet()).unwrap();
        assert_eq!(tx.seq(), 0);
        assert_eq!(tx.roc(), 0);
    }

    #[test]
    fn decode_invalid_ekt() {
        let (_, rx) = pair(0, 0);
        let mut wire = vec![0x80, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2];
        wire.push(0x07);

        assert!(matches!(rx.decode(&wire), Err(RtpError::InvalidEktField)));
        assert!(matches!(rx.decode(&[]), Err(RtpError::InvalidEktField)));
    }

    #[test]
    fn mtu_boundary() {
        let (mut tx, _) = pair(5, 0);

        // header 12, payload 4, ohb 4, tag 16
        let mut p = packet();
        p.set_mtu(12 + 4 + 4 + 16);

        let err = tx.encode(&mut p).unwrap_err();
        assert!(matches!(err, RtpError::EktTooLargeForMtu { len: 37, mtu: 36 }));

        // failed encode consumes nothing
        assert_eq!(tx.seq(), 5);
        assert_eq!(p.sequence_number(), 22);
        assert_eq!(p.ohb(), None);

        p.set_mtu(37);
        assert_eq!(tx.encode(&mut p).unwrap().len(), 37);
        assert_eq!(tx.seq(), 6);
    }

    #[test]
    fn no_key() {
        let mut s = RtpSession::new();
        assert!(matches!(s.encode(&mut packet()), Err(RtpError::NoSrtpKey)));
        assert!(matches!(s.decode(&[0x80, 0]), Err(RtpError::NoSrtpKey)));
    }

    #[test]
    fn tampered_fails_without_desync() {
        let (mut tx, rx) = pair(7, 0);

        let wire = tx.encode(&mut packet()).unwrap();

        let mut bad = wire.clone();
        bad[12] ^= 1;
        assert!(matches!(rx.decode(&bad), Err(RtpError::Unprotect(_))));

        // header is authenticated too
        let mut bad = wire.clone();
        bad[5] ^= 1;
        assert!(matches!(rx.decode(&bad), Err(RtpError::Unprotect(_))));

        assert!(rx.decode(&wire).is_ok());
    }

    #[test]
    fn wrong_index_fails() {
        let (mut tx, _) = pair(7, 0);
        let (_, rx) = pair(8, 0);

        let wire = tx.encode(&mut packet()).unwrap();
        assert!(matches!(rx.decode(&wire), Err(RtpError::Unprotect(_))));
    }

    #[test]
    fn set_ext_map_limits() {
        let mut s = RtpSession::new();
        assert!(s.set_ext_map(14, "urn:ietf:params:rtp-hdrext:ssrc-audio-level").is_ok());
        assert!(matches!(
            s.set_ext_map(15, "urn:ietf:params:rtp-hdrext:toffset"),
            Err(RtpError::TwoByteExtensionUnsupported(15))
        ));
        assert_eq!(s.ext_map().id_of(&Extension::AudioLevel), Some(14));
    }

    #[test]
    fn bad_master_key() {
        let mut s = RtpSession::new();
        assert!(matches!(s.set_srtp_key(&[0; 20], &[]), Err(RtpError::Crypto(_))));
    }
}

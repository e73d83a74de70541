#![allow(clippy::unusual_byte_groupings)]

use std::ops::Range;

use super::ext::{parse_one_byte, write_one_byte, ExtensionsForm};
use super::ext::{MAX_ID_ONE_BYTE_FORM, MAX_LEN_ONE_BYTE_FORM};
use super::{decode_audio_level, encode_audio_level};
use super::{EktField, Extension, Ohb, Pt, RtpError, Ssrc};
use crate::crypto::{AeadAesGcm, RtpIv};
use crate::RtpSession;

/// Fixed part of the RTP header.
pub const RTP_HEADER_LEN: usize = 12;

/// MTU used unless set with [`RtpPacket::set_mtu()`].
pub const DEFAULT_MTU: usize = 1500;

/// An RTP packet.
///
/// Holds the header (including CSRCs and the extension block) and payload as
/// one buffer. The OHB and EKT trailer are kept beside it and only become
/// bytes when the packet is protected by [`RtpSession::encode()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    buf: Vec<u8>,
    mtu: usize,
    ohb: Option<Ohb>,
    ekt: EktField,
}

// Where the extension block sits in the buffer.
struct ExtBlock {
    profile: [u8; 2],
    // Block including the 4 byte profile/length preamble.
    outer: Range<usize>,
    // Entries, after the preamble.
    body: Range<usize>,
}

impl RtpPacket {
    /// Create a packet with no CSRCs and no extensions.
    ///
    /// The payload type is masked to 7 bits.
    pub fn new(payload: &[u8], payload_type: Pt, sequence_number: u16, timestamp: u32, ssrc: Ssrc) -> Self {
        let mut buf = Vec::with_capacity(RTP_HEADER_LEN + payload.len());

        buf.push(0b10_0_0_0000);
        buf.push(*payload_type & 0b0111_1111);
        buf.extend_from_slice(&sequence_number.to_be_bytes());
        buf.extend_from_slice(&timestamp.to_be_bytes());
        buf.extend_from_slice(&ssrc.to_be_bytes());
        buf.extend_from_slice(payload);

        RtpPacket {
            buf,
            mtu: DEFAULT_MTU,
            ohb: None,
            ekt: EktField::default(),
        }
    }

    /// Parse a plain RTP packet.
    pub fn parse(buf: &[u8]) -> Result<Self, RtpError> {
        parse_header_len(buf)?;

        Ok(RtpPacket {
            buf: buf.to_vec(),
            mtu: DEFAULT_MTU,
            ohb: None,
            ekt: EktField::default(),
        })
    }

    /// Header and payload as bytes. Does not include OHB or EKT.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Always 2
    pub fn version(&self) -> u8 {
        self.buf[0] >> 6
    }

    /// Whether the padding bit is set.
    pub fn has_padding(&self) -> bool {
        self.buf[0] & 0b0010_0000 > 0
    }

    /// Whether there is a header extension block.
    pub fn has_extension(&self) -> bool {
        self.buf[0] & 0b0001_0000 > 0
    }

    /// Number of contributing sources.
    pub fn csrc_count(&self) -> usize {
        (self.buf[0] & 0b0000_1111) as usize
    }

    /// The contributing sources.
    pub fn csrc(&self) -> Vec<u32> {
        self.buf[RTP_HEADER_LEN..self.csrc_end()]
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// For video the last packet of a frame, for audio the start of a talkspurt.
    pub fn marker(&self) -> bool {
        self.buf[1] & 0b1000_0000 > 0
    }

    /// Payload type, 7 bits.
    pub fn payload_type(&self) -> Pt {
        (self.buf[1] & 0b0111_1111).into()
    }

    /// The sequence number as written in the header.
    pub fn sequence_number(&self) -> u16 {
        u16::from_be_bytes([self.buf[2], self.buf[3]])
    }

    /// RTP timestamp.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]])
    }

    /// Synchronization source.
    pub fn ssrc(&self) -> Ssrc {
        u32::from_be_bytes([self.buf[8], self.buf[9], self.buf[10], self.buf[11]]).into()
    }

    /// Length of the header including CSRCs and extensions.
    pub fn header_len(&self) -> usize {
        self.ext_block().map(|e| e.outer.end).unwrap_or_else(|| self.csrc_end())
    }

    /// Everything after the header.
    pub fn payload(&self) -> &[u8] {
        &self.buf[self.header_len()..]
    }

    /// Maximum size of the packet on the wire.
    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Original header values. Set by encode and decode.
    pub fn ohb(&self) -> Option<&Ohb> {
        self.ohb.as_ref()
    }

    /// EKT trailer. Written by encode, read by decode.
    pub fn ekt(&self) -> &EktField {
        &self.ekt
    }

    /// Replace the payload, keeping the header.
    pub fn set_payload(&mut self, payload: &[u8]) {
        let header_len = self.header_len();
        self.buf.truncate(header_len);
        self.buf.extend_from_slice(payload);
    }

    /// Set the marker bit.
    pub fn set_marker(&mut self, marker: bool) {
        if marker {
            self.buf[1] |= 0b1000_0000;
        } else {
            self.buf[1] &= 0b0111_1111;
        }
    }

    /// Set the payload type. Fails for values above 127.
    pub fn set_payload_type(&mut self, pt: Pt) -> Result<(), RtpError> {
        if *pt > 127 {
            return Err(RtpError::InvalidPayloadType(*pt));
        }
        self.buf[1] = (self.buf[1] & 0b1000_0000) | *pt;
        Ok(())
    }

    /// Set the header sequence number.
    pub fn set_seq(&mut self, seq: u16) {
        self.buf[2..4].copy_from_slice(&seq.to_be_bytes());
    }

    /// Set the RTP timestamp.
    pub fn set_timestamp(&mut self, timestamp: u32) {
        self.buf[4..8].copy_from_slice(&timestamp.to_be_bytes());
    }

    /// Set the synchronization source.
    pub fn set_ssrc(&mut self, ssrc: Ssrc) {
        self.buf[8..12].copy_from_slice(&ssrc.to_be_bytes());
    }

    /// Set the maximum protected size, EKT trailer included.
    pub fn set_mtu(&mut self, mtu: usize) {
        self.mtu = mtu;
    }

    /// Set the original header values.
    pub fn set_ohb(&mut self, ohb: Option<Ohb>) {
        self.ohb = ohb;
    }

    /// Set the EKT trailer written by encode.
    pub fn set_ekt(&mut self, ekt: EktField) {
        self.ekt = ekt;
    }

    /// Value of the one byte form extension `id`.
    pub fn get_general_ext(&self, id: u8) -> Option<&[u8]> {
        self.general_exts()
            .into_iter()
            .find(|(i, _)| *i == id)
            .map(|(_, v)| v)
    }

    /// All one byte form extensions in order of appearance.
    pub fn general_exts(&self) -> Vec<(u8, &[u8])> {
        let Some(block) = self.ext_block() else {
            return vec![];
        };

        if ExtensionsForm::parse(block.profile) != Some(ExtensionsForm::OneByte) {
            return vec![];
        }

        let body = &self.buf[block.body];

        parse_one_byte(body)
            .0
            .into_iter()
            .map(|(id, r)| (id, &body[r]))
            .collect()
    }

    /// Insert or replace the one byte form extension `id`.
    ///
    /// The block is rewritten in full. A received block that ends in an id 15
    /// element or a truncated value can't be rewritten without losing data and
    /// fails with [`RtpError::ParseHeader`].
    pub fn set_general_ext(&mut self, id: u8, data: &[u8]) -> Result<(), RtpError> {
        if id > MAX_ID_ONE_BYTE_FORM {
            return Err(RtpError::TwoByteExtensionUnsupported(id));
        }
        if id == 0 {
            return Err(RtpError::InvalidExtensionId(id));
        }
        if data.is_empty() || data.len() > MAX_LEN_ONE_BYTE_FORM {
            return Err(RtpError::InvalidExtensionLength(data.len()));
        }

        let mut entries = self.owned_exts(id)?;

        if let Some(e) = entries.iter_mut().find(|(i, _)| *i == id) {
            e.1 = data.to_vec();
        } else {
            entries.push((id, data.to_vec()));
        }

        self.write_exts(&entries);

        Ok(())
    }

    /// Remove the one byte form extension `id`, returning its value.
    ///
    /// The extension block is dropped when the last entry goes. Returns `None`
    /// if the block can't be rewritten, see [`RtpPacket::set_general_ext()`].
    pub fn remove_general_ext(&mut self, id: u8) -> Option<Vec<u8>> {
        let mut entries = self.owned_exts(id).ok()?;
        let pos = entries.iter().position(|(i, _)| *i == id)?;
        let (_, value) = entries.remove(pos);

        self.write_exts(&entries);

        Some(value)
    }

    /// Write the RFC 6464 audio level under the id the session maps it to.
    pub fn set_ext_client_volume(
        &mut self,
        session: &RtpSession,
        voice_activity: bool,
        dbov: i8,
    ) -> Result<(), RtpError> {
        let id = session
            .ext_map()
            .id_of(&Extension::AudioLevel)
            .ok_or_else(|| RtpError::ExtensionNotMapped(Extension::AudioLevel.as_uri().to_string()))?;

        self.set_general_ext(id, &[encode_audio_level(voice_activity, dbov)])
    }

    /// Read the RFC 6464 audio level as `(voice_activity, dbov)`.
    pub fn ext_client_volume(&self, session: &RtpSession) -> Option<(bool, i8)> {
        let id = session.ext_map().id_of(&Extension::AudioLevel)?;
        let v = self.get_general_ext(id)?;
        Some(decode_audio_level(*v.first()?))
    }

    /// AEAD protect. Returns header ‖ ciphertext ‖ tag ‖ EKT with `seq` in the
    /// header and `ohb` appended to the plaintext. The packet itself is left as is.
    pub(crate) fn protect(&self, seq: u16, ohb: &Ohb, cipher: &AeadAesGcm, iv: &RtpIv) -> Result<Vec<u8>, RtpError> {
        let header_len = self.header_len();

        let mut header = self.buf[..header_len].to_vec();
        header[2..4].copy_from_slice(&seq.to_be_bytes());

        let mut plain = Vec::with_capacity(self.buf.len() - header_len + ohb.len());
        plain.extend_from_slice(&self.buf[header_len..]);
        ohb.write_to(&mut plain);

        let encrypted = cipher.encrypt(iv, &header, &plain)?;

        let len = header_len + encrypted.len() + self.ekt.len();
        if len > self.mtu {
            return Err(RtpError::EktTooLargeForMtu { len, mtu: self.mtu });
        }

        let mut out = header;
        out.reserve(len - header_len);
        out.extend_from_slice(&encrypted);
        self.ekt.write_to(&mut out)?;

        Ok(out)
    }

    /// AEAD unprotect a packet parsed from header ‖ ciphertext ‖ tag. Strips
    /// the OHB from the plaintext into [`RtpPacket::ohb()`].
    pub(crate) fn unprotect(&mut self, cipher: &AeadAesGcm, iv: &RtpIv) -> Result<(), RtpError> {
        let header_len = self.header_len();
        let (header, encrypted) = self.buf.split_at(header_len);

        let mut plain = cipher.decrypt(iv, header, encrypted).map_err(RtpError::Unprotect)?;

        let (ohb, ohb_len) = Ohb::parse_at_end(&plain)?;
        plain.truncate(plain.len() - ohb_len);

        self.buf.truncate(header_len);
        self.buf.extend_from_slice(&plain);
        self.ohb = Some(ohb);

        Ok(())
    }

    fn csrc_end(&self) -> usize {
        RTP_HEADER_LEN + 4 * self.csrc_count()
    }

    // Lengths are checked by parse() and kept consistent by write_exts().
    fn ext_block(&self) -> Option<ExtBlock> {
        if !self.has_extension() {
            return None;
        }

        let start = self.csrc_end();
        let b = &self.buf[start..];
        let words = u16::from_be_bytes([b[2], b[3]]) as usize;
        let end = start + 4 + words * 4;

        Some(ExtBlock {
            profile: [b[0], b[1]],
            outer: start..end,
            body: (start + 4)..end,
        })
    }

    // Copy of the current entries for rewriting. `id` is only for the error.
    fn owned_exts(&self, id: u8) -> Result<Vec<(u8, Vec<u8>)>, RtpError> {
        let Some(block) = self.ext_block() else {
            return Ok(vec![]);
        };

        match ExtensionsForm::parse(block.profile) {
            Some(ExtensionsForm::OneByte) => {}
            Some(ExtensionsForm::TwoByte) => {
                return Err(RtpError::TwoByteExtensionUnsupported(id));
            }
            None => {
                trace!("Not rewriting RTP extension profile: {:02x?}", block.profile);
                return Err(RtpError::ParseHeader);
            }
        }

        let body = &self.buf[block.body];
        let (entries, complete) = parse_one_byte(body);

        if !complete {
            trace!("Not rewriting partially parsed RTP extension block");
            return Err(RtpError::ParseHeader);
        }

        Ok(entries
            .into_iter()
            .map(|(i, r)| (i, body[r].to_vec()))
            .collect())
    }

    fn write_exts(&mut self, entries: &[(u8, Vec<u8>)]) {
        let start = self.csrc_end();
        let end = self.header_len();

        if entries.is_empty() {
            self.buf.drain(start..end);
            self.buf[0] &= 0b1110_1111;
            return;
        }

        let refs: Vec<(u8, &[u8])> = entries.iter().map(|(i, v)| (*i, v.as_slice())).collect();
        let body = write_one_byte(&refs);

        let mut block = Vec::with_capacity(4 + body.len());
        block.extend_from_slice(&ExtensionsForm::OneByte.serialize());
        block.extend_from_slice(&((body.len() / 4) as u16).to_be_bytes());
        block.extend_from_slice(&body);

        self.buf.splice(start..end, block);
        self.buf[0] |= 0b0001_0000;
    }
}

// Validate the header and return its length.
fn parse_header_len(buf: &[u8]) -> Result<usize, RtpError> {
    if buf.len() < RTP_HEADER_LEN {
        trace!("RTP header too short < 12: {}", buf.len());
        return Err(RtpError::ParseHeader);
    }

    let version = (buf[0] & 0b1100_0000) >> 6;
    if version != 2 {
        trace!("RTP version is not 2");
        return Err(RtpError::ParseHeader);
    }

    let has_extension = buf[0] & 0b0001_0000 > 0;
    let csrc_count = (buf[0] & 0b0000_1111) as usize;

    let csrc_end = RTP_HEADER_LEN + 4 * csrc_count;
    if buf.len() < csrc_end {
        trace!("RTP header invalid, not enough csrc");
        return Err(RtpError::ParseHeader);
    }

    if !has_extension {
        return Ok(csrc_end);
    }

    let ext = &buf[csrc_end..];
    if ext.len() < 4 {
        trace!("RTP bad header extension");
        return Err(RtpError::ParseHeader);
    }

    let ext_len = u16::from_be_bytes([ext[2], ext[3]]) as usize * 4;
    if ext.len() - 4 < ext_len {
        trace!("RTP ext len larger than header {} > {}", ext.len() - 4, ext_len);
        return Err(RtpError::ParseHeader);
    }

    Ok(csrc_end + 4 + ext_len)
}

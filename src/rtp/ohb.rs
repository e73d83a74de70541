use super::{Pt, RtpError};

//  Original Header Block, appended to the inner payload.
//
//  https://www.rfc-editor.org/rfc/rfc8723#section-5.2
//
//   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//  |R|     PT      |        Sequence Number        |R R R R B M P Q|
//  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// PT is present if P, Sequence Number if Q. B says the marker is carried in M.

const CONFIG_Q: u8 = 0b0000_0001;
const CONFIG_P: u8 = 0b0000_0010;
const CONFIG_M: u8 = 0b0000_0100;
const CONFIG_B: u8 = 0b0000_1000;

/// Original header values of a packet, carried through a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ohb {
    /// Original payload type.
    pub payload_type: Option<Pt>,
    /// Original sequence number.
    pub sequence_number: Option<u16>,
    /// Original marker bit.
    pub marker: Option<bool>,
}

impl Ohb {
    /// OHB carrying all three fields.
    pub fn new(payload_type: Pt, sequence_number: u16, marker: bool) -> Self {
        Ohb {
            payload_type: Some(payload_type),
            sequence_number: Some(sequence_number),
            marker: Some(marker),
        }
    }

    /// Serialized length in bytes.
    pub fn len(&self) -> usize {
        1 + self.payload_type.map(|_| 1).unwrap_or(0)
            + self.sequence_number.map(|_| 2).unwrap_or(0)
    }

    /// Whether no field is carried. Still serializes to the config byte.
    pub fn is_empty(&self) -> bool {
        self.payload_type.is_none() && self.sequence_number.is_none() && self.marker.is_none()
    }

    fn config(&self) -> u8 {
        let mut c = 0;
        if self.payload_type.is_some() {
            c |= CONFIG_P;
        }
        if self.sequence_number.is_some() {
            c |= CONFIG_Q;
        }
        if let Some(m) = self.marker {
            c |= CONFIG_B;
            if m {
                c |= CONFIG_M;
            }
        }
        c
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        if let Some(pt) = self.payload_type {
            out.push(*pt & 0x7f);
        }
        if let Some(seq) = self.sequence_number {
            out.extend_from_slice(&seq.to_be_bytes());
        }
        out.push(self.config());
    }

    /// Length of the OHB at the end of `buf`, read from the trailing config byte.
    pub(crate) fn len_at_end(buf: &[u8]) -> Result<usize, RtpError> {
        let Some(config) = buf.last() else {
            return Err(RtpError::InvalidOhb);
        };

        if config & 0xf0 != 0 {
            trace!("OHB reserved bits set: {:02x}", config);
            return Err(RtpError::InvalidOhb);
        }

        let len = 1
            + if config & CONFIG_P > 0 { 1 } else { 0 }
            + if config & CONFIG_Q > 0 { 2 } else { 0 };

        if len > buf.len() {
            return Err(RtpError::InvalidOhb);
        }

        Ok(len)
    }

    /// Parse the OHB at the end of `buf`. Returns the OHB and its length.
    pub(crate) fn parse_at_end(buf: &[u8]) -> Result<(Ohb, usize), RtpError> {
        let len = Self::len_at_end(buf)?;
        let ohb = &buf[buf.len() - len..];
        let config = ohb[len - 1];

        let mut i = 0;
        let payload_type = if config & CONFIG_P > 0 {
            i += 1;
            Some((ohb[0] & 0x7f).into())
        } else {
            None
        };
        let sequence_number = if config & CONFIG_Q > 0 {
            let seq = u16::from_be_bytes([ohb[i], ohb[i + 1]]);
            Some(seq)
        } else {
            None
        };
        let marker = if config & CONFIG_B > 0 {
            Some(config & CONFIG_M > 0)
        } else {
            None
        };

        let ohb = Ohb {
            payload_type,
            sequence_number,
            marker,
        };

        Ok((ohb, len))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_full() {
        let mut out = vec![];
        Ohb::new(8.into(), 0x1234, true).write_to(&mut out);
        assert_eq!(out, [8, 0x12, 0x34, 0b0000_1111]);

        let mut out = vec![];
        Ohb::new(111.into(), 22, false).write_to(&mut out);
        assert_eq!(out, [111, 0, 22, 0b0000_1011]);
    }

    #[test]
    fn parse_full() {
        let buf = [1, 2, 3, 8, 0x12, 0x34, 0b0000_1111];
        let (ohb, len) = Ohb::parse_at_end(&buf).unwrap();
        assert_eq!(len, 4);
        assert_eq!(ohb, Ohb::new(8.into(), 0x1234, true));
    }

    #[test]
    fn parse_partial() {
        // only the sequence number
        let buf = [9, 0x00, 0x05, 0b0000_0001];
        let (ohb, len) = Ohb::parse_at_end(&buf).unwrap();
        assert_eq!(len, 3);
        assert_eq!(ohb.sequence_number, Some(5));
        assert_eq!(ohb.payload_type, None);
        assert_eq!(ohb.marker, None);

        // only the marker
        let (ohb, len) = Ohb::parse_at_end(&[0b0000_1100]).unwrap();
        assert_eq!(len, 1);
        assert_eq!(ohb.marker, Some(true));
        assert_eq!(ohb.len(), 1);
    }

    #[test]
    fn parse_invalid() {
        assert!(matches!(Ohb::parse_at_end(&[]), Err(RtpError::InvalidOhb)));
        assert!(matches!(Ohb::parse_at_end(&[0x10]), Err(RtpError::InvalidOhb)));
        // needs 4 bytes, only 2 there
        assert!(matches!(Ohb::parse_at_end(&[0, 0b11]), Err(RtpError::InvalidOhb)));
    }

    #[test]
    fn len_matches_written() {
        for ohb in [
            Ohb::default(),
            Ohb::new(0.into(), 0, false),
            Ohb {
                payload_type: Some(96.into()),
                ..Default::default()
            },
        ] {
            let mut out = vec![];
            ohb.write_to(&mut out);
            assert_eq!(out.len(), ohb.len());
            assert_eq!(Ohb::parse_at_end(&out).unwrap(), (ohb, ohb.len()));
        }
    }
}

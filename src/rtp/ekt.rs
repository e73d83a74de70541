use super::RtpError;

// EKT field trailing the SRTP packet.
//
// https://tools.ietf.org/html/draft-ietf-perc-srtp-ekt-diet-07#section-4.1
//
//  Short form:           Long form:
//  +-+-+-+-+-+-+-+-+     +---------------------+-------------+-+-+-+-+-+-+-+-+
//  |0 0 0 0 0 0 0 0|     | EKT payload ...     | Length (16) |0 0 0 0 0 0 1 0|
//  +-+-+-+-+-+-+-+-+     +---------------------+-------------+-+-+-+-+-+-+-+-+

const EKT_SHORT: u8 = 0x00;
const EKT_FULL: u8 = 0x02;

// length (2) + message type (1)
const EKT_FULL_OVERHEAD: usize = 3;

/// EKT trailer appended after the protected packet.
///
/// Only the framing is handled, the payload is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EktField {
    /// Single `0x00` byte, no key material.
    #[default]
    Short,
    /// Opaque EKT payload.
    Long(Vec<u8>),
}

impl EktField {
    /// Length of the trailer on the wire.
    pub fn len(&self) -> usize {
        match self {
            EktField::Short => 1,
            EktField::Long(p) => p.len() + EKT_FULL_OVERHEAD,
        }
    }

    /// Never true, even the short form occupies one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The opaque payload of a long form field.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            EktField::Short => None,
            EktField::Long(p) => Some(p),
        }
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) -> Result<(), RtpError> {
        match self {
            EktField::Short => out.push(EKT_SHORT),
            EktField::Long(p) => {
                let len = u16::try_from(self.len()).map_err(|_| RtpError::InvalidEktField)?;
                out.extend_from_slice(p);
                out.extend_from_slice(&len.to_be_bytes());
                out.push(EKT_FULL);
            }
        }
        Ok(())
    }

    /// Parse the trailer at the end of `buf`. Returns the field and its length.
    pub(crate) fn parse_at_end(buf: &[u8]) -> Result<(EktField, usize), RtpError> {
        let Some(cmd) = buf.last() else {
            return Err(RtpError::InvalidEktField);
        };

        match *cmd {
            EKT_SHORT => Ok((EktField::Short, 1)),
            EKT_FULL => {
                if buf.len() < EKT_FULL_OVERHEAD {
                    return Err(RtpError::InvalidEktField);
                }
                let l = buf.len();
                let len = u16::from_be_bytes([buf[l - 3], buf[l - 2]]) as usize;

                if len < EKT_FULL_OVERHEAD || len > l {
                    trace!("EKT length out of range: {} (buffer {})", len, l);
                    return Err(RtpError::InvalidEktField);
                }

                let payload = buf[l - len..l - EKT_FULL_OVERHEAD].to_vec();
                Ok((EktField::Long(payload), len))
            }
            _ => {
                trace!("Unknown EKT message type: {}", cmd);
                Err(RtpError::InvalidEktField)
            }
        }
    }
}

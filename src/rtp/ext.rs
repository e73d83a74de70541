use std::fmt;
use std::ops::Range;

use super::RtpError;

/// RTP header extensions.
///
/// Only the client audio level has a meaning to the SRTP pipeline, any other
/// URI is carried as [`Extension::UnknownUri`] and its values are reachable
/// as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Extension {
    /// <urn:ietf:params:rtp-hdrext:ssrc-audio-level>
    ///
    /// Client to mixer audio level, RFC 6464. Read and written by
    /// [`RtpPacket::ext_client_volume()`][crate::rtp::RtpPacket::ext_client_volume].
    AudioLevel,

    /// Not recognized URI.
    UnknownUri(String),
}

/// Mapping of extension URI to our enum
const EXT_URI: &[(Extension, &str)] = &[(
    Extension::AudioLevel,
    "urn:ietf:params:rtp-hdrext:ssrc-audio-level",
)];

impl Extension {
    /// Parses an extension from a URI, as found in an SDP `a=extmap` line.
    pub fn from_uri(uri: &str) -> Self {
        for (t, known) in EXT_URI.iter() {
            if *known == uri {
                return t.clone();
            }
        }

        Extension::UnknownUri(uri.to_string())
    }

    /// Represents the extension as an URI.
    pub fn as_uri(&self) -> &str {
        for (t, known) in EXT_URI.iter() {
            if t == self {
                return known;
            }
        }

        if let Extension::UnknownUri(uri) = self {
            return uri;
        }

        "unknown"
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_uri())
    }
}

// All header extensions in a packet share one "form". We only write the
// one byte form, the two byte form is recognized so it can be rejected.
#[repr(u16)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ExtensionsForm {
    // See RFC 8285 Section 4.2
    // ID Range: 1..=14
    // Length Range: 1..=16
    OneByte = 0xBEDE,
    // See RFC 8285 Section 4.3
    TwoByte = 0x1000,
}

/// Highest id of the one byte form.
pub const MAX_ID_ONE_BYTE_FORM: u8 = 14;
/// Longest value of the one byte form.
pub const MAX_LEN_ONE_BYTE_FORM: usize = 16;

impl ExtensionsForm {
    pub(crate) fn as_u16(self) -> u16 {
        self as u16
    }

    pub(crate) fn serialize(self) -> [u8; 2] {
        self.as_u16().to_be_bytes()
    }

    pub(crate) fn parse(bytes: [u8; 2]) -> Option<Self> {
        let serialized = u16::from_be_bytes(bytes);
        if serialized == ExtensionsForm::OneByte.as_u16() {
            Some(ExtensionsForm::OneByte)
        // Ignore the app bits
        } else if (serialized & 0xFFF0) == ExtensionsForm::TwoByte.as_u16() {
            Some(ExtensionsForm::TwoByte)
        } else {
            None
        }
    }
}

/// Mapping between one byte RTP extension ids and what extension that is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMap([Option<Extension>; MAX_ID_ONE_BYTE_FORM as usize]); // index 0 is extmap:1.

impl ExtensionMap {
    /// Create an empty map.
    pub fn empty() -> Self {
        ExtensionMap(std::array::from_fn(|_| None))
    }

    /// Set a mapping for an extension.
    ///
    /// The id must be in 1..=14. An extension is only mapped once, setting it
    /// under a new id removes the old mapping.
    pub fn set(&mut self, id: u8, ext: Extension) -> Result<(), RtpError> {
        if id > MAX_ID_ONE_BYTE_FORM {
            return Err(RtpError::TwoByteExtensionUnsupported(id));
        }
        if id == 0 {
            return Err(RtpError::InvalidExtensionId(id));
        }

        debug!("Set RTP extension {}: {}", id, ext);
        self.insert(id, ext);

        Ok(())
    }

    fn insert(&mut self, id: u8, ext: Extension) {
        for e in self.0.iter_mut() {
            if e.as_ref() == Some(&ext) {
                *e = None;
            }
        }

        self.0[id as usize - 1] = Some(ext);
    }

    /// Remove the mapping for an id.
    pub fn remove(&mut self, id: u8) -> Option<Extension> {
        if id >= 1 && id <= MAX_ID_ONE_BYTE_FORM {
            self.0[id as usize - 1].take()
        } else {
            None
        }
    }

    /// Look up the extension for the id.
    pub fn lookup(&self, id: u8) -> Option<&Extension> {
        if id >= 1 && id <= MAX_ID_ONE_BYTE_FORM {
            self.0[id as usize - 1].as_ref()
        } else {
            trace!("Lookup RTP extension out of range 1-{}: {}", MAX_ID_ONE_BYTE_FORM, id);
            None
        }
    }

    /// Finds the id for an extension (if mapped).
    ///
    /// The returned id will be 1-based.
    pub fn id_of(&self, e: &Extension) -> Option<u8> {
        self.0
            .iter()
            .position(|x| x.as_ref() == Some(e))
            .map(|p| p as u8 + 1)
    }

    /// Returns an iterator over the elements of the extension map
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Extension)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| ((i + 1) as u8, e)))
    }
}

impl Default for ExtensionMap {
    fn default() -> Self {
        Self::empty()
    }
}

/// Parse the entries of a one byte form extension block.
///
/// `buf` is the block body (after the 0xBEDE profile and length). Returns the
/// id and the range of the value inside `buf`, and whether the whole body was
/// read. Parsing stops early at an id 15 element or a truncated value.
///
/// Elements with id 0 and a non-zero length are skipped, id 0 is reserved
/// for padding.
///
/// https://tools.ietf.org/html/rfc5285#section-4.2
pub(crate) fn parse_one_byte(mut buf: &[u8]) -> (Vec<(u8, Range<usize>)>, bool) {
    let orig_len = buf.len();
    let mut entries = Vec::new();

    loop {
        if buf.is_empty() {
            break;
        }

        if buf[0] == 0 {
            // padding
            buf = &buf[1..];
            continue;
        }

        let id = buf[0] >> 4;
        let len = (buf[0] & 0xf) as usize + 1;
        buf = &buf[1..];

        if id == 15 {
            // If the ID value 15 is
            // encountered, its length field should be ignored, processing of the
            // entire extension should terminate at that point, and only the
            // extension elements present prior to the element with ID 15
            // considered.
            return (entries, false);
        }

        if buf.len() < len {
            trace!("Not enough type ext len: {} < {}", buf.len(), len);
            return (entries, false);
        }

        if id == 0 {
            trace!("Skipping RTP extension with reserved id 0");
        } else {
            let start = orig_len - buf.len();
            entries.push((id, start..(start + len)));
        }

        buf = &buf[len..];
    }

    (entries, true)
}

/// Write a one byte form extension block body, padded to 4 bytes.
pub(crate) fn write_one_byte(entries: &[(u8, &[u8])]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.iter().map(|(_, v)| 1 + v.len()).sum::<usize>() + 3);

    for (id, value) in entries {
        debug_assert!(*id >= 1 && *id <= MAX_ID_ONE_BYTE_FORM);
        debug_assert!(!value.is_empty() && value.len() <= MAX_LEN_ONE_BYTE_FORM);

        out.push(id << 4 | (value.len() as u8 - 1));
        out.extend_from_slice(value);
    }

    let pad = (4 - out.len() % 4) % 4;
    out.resize(out.len() + pad, 0);

    out
}

/// Encode the RFC 6464 audio level byte.
///
/// `dbov` is clamped to -127..=0.
pub fn encode_audio_level(voice_activity: bool, dbov: i8) -> u8 {
    let level = (-(dbov as i16)).clamp(0, 127) as u8;
    if voice_activity {
        0x80 | level
    } else {
        level
    }
}

/// Decode the RFC 6464 audio level byte into voice activity and dBov.
pub fn decode_audio_level(v: u8) -> (bool, i8) {
    (v & 0x80 > 0, -((v & 0x7f) as i8))
}

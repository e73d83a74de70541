use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

macro_rules! num_id {
    ($(#[$meta:meta])* $id:ident, $t:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $id($t);

        impl Deref for $id {
            type Target = $t;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<$t> for $id {
            fn from(v: $t) -> Self {
                $id(v)
            }
        }

        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

num_id!(
    /// Synchronization source of a stream.
    Ssrc, u32
);
num_id!(
    /// RTP payload type.
    Pt, u8
);
num_id!(
    /// 48 bit SRTP packet index.
    SeqNo, u64
);

impl Ssrc {
    /// A random SSRC.
    pub fn new() -> Self {
        Ssrc(fastrand::u32(..))
    }
}

impl Default for Ssrc {
    fn default() -> Self {
        Ssrc::new()
    }
}

impl SeqNo {
    /// Compose the 48 bit SRTP packet index.
    ///
    /// https://tools.ietf.org/html/rfc3711#section-3.3.1
    pub fn from_roc_seq(roc: u32, seq: u16) -> Self {
        SeqNo(((roc as u64) << 16) | seq as u64)
    }

    /// The rollover counter part of the index.
    pub fn roc(&self) -> u32 {
        (self.0 >> 16) as u32
    }

    /// The 16 bit RTP sequence number part of the index.
    pub fn seq(&self) -> u16 {
        self.0 as u16
    }

    /// The index after this one. Wraps to 0 past 48 bits.
    pub fn next(&self) -> Self {
        Self((self.0 + 1) & 0xffff_ffff_ffff)
    }
}

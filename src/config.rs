use crate::kdf::SrtpProfile;
use crate::rtp::{Extension, ExtensionMap, RtpError, MAX_ID_ONE_BYTE_FORM};
use crate::RtpSession;

/// Customized config for creating an [`RtpSession`].
///
/// ```
/// use perc_srtp::SessionConfig;
/// use perc_srtp::kdf::SrtpProfile;
///
/// let session = SessionConfig::new()
///     .set_srtp_profile(SrtpProfile::AeadAes256Gcm)
///     .set_srtp_key(&[7; 32], &[1; 14])
///     .set_extension(1, "urn:ietf:params:rtp-hdrext:ssrc-audio-level")
///     .build()
///     .unwrap();
///
/// assert_eq!(session.roc(), 0);
/// ```
///
/// Configs implement [`Clone`] so that both ends of a stream can be built
/// from the same values.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    srtp_profile: SrtpProfile,
    srtp_key: Option<(Vec<u8>, Vec<u8>)>,
    initial_seq: Option<u16>,
    initial_roc: u32,
    exts: ExtensionMap,
    // Validated when building.
    ext_ids: Vec<(u8, Extension)>,
}

impl SessionConfig {
    /// Creates a new default config.
    pub fn new() -> Self {
        SessionConfig::default()
    }

    /// The SRTP profile. Defaults to AEAD AES-128-GCM.
    pub fn srtp_profile(&self) -> SrtpProfile {
        self.srtp_profile
    }

    /// Set the SRTP profile.
    pub fn set_srtp_profile(mut self, profile: SrtpProfile) -> Self {
        self.srtp_profile = profile;
        self
    }

    /// Master key and salt, if set.
    pub fn srtp_key(&self) -> Option<(&[u8], &[u8])> {
        self.srtp_key
            .as_ref()
            .map(|(k, s)| (k.as_slice(), s.as_slice()))
    }

    /// Set the master key and salt.
    ///
    /// Lengths are checked when building the session.
    pub fn set_srtp_key(mut self, master_key: &[u8], master_salt: &[u8]) -> Self {
        self.srtp_key = Some((master_key.to_vec(), master_salt.to_vec()));
        self
    }

    /// Initial sequence number, if set.
    ///
    /// If not specified, a random value in `0..=0x7fff` is used.
    pub fn initial_seq(&self) -> Option<u16> {
        self.initial_seq
    }

    /// Set the sequence number of the first encoded packet.
    pub fn set_initial_seq(mut self, seq: u16) -> Self {
        self.initial_seq = Some(seq);
        self
    }

    /// Initial rollover counter. Defaults to 0.
    pub fn initial_roc(&self) -> u32 {
        self.initial_roc
    }

    /// Set the initial rollover counter.
    pub fn set_initial_roc(mut self, roc: u32) -> Self {
        self.initial_roc = roc;
        self
    }

    /// Map an extension URI to a one byte id.
    ///
    /// Ids outside 1-14 make [`SessionConfig::build()`] fail.
    pub fn set_extension(mut self, id: u8, uri: &str) -> Self {
        self.ext_ids.push((id, Extension::from_uri(uri)));
        self
    }

    /// Replace the extension map. Mappings from
    /// [`SessionConfig::set_extension()`] are applied on top.
    pub fn set_extension_map(mut self, exts: ExtensionMap) -> Self {
        self.exts = exts;
        self
    }

    /// The extension map, including mappings added with
    /// [`SessionConfig::set_extension()`] that are valid.
    pub fn extension_map(&self) -> ExtensionMap {
        let mut exts = self.exts.clone();
        // invalid ids are reported by build()
        let valid = self
            .ext_ids
            .iter()
            .filter(|(id, _)| *id >= 1 && *id <= MAX_ID_ONE_BYTE_FORM);
        for (id, ext) in valid {
            if let Err(e) = exts.set(*id, ext.clone()) {
                trace!("Skipping extension mapping {}: {}", id, e);
            }
        }
        exts
    }

    /// Create a [`RtpSession`] from the configuration.
    pub fn build(&self) -> Result<RtpSession, RtpError> {
        let mut session = RtpSession::new();
        session.set_srtp_profile(self.srtp_profile);

        if let Some(seq) = self.initial_seq {
            session.set_seq(seq);
        }
        session.set_roc(self.initial_roc);

        for (id, ext) in self.exts.iter() {
            session.set_ext_map(id, ext.as_uri())?;
        }
        for (id, ext) in &self.ext_ids {
            session.set_ext_map(*id, ext.as_uri())?;
        }

        if let Some((key, salt)) = &self.srtp_key {
            session.set_srtp_key(key, salt)?;
        }

        Ok(session)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.srtp_profile(), SrtpProfile::AeadAes128Gcm);
        assert_eq!(config.srtp_key(), None);
        assert_eq!(config.initial_seq(), None);
        assert_eq!(config.initial_roc(), 0);

        let mut session = config.build().unwrap();
        assert!(session.seq() <= 0x7fff);
        assert!(matches!(
            session.encode(&mut crate::rtp::RtpPacket::new(&[1], 0.into(), 0, 0, 0.into())),
            Err(RtpError::NoSrtpKey)
        ));
    }

    #[test]
    fn build_applies_values() {
        let session = SessionConfig::new()
            .set_srtp_profile(SrtpProfile::AeadAes256Gcm)
            .set_srtp_key(&[0; 16], &[])
            .set_initial_seq(0x1234)
            .set_initial_roc(9)
            .set_extension_map(audio_level_at(1))
            .set_extension(5, "urn:ietf:params:rtp-hdrext:toffset")
            .build()
            .unwrap();

        assert_eq!(session.srtp_profile(), SrtpProfile::AeadAes256Gcm);
        assert_eq!(session.seq(), 0x1234);
        assert_eq!(session.roc(), 9);
        assert_eq!(*session.index(), (9 << 16) | 0x1234);
        assert_eq!(session.ext_map().id_of(&Extension::AudioLevel), Some(1));
        assert_eq!(
            session.ext_map().id_of(&Extension::from_uri("urn:ietf:params:rtp-hdrext:toffset")),
            Some(5)
        );
    }

    fn audio_level_at(id: u8) -> ExtensionMap {
        let mut exts = ExtensionMap::empty();
        exts.set(id, Extension::AudioLevel).unwrap();
        exts
    }

    #[test]
    fn extension_map_leaves_out_invalid_ids() {
        let config = SessionConfig::new()
            .set_extension_map(audio_level_at(2))
            .set_extension(0, "urn:example:zero")
            .set_extension(15, "urn:example:fifteen")
            .set_extension(14, "urn:example:fourteen");

        let exts = config.extension_map();
        assert_eq!(exts.iter().count(), 2);
        assert_eq!(exts.id_of(&Extension::AudioLevel), Some(2));
        assert_eq!(exts.lookup(14), Some(&Extension::from_uri("urn:example:fourteen")));

        assert!(matches!(
            config.build(),
            Err(RtpError::InvalidExtensionId(0))
        ));
    }

    #[test]
    fn build_fails() {
        let err = SessionConfig::new()
            .set_extension(15, "urn:ietf:params:rtp-hdrext:toffset")
            .build()
            .unwrap_err();
        assert!(matches!(err, RtpError::TwoByteExtensionUnsupported(15)));

        let err = SessionConfig::new()
            .set_srtp_key(&[0; 15], &[0; 14])
            .build()
            .unwrap_err();
        assert!(matches!(err, RtpError::Crypto(_)));
    }
}

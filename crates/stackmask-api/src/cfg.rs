// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Operator-facing profile configuration.
//!
//! A [`ProfileCfg`] is what an operator writes down: an optional
//! preset to start from, and any number of field overrides. It is
//! resolved into a validated [`MutationProfile`] before it gets
//! anywhere near the datapath.
//!
//! ```toml
//! preset = "windows"
//! source_ttl_hint = 64
//! checksum = "full"
//! ```

use crate::preset::OsPreset;
use crate::profile::ChecksumMode;
use crate::profile::MalformedPolicy;
use crate::profile::MutationProfile;
use crate::profile::ProfileError;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileCfg {
    pub preset: Option<OsPreset>,
    pub target_ttl: Option<u8>,
    pub target_window: Option<u16>,
    pub source_ttl_hint: Option<u8>,
    pub target_ident: Option<u16>,
    pub checksum: Option<ChecksumMode>,
    pub malformed: Option<MalformedPolicy>,
}

impl ProfileCfg {
    /// Layer `other` on top of `self`; any field set in `other` wins.
    pub fn merge(self, other: ProfileCfg) -> ProfileCfg {
        ProfileCfg {
            preset: other.preset.or(self.preset),
            target_ttl: other.target_ttl.or(self.target_ttl),
            target_window: other.target_window.or(self.target_window),
            source_ttl_hint: other.source_ttl_hint.or(self.source_ttl_hint),
            target_ident: other.target_ident.or(self.target_ident),
            checksum: other.checksum.or(self.checksum),
            malformed: other.malformed.or(self.malformed),
        }
    }

    /// Resolve into a validated profile.
    ///
    /// Without a preset both `target_ttl` and `target_window` must be
    /// given.
    pub fn resolve(&self) -> Result<MutationProfile, ProfileError> {
        let base = match self.preset {
            Some(preset) => preset.profile(),
            None => {
                let ttl = self
                    .target_ttl
                    .ok_or(ProfileError::MissingField("target_ttl"))?;
                let window = self
                    .target_window
                    .ok_or(ProfileError::MissingField("target_window"))?;
                MutationProfile::new(ttl, window)
            }
        };

        let profile = MutationProfile {
            target_ttl: self.target_ttl.unwrap_or(base.target_ttl),
            target_window: self.target_window.unwrap_or(base.target_window),
            source_ttl_hint: self
                .source_ttl_hint
                .unwrap_or(base.source_ttl_hint),
            target_ident: self.target_ident.unwrap_or(base.target_ident),
            checksum: self.checksum.unwrap_or(base.checksum),
            malformed: self.malformed.unwrap_or(base.malformed),
        };

        profile.validate()?;
        Ok(profile)
    }
}

impl From<OsPreset> for ProfileCfg {
    fn from(preset: OsPreset) -> Self {
        ProfileCfg { preset: Some(preset), ..Default::default() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn preset_with_overrides() {
        let cfg = ProfileCfg {
            source_ttl_hint: Some(64),
            checksum: Some(ChecksumMode::Full),
            ..ProfileCfg::from(OsPreset::Windows)
        };

        let p = cfg.resolve().unwrap();
        assert_eq!(p.target_ttl, 128);
        assert_eq!(p.target_window, 64240);
        assert_eq!(p.source_ttl_hint, 64);
        assert_eq!(p.checksum, ChecksumMode::Full);
        assert_eq!(p.malformed, MalformedPolicy::Pass);
    }

    #[test]
    fn bare_fields_required_without_preset() {
        let cfg = ProfileCfg { target_ttl: Some(128), ..Default::default() };
        assert_eq!(
            cfg.resolve(),
            Err(ProfileError::MissingField("target_window"))
        );

        let cfg = ProfileCfg { target_window: Some(8192), ..cfg };
        assert_eq!(cfg.resolve(), Ok(MutationProfile::new(128, 8192)));
    }

    #[test]
    fn overrides_are_validated() {
        let cfg = ProfileCfg {
            target_ttl: Some(0),
            ..ProfileCfg::from(OsPreset::Linux)
        };
        assert_eq!(cfg.resolve(), Err(ProfileError::ZeroTtl));
    }

    #[test]
    fn merge_prefers_other() {
        let file = ProfileCfg {
            target_window: Some(1024),
            ..ProfileCfg::from(OsPreset::MacOs)
        };
        let cli =
            ProfileCfg { target_window: Some(2048), ..Default::default() };

        let merged = file.merge(cli);
        assert_eq!(merged.preset, Some(OsPreset::MacOs));
        assert_eq!(merged.target_window, Some(2048));
    }

    #[test]
    fn from_toml() {
        let cfg: ProfileCfg = toml::from_str(
            r#"
            preset = "windows"
            source_ttl_hint = 64
            target_ident = 0
            checksum = "full"
            malformed = "drop"
            "#,
        )
        .unwrap();

        let p = cfg.resolve().unwrap();
        assert_eq!(
            p,
            OsPreset::Windows
                .profile()
                .with_source_ttl_hint(64)
                .with_checksum(ChecksumMode::Full)
                .with_malformed(MalformedPolicy::Drop)
        );

        let bad = toml::from_str::<ProfileCfg>("ttl = 12");
        assert!(bad.is_err());
    }
}

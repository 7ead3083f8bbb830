// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The mutation profile and its map-value encoding.
//!
//! A [`MutationProfile`] describes the fingerprint fields of the
//! network stack we want outbound traffic to resemble. The profile is
//! shared with the datapath through a single-slot map whose value is
//! one `u64`; [`MutationProfile::to_raw()`] and
//! [`MutationProfile::from_raw()`] define that layout.
//!
//! ```text
//!  63  62        50 49 48 47        32 31        16 15     8 7      0
//! +---+-----------+--+--+------------+------------+--------+--------+
//! | P | reserved  |MD|CF|   ident    |   window   |  hint  |  ttl   |
//! +---+-----------+--+--+------------+------------+--------+--------+
//! ```
//!
//! * P: a profile is present.
//! * MD: malformed frames are dropped rather than passed.
//! * CF: checksums are fully recomputed rather than incrementally
//!   updated.

use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

/// The key of the one and only entry in the profile map.
pub const PROFILE_MAP_KEY: u32 = 0;

/// The raw value meaning "no profile configured".
pub const PROFILE_RAW_NONE: u64 = 0;

const RAW_TTL_SHIFT: u32 = 0;
const RAW_HINT_SHIFT: u32 = 8;
const RAW_WINDOW_SHIFT: u32 = 16;
const RAW_IDENT_SHIFT: u32 = 32;
const RAW_CSUM_FULL: u64 = 1 << 48;
const RAW_MALFORMED_DROP: u64 = 1 << 49;
const RAW_PRESENT: u64 = 1 << 63;
const RAW_RESERVED_MASK: u64 = ((1 << 63) - 1) & !((1 << 50) - 1);

/// How the checksums are brought back in line with the rewritten
/// header bytes.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumMode {
    /// Apply the RFC 1624 incremental update for each changed word.
    #[default]
    Incremental,

    /// Recompute each checksum over the full span it covers.
    ///
    /// The TCP checksum can only be recomputed when the entire
    /// segment is present in the frame; otherwise the incremental
    /// update is used for it.
    Full,
}

impl FromStr for ChecksumMode {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "incremental" => Ok(Self::Incremental),
            "full" => Ok(Self::Full),
            _ => Err(ProfileError::UnknownChecksumMode),
        }
    }
}

impl Display for ChecksumMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Incremental => "incremental",
            Self::Full => "full",
        };
        write!(f, "{s}")
    }
}

/// What to do with a frame that claims to be IPv4/TCP but whose
/// headers are internally inconsistent.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Leave the frame untouched and let it through.
    #[default]
    Pass,

    /// Ask the dispatch layer to drop the frame.
    Drop,
}

impl FromStr for MalformedPolicy {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pass" => Ok(Self::Pass),
            "drop" => Ok(Self::Drop),
            _ => Err(ProfileError::UnknownMalformedPolicy),
        }
    }
}

impl Display for MalformedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Pass => "pass",
            Self::Drop => "drop",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("target TTL must be non-zero")]
    ZeroTtl,

    #[error("target TCP window must be non-zero")]
    ZeroWindow,

    #[error("reserved bits set in raw profile value: {0:#018x}")]
    ReservedBits(u64),

    #[error("unknown OS preset")]
    UnknownPreset,

    #[error("unknown checksum mode")]
    UnknownChecksumMode,

    #[error("unknown malformed-frame policy")]
    UnknownMalformedPolicy,

    #[error("profile is missing {0}")]
    MissingField(&'static str),
}

/// The fingerprint a frame is rewritten to carry.
///
/// A profile is immutable once built. The control plane replaces it
/// as a whole; the datapath only ever reads it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct MutationProfile {
    /// The TTL written into every candidate frame.
    pub target_ttl: u8,

    /// The TCP window written into every candidate frame.
    pub target_window: u16,

    /// When non-zero, only frames whose TTL equals this value have
    /// their TTL rewritten. When zero, every TTL is rewritten.
    pub source_ttl_hint: u8,

    /// The IP identification written into every candidate frame. Zero
    /// leaves the identification as-is.
    pub target_ident: u16,

    pub checksum: ChecksumMode,
    pub malformed: MalformedPolicy,
}

impl MutationProfile {
    /// Create a profile rewriting TTL and window, leaving everything
    /// else at its default.
    pub fn new(target_ttl: u8, target_window: u16) -> Self {
        Self {
            target_ttl,
            target_window,
            source_ttl_hint: 0,
            target_ident: 0,
            checksum: ChecksumMode::default(),
            malformed: MalformedPolicy::default(),
        }
    }

    pub fn with_source_ttl_hint(mut self, hint: u8) -> Self {
        self.source_ttl_hint = hint;
        self
    }

    pub fn with_ident(mut self, ident: u16) -> Self {
        self.target_ident = ident;
        self
    }

    pub fn with_checksum(mut self, mode: ChecksumMode) -> Self {
        self.checksum = mode;
        self
    }

    pub fn with_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.malformed = policy;
        self
    }

    /// Is identification rewriting enabled?
    pub fn rewrites_ident(&self) -> bool {
        self.target_ident != 0
    }

    /// Should a frame carrying `ttl` have its TTL rewritten?
    pub fn rewrites_ttl(&self, ttl: u8) -> bool {
        self.source_ttl_hint == 0 || self.source_ttl_hint == ttl
    }

    /// Verify the profile cannot produce a frame the network would
    /// discard.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.target_ttl == 0 {
            return Err(ProfileError::ZeroTtl);
        }

        if self.target_window == 0 {
            return Err(ProfileError::ZeroWindow);
        }

        Ok(())
    }

    /// Encode this profile as a profile map value.
    pub fn to_raw(&self) -> u64 {
        let mut raw = RAW_PRESENT
            | (u64::from(self.target_ttl) << RAW_TTL_SHIFT)
            | (u64::from(self.source_ttl_hint) << RAW_HINT_SHIFT)
            | (u64::from(self.target_window) << RAW_WINDOW_SHIFT)
            | (u64::from(self.target_ident) << RAW_IDENT_SHIFT);

        if self.checksum == ChecksumMode::Full {
            raw |= RAW_CSUM_FULL;
        }

        if self.malformed == MalformedPolicy::Drop {
            raw |= RAW_MALFORMED_DROP;
        }

        raw
    }

    /// Decode a profile map value.
    ///
    /// Returns `Ok(None)` when the value does not carry a profile.
    pub fn from_raw(raw: u64) -> Result<Option<Self>, ProfileError> {
        if raw & RAW_PRESENT == 0 {
            return Ok(None);
        }

        if raw & RAW_RESERVED_MASK != 0 {
            return Err(ProfileError::ReservedBits(raw));
        }

        let checksum = if raw & RAW_CSUM_FULL != 0 {
            ChecksumMode::Full
        } else {
            ChecksumMode::Incremental
        };

        let malformed = if raw & RAW_MALFORMED_DROP != 0 {
            MalformedPolicy::Drop
        } else {
            MalformedPolicy::Pass
        };

        let profile = Self {
            target_ttl: (raw >> RAW_TTL_SHIFT) as u8,
            source_ttl_hint: (raw >> RAW_HINT_SHIFT) as u8,
            target_window: (raw >> RAW_WINDOW_SHIFT) as u16,
            target_ident: (raw >> RAW_IDENT_SHIFT) as u16,
            checksum,
            malformed,
        };

        profile.validate()?;
        Ok(Some(profile))
    }
}

impl Display for MutationProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ttl={}", self.target_ttl)?;
        if self.source_ttl_hint != 0 {
            write!(f, " (from {})", self.source_ttl_hint)?;
        }
        write!(f, " window={}", self.target_window)?;
        if self.rewrites_ident() {
            write!(f, " ident={}", self.target_ident)?;
        }
        write!(f, " csum={} malformed={}", self.checksum, self.malformed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn raw_layout() {
        let p = MutationProfile::new(128, 64240)
            .with_source_ttl_hint(64)
            .with_ident(0x1234);
        let raw = p.to_raw();

        assert_eq!(raw & 0xFF, 128);
        assert_eq!((raw >> 8) & 0xFF, 64);
        assert_eq!((raw >> 16) & 0xFFFF, 64240);
        assert_eq!((raw >> 32) & 0xFFFF, 0x1234);
        assert_eq!(raw >> 63, 1);
        assert_eq!(MutationProfile::from_raw(raw), Ok(Some(p)));
    }

    #[test]
    fn raw_policy_bits() {
        let p = MutationProfile::new(64, 65535)
            .with_checksum(ChecksumMode::Full)
            .with_malformed(MalformedPolicy::Drop);
        let raw = p.to_raw();
        assert_ne!(raw & (1 << 48), 0);
        assert_ne!(raw & (1 << 49), 0);
        assert_eq!(MutationProfile::from_raw(raw), Ok(Some(p)));
    }

    #[test]
    fn raw_absent() {
        assert_eq!(MutationProfile::from_raw(PROFILE_RAW_NONE), Ok(None));
        // Field bits without the present bit are still "no profile".
        assert_eq!(MutationProfile::from_raw(0x0000_0000_FAF0_0080), Ok(None));
    }

    #[test]
    fn raw_rejects_reserved_and_invalid() {
        let raw = MutationProfile::new(128, 64240).to_raw() | (1 << 55);
        assert_eq!(
            MutationProfile::from_raw(raw),
            Err(ProfileError::ReservedBits(raw))
        );

        // Present with a zero TTL.
        let raw = (1 << 63) | (64240 << 16);
        assert_eq!(MutationProfile::from_raw(raw), Err(ProfileError::ZeroTtl));

        // Present with a zero window.
        let raw = (1 << 63) | 128;
        assert_eq!(
            MutationProfile::from_raw(raw),
            Err(ProfileError::ZeroWindow)
        );
    }

    #[test]
    fn ttl_hint() {
        let p = MutationProfile::new(128, 64240);
        assert!(p.rewrites_ttl(64));
        assert!(p.rewrites_ttl(255));

        let p = p.with_source_ttl_hint(64);
        assert!(p.rewrites_ttl(64));
        assert!(!p.rewrites_ttl(128));
    }

    #[test]
    fn display() {
        let p = MutationProfile::new(128, 64240).with_source_ttl_hint(64);
        assert_eq!(
            p.to_string(),
            "ttl=128 (from 64) window=64240 csum=incremental malformed=pass"
        );
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Reference network stacks.

use crate::profile::MutationProfile;
use crate::profile::ProfileError;
use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

/// The initial TTL used by Windows.
pub const WINDOWS_TTL: u8 = 128;
/// The SYN window advertised by Windows 10 with a 1460-byte MSS.
pub const WINDOWS_WINDOW: u16 = 64240;

/// The initial TTL used by Linux.
pub const LINUX_TTL: u8 = 64;
/// The SYN window advertised by Linux with a 1460-byte MSS.
pub const LINUX_WINDOW: u16 = 29200;

/// The initial TTL used by macOS.
pub const MACOS_TTL: u8 = 64;
/// The SYN window advertised by macOS.
pub const MACOS_WINDOW: u16 = 65535;

/// An operating system whose stack fingerprint we know how to wear.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OsPreset {
    Windows,
    Linux,
    MacOs,
}

impl OsPreset {
    pub const ALL: [OsPreset; 3] = [Self::Windows, Self::Linux, Self::MacOs];

    /// The profile making traffic resemble this stack.
    pub fn profile(&self) -> MutationProfile {
        match self {
            Self::Windows => MutationProfile::new(WINDOWS_TTL, WINDOWS_WINDOW),
            Self::Linux => MutationProfile::new(LINUX_TTL, LINUX_WINDOW),
            Self::MacOs => MutationProfile::new(MACOS_TTL, MACOS_WINDOW),
        }
    }
}

impl FromStr for OsPreset {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::MacOs),
            _ => Err(ProfileError::UnknownPreset),
        }
    }
}

impl Display for OsPreset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
        };
        write!(f, "{s}")
    }
}

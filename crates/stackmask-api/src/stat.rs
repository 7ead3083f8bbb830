// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use serde::Deserialize;
use serde::Serialize;

/// A point-in-time readout of the masker's counters.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MaskStatsSnapshot {
    /// Frames seen while no profile was installed.
    pub no_profile: u64,
    /// Frames too short to hold a required header.
    pub truncated: u64,
    /// Frames whose ethertype is not IPv4.
    pub not_ipv4: u64,
    /// IPv4 frames not carrying TCP.
    pub not_tcp: u64,
    /// IPv4 fragments.
    pub fragment: u64,
    /// Frames with inconsistent IPv4/TCP headers.
    pub malformed: u64,
    /// Frames that went through the rewriter.
    pub mutated: u64,
    /// Of `mutated`, frames whose bytes did not change.
    pub already_masked: u64,
    /// Checksums fixed by incremental update.
    pub csum_incremental: u64,
    /// Checksums fixed by full recomputation.
    pub csum_full: u64,
    /// Frames dropped.
    pub dropped: u64,
    /// The profile epoch at the time of the readout.
    pub profile_epoch: u64,
}

impl MaskStatsSnapshot {
    /// Frames handed back without modification.
    pub fn unchanged(&self) -> u64 {
        self.total() - self.mutated - self.dropped
    }

    /// Every frame processed.
    pub fn total(&self) -> u64 {
        self.no_profile
            + self.truncated
            + self.not_ipv4
            + self.not_tcp
            + self.fragment
            + self.malformed
            + self.mutated
    }
}

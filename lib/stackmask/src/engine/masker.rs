// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The process-wide driver of the engine.
//!
//! A [`Masker`] ties together the profile slot, the outcome counters,
//! and the platform providers. It is shared by reference between the
//! threads handing it frames and the control plane replacing its
//! profile; none of its methods block.

use super::FrameView;
use super::Outcome;
use super::process;
use super::stat::MaskStats;
use crate::api::MaskStatsSnapshot;
use crate::api::MutationProfile;
use crate::api::ProfileError;
use crate::api::Verdict;
use crate::dynamic::ProfileCell;
use crate::dynamic::Snapshot;
use crate::provider::LogLevel;
use crate::provider::Providers;
use alloc::format;

pub struct Masker {
    profile: ProfileCell,
    stats: MaskStats,
    providers: Providers,
}

impl Masker {
    /// Create a masker with no profile: every frame passes unchanged
    /// until one is set.
    pub fn new(providers: Providers) -> Self {
        Self { profile: ProfileCell::new(), stats: MaskStats::new(), providers }
    }

    /// Process one frame, covering all of `buf`.
    pub fn process(&self, buf: &mut [u8]) -> Verdict {
        self.process_view(&mut FrameView::new(buf)).verdict
    }

    /// Process the frame in `view`, returning the full outcome.
    ///
    /// The profile is read exactly once per call.
    pub fn process_view(&self, view: &mut FrameView) -> Outcome {
        let profile = self.profile.load();
        let outcome = process(view, profile.as_ref());
        self.stats.record(&outcome);
        outcome
    }

    /// Install `profile`, replacing the current one as a whole.
    pub fn set_profile(
        &self,
        profile: MutationProfile,
    ) -> Result<(), ProfileError> {
        match self.profile.store(Some(profile)) {
            Ok(()) => {
                self.log_set(&profile);
                Ok(())
            }
            Err(e) => Err(self.log_reject(e)),
        }
    }

    /// Install a profile from its raw map value.
    ///
    /// A value without the present bit clears the profile.
    pub fn set_profile_raw(
        &self,
        raw: u64,
    ) -> Result<Option<MutationProfile>, ProfileError> {
        match self.profile.store_raw(raw) {
            Ok(Some(profile)) => {
                self.log_set(&profile);
                Ok(Some(profile))
            }
            Ok(None) => {
                self.log_clear();
                Ok(None)
            }
            Err(e) => Err(self.log_reject(e)),
        }
    }

    /// Remove the profile: frames pass unchanged from here on.
    pub fn clear_profile(&self) {
        // Storing `None` cannot fail validation.
        let _ = self.profile.store(None);
        self.log_clear();
    }

    /// The current profile, with the number of times it has been
    /// replaced.
    pub fn profile(&self) -> Snapshot<Option<MutationProfile>> {
        self.profile.snapshot()
    }

    pub fn stats(&self) -> MaskStatsSnapshot {
        let mut snap = MaskStatsSnapshot::from(&self.stats);
        snap.profile_epoch = self.profile.epoch();
        snap
    }

    #[cfg(any(feature = "test-help", test))]
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    fn log_set(&self, profile: &MutationProfile) {
        let msg = format!(
            "profile set (epoch {}): {profile}",
            self.profile.epoch()
        );
        self.providers.log.log(LogLevel::Note, &msg);
    }

    fn log_clear(&self) {
        let msg = format!("profile cleared (epoch {})", self.profile.epoch());
        self.providers.log.log(LogLevel::Note, &msg);
    }

    fn log_reject(&self, e: ProfileError) -> ProfileError {
        let msg = format!("profile rejected, keeping current: {e}");
        self.providers.log.log(LogLevel::Warn, &msg);
        e
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! A lock-free, swappable slot holding the active mutation profile.
//!
//! The profile is kept in its raw map-value encoding in a single
//! `AtomicU64`, so a reader sees either the old profile or the new
//! one in full, never a mix of the two. Only values which decode to a
//! valid profile are ever stored.

use crate::api::MutationProfile;
use crate::api::PROFILE_RAW_NONE;
use crate::api::ProfileError;
use core::fmt::Debug;
use core::ops::Deref;
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;

/// The single-slot profile map.
#[derive(Default)]
pub struct ProfileCell {
    raw: AtomicU64,
    epoch: AtomicU64,
}

/// A value read from a [`ProfileCell`], along with the number of
/// stores the cell had seen at the time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot<T> {
    pub value: T,
    pub epoch: u64,
}

impl From<MutationProfile> for ProfileCell {
    fn from(profile: MutationProfile) -> Self {
        Self {
            raw: AtomicU64::new(profile.to_raw()),
            epoch: AtomicU64::default(),
        }
    }
}

impl ProfileCell {
    /// Create an empty cell: every frame passes unchanged.
    pub const fn new() -> Self {
        Self {
            raw: AtomicU64::new(PROFILE_RAW_NONE),
            epoch: AtomicU64::new(0),
        }
    }

    /// Replace the profile, or clear it with `None`.
    ///
    /// An invalid profile is rejected and the current one is kept.
    pub fn store(
        &self,
        profile: Option<MutationProfile>,
    ) -> Result<(), ProfileError> {
        let raw = match profile {
            Some(p) => {
                p.validate()?;
                p.to_raw()
            }
            None => PROFILE_RAW_NONE,
        };
        self.put(raw);
        Ok(())
    }

    /// Replace the profile with a raw map value.
    ///
    /// The value is decoded first; one which fails to decode is
    /// rejected and the current profile is kept.
    pub fn store_raw(
        &self,
        raw: u64,
    ) -> Result<Option<MutationProfile>, ProfileError> {
        let profile = MutationProfile::from_raw(raw)?;
        // Normalize so an absent profile is always stored as zero.
        self.put(profile.map_or(PROFILE_RAW_NONE, |p| p.to_raw()));
        Ok(profile)
    }

    /// The current profile, if any.
    pub fn load(&self) -> Option<MutationProfile> {
        // Only valid encodings are ever stored.
        MutationProfile::from_raw(self.load_raw()).ok().flatten()
    }

    /// The current raw map value.
    pub fn load_raw(&self) -> u64 {
        self.raw.load(Ordering::Acquire)
    }

    /// The current profile along with the store epoch.
    pub fn snapshot(&self) -> Snapshot<Option<MutationProfile>> {
        let epoch = self.epoch();
        Snapshot { value: self.load(), epoch }
    }

    /// The number of stores made to this cell.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }

    fn put(&self, raw: u64) {
        self.raw.store(raw, Ordering::Release);
        _ = self.epoch.fetch_add(1, Ordering::Relaxed);
    }
}

impl Debug for ProfileCell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let current = self.snapshot();
        write!(f, "{current:?}")
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

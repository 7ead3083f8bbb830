// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Per-outcome counters kept by a [`Masker`](super::masker::Masker).

use super::verdict::CsumFix;
use super::verdict::Outcome;
use super::verdict::Reason;
use crate::api::MaskStatsSnapshot;
use crate::api::Verdict;
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;

/// Counts of frames by the reason for their verdict.
///
/// Every frame bumps exactly one of the reason counters. The checksum
/// counters and `dropped` are tallied on top of those.
#[derive(Debug, Default)]
pub struct MaskStats {
    pub no_profile: AtomicU64,
    pub truncated: AtomicU64,
    pub not_ipv4: AtomicU64,
    pub not_tcp: AtomicU64,
    pub fragment: AtomicU64,
    pub malformed: AtomicU64,
    pub mutated: AtomicU64,
    pub already_masked: AtomicU64,
    pub csum_incremental: AtomicU64,
    pub csum_full: AtomicU64,
    pub dropped: AtomicU64,
}

impl MaskStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the outcome of one frame.
    pub fn record(&self, outcome: &Outcome) {
        use super::classify::NotApplicable::*;

        let stat = match outcome.reason {
            Reason::NoProfile => &self.no_profile,
            Reason::Truncated(_) => &self.truncated,
            Reason::NotApplicable(NotIpv4(_)) => &self.not_ipv4,
            Reason::NotApplicable(NotTcp(_)) => &self.not_tcp,
            Reason::NotApplicable(Fragment) => &self.fragment,
            Reason::Malformed(_) => &self.malformed,
            Reason::Mutated { rewrites, ip_checksum, tcp_checksum } => {
                if rewrites.is_empty() {
                    self.already_masked.fetch_add(1, Ordering::Relaxed);
                }
                self.csum(ip_checksum);
                self.csum(tcp_checksum);
                &self.mutated
            }
        };
        stat.fetch_add(1, Ordering::Relaxed);

        if outcome.verdict == Verdict::Drop {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn csum(&self, fix: CsumFix) {
        let stat = match fix {
            CsumFix::Untouched => return,
            CsumFix::Incremental => &self.csum_incremental,
            CsumFix::Full => &self.csum_full,
        };
        stat.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero every counter.
    #[cfg(any(feature = "test-help", test))]
    pub fn reset(&self) {
        for stat in [
            &self.no_profile,
            &self.truncated,
            &self.not_ipv4,
            &self.not_tcp,
            &self.fragment,
            &self.malformed,
            &self.mutated,
            &self.already_masked,
            &self.csum_incremental,
            &self.csum_full,
            &self.dropped,
        ] {
            stat.store(0, Ordering::Relaxed);
        }
    }
}

impl From<&MaskStats> for MaskStatsSnapshot {
    fn from(val: &MaskStats) -> Self {
        MaskStatsSnapshot {
            no_profile: val.no_profile.load(Ordering::Relaxed),
            truncated: val.truncated.load(Ordering::Relaxed),
            not_ipv4: val.not_ipv4.load(Ordering::Relaxed),
            not_tcp: val.not_tcp.load(Ordering::Relaxed),
            fragment: val.fragment.load(Ordering::Relaxed),
            malformed: val.malformed.load(Ordering::Relaxed),
            mutated: val.mutated.load(Ordering::Relaxed),
            already_masked: val.already_masked.load(Ordering::Relaxed),
            csum_incremental: val.csum_incremental.load(Ordering::Relaxed),
            csum_full: val.csum_full.load(Ordering::Relaxed),
            dropped: val.dropped.load(Ordering::Relaxed),
            profile_epoch: 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::MalformedPolicy;
    use crate::engine::checksum::WordChange;
    use crate::engine::classify::NotApplicable;
    use crate::engine::frame::Layer;
    use crate::engine::parse::Malformed;
    use crate::engine::parse::ParseError;
    use crate::engine::rewrite::Rewrites;

    #[test]
    fn record() {
        let stats = MaskStats::new();
        let rw = Rewrites {
            ttl: Some(WordChange::new(0x4006, 0x8006)),
            ..Default::default()
        };

        stats.record(&Outcome::unchanged(Reason::NoProfile));
        stats.record(&Outcome::unchanged(Reason::Truncated(Layer::Ether)));
        stats.record(&Outcome::unchanged(Reason::NotApplicable(
            NotApplicable::NotTcp(17),
        )));
        stats.record(&Outcome::rejected(
            ParseError::Malformed(Malformed::Ihl(2)),
            MalformedPolicy::Drop,
        ));
        stats.record(&Outcome::mutated(
            rw,
            CsumFix::Incremental,
            CsumFix::Untouched,
        ));
        stats.record(&Outcome::mutated(
            Rewrites::default(),
            CsumFix::Full,
            CsumFix::Full,
        ));

        let snap = MaskStatsSnapshot::from(&stats);
        assert_eq!(snap.no_profile, 1);
        assert_eq!(snap.truncated, 1);
        assert_eq!(snap.not_tcp, 1);
        assert_eq!(snap.malformed, 1);
        assert_eq!(snap.dropped, 1);
        assert_eq!(snap.mutated, 2);
        assert_eq!(snap.already_masked, 1);
        assert_eq!(snap.csum_incremental, 1);
        assert_eq!(snap.csum_full, 2);
        assert_eq!(snap.total(), 6);
        assert_eq!(snap.unchanged(), 3);

        stats.reset();
        assert_eq!(MaskStatsSnapshot::from(&stats).total(), 0);
    }
}

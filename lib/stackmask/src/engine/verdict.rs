// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The outcome of processing a frame, and the verdict it maps to.

use super::classify::NotApplicable;
use super::frame::Layer;
use super::parse::Malformed;
use super::parse::ParseError;
use super::rewrite::Rewrites;
use crate::api::MalformedPolicy;
use crate::api::Verdict;
use core::fmt;
use core::fmt::Display;

/// How a checksum was brought in line with the rewritten header.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CsumFix {
    /// Nothing it covers changed, and it was left as is.
    Untouched,

    /// Updated from the changed words alone.
    Incremental,

    /// Recomputed over the whole header (or segment).
    Full,
}

impl Display for CsumFix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Untouched => "untouched",
            Self::Incremental => "incremental",
            Self::Full => "full",
        };
        write!(f, "{s}")
    }
}

/// Why a frame ended up with its verdict.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reason {
    NoProfile,
    Truncated(Layer),
    NotApplicable(NotApplicable),
    Malformed(Malformed),
    Mutated {
        rewrites: Rewrites,
        ip_checksum: CsumFix,
        tcp_checksum: CsumFix,
    },
}

impl Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoProfile => write!(f, "no profile"),
            Self::Truncated(layer) => write!(f, "truncated {layer} header"),
            Self::NotApplicable(na) => write!(f, "{na}"),
            Self::Malformed(m) => write!(f, "malformed: {m}"),
            Self::Mutated { rewrites, ip_checksum, tcp_checksum } => {
                if rewrites.is_empty() {
                    write!(f, "already masked")?;
                } else {
                    write!(f, "rewritten")?;
                }
                write!(f, " (ip csum {ip_checksum}, tcp csum {tcp_checksum})")
            }
        }
    }
}

/// A verdict along with its reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub reason: Reason,
}

impl Outcome {
    /// The frame was not touched.
    pub fn unchanged(reason: Reason) -> Self {
        Self { verdict: Verdict::PassUnchanged, reason }
    }

    /// The frame went through the rewriter and its checksums were
    /// fixed.
    pub fn mutated(
        rewrites: Rewrites,
        ip_checksum: CsumFix,
        tcp_checksum: CsumFix,
    ) -> Self {
        Self {
            verdict: Verdict::PassMutated,
            reason: Reason::Mutated { rewrites, ip_checksum, tcp_checksum },
        }
    }

    /// The frame was rejected before any write.
    ///
    /// Only a malformed frame under [`MalformedPolicy::Drop`] is
    /// dropped; all else passes unchanged.
    pub fn rejected(err: ParseError, policy: MalformedPolicy) -> Self {
        match err {
            ParseError::Truncated(layer, _) => {
                Self::unchanged(Reason::Truncated(layer))
            }
            ParseError::NotApplicable(na) => {
                Self::unchanged(Reason::NotApplicable(na))
            }
            ParseError::Malformed(m) => {
                let verdict = match policy {
                    MalformedPolicy::Pass => Verdict::PassUnchanged,
                    MalformedPolicy::Drop => Verdict::Drop,
                };
                Self { verdict, reason: Reason::Malformed(m) }
            }
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.verdict, self.reason)
    }
}

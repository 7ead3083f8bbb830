// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// `XDP_DROP` from the kernel's `enum xdp_action`.
pub const XDP_DROP: u32 = 1;
/// `XDP_PASS` from the kernel's `enum xdp_action`.
pub const XDP_PASS: u32 = 2;

/// The final disposition of a frame, handed back to the dispatch
/// layer.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Verdict {
    /// The frame was not touched.
    PassUnchanged,

    /// The frame was rewritten (or already carried the target
    /// fingerprint) and its checksums are consistent.
    PassMutated,

    /// The frame should not be sent.
    Drop,
}

impl Verdict {
    /// Is the frame allowed onto the wire?
    pub fn is_pass(&self) -> bool {
        !matches!(self, Self::Drop)
    }

    /// The XDP return code conveying this verdict.
    pub fn xdp_action(&self) -> u32 {
        match self {
            Self::PassUnchanged | Self::PassMutated => XDP_PASS,
            Self::Drop => XDP_DROP,
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::PassUnchanged => "PASS_UNCHANGED",
            Self::PassMutated => "PASS_MUTATED",
            Self::Drop => "DROP",
        };
        write!(f, "{s}")
    }
}

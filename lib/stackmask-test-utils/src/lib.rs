// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Common routines for integration tests.
//!
//! Frames are built, and checked after the fact, with smoltcp rather
//! than with the engine's own header types, so that what the tests
//! verify does not depend on the code under test.

// This type of pedantry is more trouble than it's worth here.
#![allow(dead_code)]

pub mod frame;
pub mod pcap;
pub mod verify;

// Let's make our lives easier and pub use a bunch of stuff.
pub use frame::TcpFrame;
pub use smoltcp::wire::IpProtocol;
pub use smoltcp::wire::Ipv4Address;
pub use stackmask::api::ChecksumMode;
pub use stackmask::api::MalformedPolicy;
pub use stackmask::api::MutationProfile;
pub use stackmask::api::OsPreset;
pub use stackmask::api::Verdict;
pub use stackmask::engine::FrameView;
pub use stackmask::engine::Masker;
pub use stackmask::engine::Outcome;
pub use stackmask::engine::Reason;
pub use stackmask::engine::process;
pub use stackmask::provider::NullLog;
pub use stackmask::provider::PrintlnLog;
pub use stackmask::provider::Providers;
pub use verify::FrameCheck;
pub use verify::Fingerprint;
pub use verify::fingerprint;
pub use verify::verify_frame;

/// Build a masker that prints its log messages, with `profile`
/// installed if given.
pub fn masker(profile: Option<MutationProfile>) -> Masker {
    let m = Masker::new(Providers { log: Box::new(PrintlnLog) });
    if let Some(p) = profile {
        m.set_profile(p).unwrap();
    }
    m
}

/// Run `frame` through the engine under `profile`, returning the
/// outcome.
pub fn mask(frame: &mut [u8], profile: &MutationProfile) -> Outcome {
    process(&mut FrameView::new(frame), Some(profile))
}

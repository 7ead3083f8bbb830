// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The masking engine.
//!
//! A frame moves through four stages, each of which may end it early:
//!
//! ```text
//! validate -> rewrite -> checksum -> verdict
//! ```
//!
//! * [`parse::validate()`] checks, header by header, that everything
//!   we will touch lies inside the [`FrameView`], classifying the
//!   frame along the way. Any failure here ends processing before a
//!   single byte has been written, and the frame passes unchanged
//!   (or, if malformed and the profile says so, is dropped).
//!
//! * [`rewrite::rewrite()`] overwrites the TTL, IP identification,
//!   and TCP window, recording the words it changed.
//!
//! * The checksums are then brought in line, incrementally from the
//!   changed words, or recomputed in full when the profile asks for
//!   it and the bytes are there to do so.
//!
//! * [`Outcome`] carries the verdict and the reason for it.
//!
//! Processing a frame never allocates, never loops over anything but
//! the bytes being checksummed, and never panics.

pub mod checksum;
pub mod classify;
pub mod ether;
pub mod frame;
pub mod ip4;
pub mod masker;
pub mod parse;
pub mod rewrite;
pub mod stat;
pub mod tcp;
pub mod verdict;

pub use frame::FrameView;
pub use masker::Masker;
pub use verdict::CsumFix;
pub use verdict::Outcome;
pub use verdict::Reason;

use crate::api::ChecksumMode;
use crate::api::MutationProfile;
use crate::api::Verdict;
use checksum::update_checksum_all;
use frame::Layer;
use ip4::Ipv4Hdr;
use parse::Candidate;
use rewrite::Rewrites;
use tcp::TcpHdr;

/// Process the frame in `view` under `profile`.
///
/// With no profile, the frame passes unchanged.
pub fn process(
    view: &mut FrameView,
    profile: Option<&MutationProfile>,
) -> Outcome {
    let Some(profile) = profile else {
        return Outcome::unchanged(Reason::NoProfile);
    };

    let full = profile.checksum == ChecksumMode::Full;
    let cand = match parse::validate(view, full) {
        Ok(cand) => cand,
        Err(e) => return Outcome::rejected(e, profile.malformed),
    };

    // The spans were validated above; fail closed regardless.
    let Some((rewrites, ip_fix, tcp_fix)) =
        rewrite_headers(view, &cand, profile)
    else {
        return Outcome::unchanged(Reason::Truncated(Layer::Tcp));
    };

    if !full {
        return Outcome::mutated(rewrites, ip_fix, tcp_fix);
    }

    // The incremental result stands wherever the full recompute
    // cannot be done.
    let ip_fix = recompute_ip(view, &cand).unwrap_or(ip_fix);
    let tcp_fix = recompute_tcp(view, &cand).unwrap_or(tcp_fix);
    Outcome::mutated(rewrites, ip_fix, tcp_fix)
}

/// Process the whole of `buf` under `profile`, returning only the
/// verdict.
pub fn process_frame(
    buf: &mut [u8],
    profile: Option<&MutationProfile>,
) -> Verdict {
    process(&mut FrameView::new(buf), profile).verdict
}

// Rewrite the fingerprint fields and incrementally update both
// checksums for them.
fn rewrite_headers(
    view: &mut FrameView,
    cand: &Candidate,
    profile: &MutationProfile,
) -> Option<(Rewrites, CsumFix, CsumFix)> {
    let (ip, tcp) =
        view.header_pair_mut::<Ipv4Hdr, TcpHdr>(cand.ip, cand.tcp).ok()?;
    let rw = rewrite::rewrite(ip, tcp, profile);

    let mut ip_fix = CsumFix::Untouched;
    if rw.ttl.is_some() || rw.ident.is_some() {
        ip.set_csum(update_checksum_all(ip.csum(), rw.ip_changes()));
        ip_fix = CsumFix::Incremental;
    }

    let mut tcp_fix = CsumFix::Untouched;
    if rw.window.is_some() {
        tcp.set_csum(update_checksum_all(tcp.csum(), rw.tcp_changes()));
        tcp_fix = CsumFix::Incremental;
    }

    Some((rw, ip_fix, tcp_fix))
}

fn recompute_ip(view: &mut FrameView, cand: &Candidate) -> Option<CsumFix> {
    let hdr = view.bytes(cand.ip_full).ok()?;
    let csum = checksum::ipv4_checksum(hdr).ok()?;
    view.header_mut::<Ipv4Hdr>(cand.ip.offset()).ok()?.set_csum(csum);
    Some(CsumFix::Full)
}

// Only possible when the whole segment was captured.
fn recompute_tcp(view: &mut FrameView, cand: &Candidate) -> Option<CsumFix> {
    let segment = cand.segment?;
    let ip = view.header::<Ipv4Hdr>(cand.ip.offset()).ok()?;
    let (src, dst) = (ip.src, ip.dst);
    let csum =
        checksum::tcp_checksum(src, dst, view.bytes(segment).ok()?).ok()?;
    view.header_mut::<TcpHdr>(cand.tcp.offset()).ok()?.set_csum(csum);
    Some(CsumFix::Full)
}

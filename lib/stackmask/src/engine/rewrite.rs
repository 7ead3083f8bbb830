// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Rewriting the fingerprinted header fields.
//!
//! The rewrite is an overwrite with the profile's target values, not a
//! transformation of the current ones, so applying it a second time
//! changes nothing. Only the TTL, the IP identification, and the TCP
//! window are ever written: lengths, flags, and options are left
//! exactly as they are.

use super::checksum::WordChange;
use super::ip4::Ipv4Hdr;
use super::tcp::TcpHdr;
use crate::api::MutationProfile;

/// The header words which changed, for the checksum update that
/// follows.
///
/// The TTL is recorded as the `[ttl, protocol]` word it sits in, as
/// the checksum sums whole words.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rewrites {
    pub ttl: Option<WordChange>,
    pub ident: Option<WordChange>,
    pub window: Option<WordChange>,
}

impl Rewrites {
    /// Did the rewrite leave every byte as it was?
    pub fn is_empty(&self) -> bool {
        self.ttl.is_none() && self.ident.is_none() && self.window.is_none()
    }

    /// Changes covered by the IPv4 header checksum.
    pub fn ip_changes(&self) -> impl Iterator<Item = WordChange> {
        self.ttl.into_iter().chain(self.ident)
    }

    /// Changes covered by the TCP checksum.
    pub fn tcp_changes(&self) -> impl Iterator<Item = WordChange> {
        self.window.into_iter()
    }
}

/// Overwrite the fingerprinted fields of `ip` and `tcp` with the
/// targets in `profile`.
///
/// A field already holding its target is not recorded.
pub fn rewrite(
    ip: &mut Ipv4Hdr,
    tcp: &mut TcpHdr,
    profile: &MutationProfile,
) -> Rewrites {
    let mut rw = Rewrites::default();

    if profile.rewrites_ttl(ip.ttl) && ip.ttl != profile.target_ttl {
        let old = ip.ttl_word();
        ip.ttl = profile.target_ttl;
        rw.ttl = Some(WordChange::new(old, ip.ttl_word()));
    }

    if profile.rewrites_ident() && ip.ident.get() != profile.target_ident {
        let old = ip.ident.get();
        ip.ident.set(profile.target_ident);
        rw.ident = Some(WordChange::new(old, profile.target_ident));
    }

    if tcp.window.get() != profile.target_window {
        let old = tcp.window.get();
        tcp.window.set(profile.target_window);
        rw.window = Some(WordChange::new(old, profile.target_window));
    }

    rw
}

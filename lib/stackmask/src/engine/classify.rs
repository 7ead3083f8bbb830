// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Deciding whether a frame is a rewrite candidate.
//!
//! Only unfragmented IPv4/TCP is. Everything else is handed back
//! untouched. Classification only looks at headers which have already
//! passed their bounds check, and has no side effects.

use super::ether::EtherHdr;
use super::ether::EtherType;
use super::ip4::IPPROTO_TCP;
use super::ip4::Ipv4Hdr;
use core::fmt;
use core::fmt::Display;

/// Why a well-formed frame is outside of what we rewrite.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NotApplicable {
    /// The ethertype is not IPv4. VLAN-tagged frames land here too.
    NotIpv4(EtherType),

    /// The IPv4 protocol is not TCP.
    NotTcp(u8),

    /// An IPv4 fragment.
    Fragment,
}

impl Display for NotApplicable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotIpv4(et) => write!(f, "ethertype {et} is not IPv4"),
            Self::NotTcp(proto) => write!(f, "IP protocol {proto} is not TCP"),
            Self::Fragment => write!(f, "IPv4 fragment"),
        }
    }
}

/// Is this an IPv4 frame?
pub fn classify_ether(eth: &EtherHdr) -> Result<(), NotApplicable> {
    match eth.ether_type() {
        EtherType::Ipv4 => Ok(()),
        et => Err(NotApplicable::NotIpv4(et)),
    }
}

/// Is this a whole IPv4 datagram carrying TCP?
pub fn classify_ipv4(ip: &Ipv4Hdr) -> Result<(), NotApplicable> {
    if ip.proto != IPPROTO_TCP {
        return Err(NotApplicable::NotTcp(ip.proto));
    }

    if ip.is_fragment() {
        return Err(NotApplicable::Fragment);
    }

    Ok(())
}

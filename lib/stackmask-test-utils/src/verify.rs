// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Independent checks of a frame after it has been masked.

use smoltcp::wire::EthernetFrame;
use smoltcp::wire::EthernetProtocol;
use smoltcp::wire::IpAddress;
use smoltcp::wire::IpProtocol;
use smoltcp::wire::Ipv4Packet;
use smoltcp::wire::TcpPacket;

/// Checksum validity of an IPv4/TCP frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FrameCheck {
    pub ipv4: bool,
    pub tcp: bool,
}

impl FrameCheck {
    pub fn ok(&self) -> bool {
        self.ipv4 && self.tcp
    }
}

/// The fields the masker rewrites.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fingerprint {
    pub ttl: u8,
    pub ident: u16,
    pub window: u16,
}

/// Check both checksums of a complete Ethernet/IPv4/TCP frame.
///
/// Returns `None` when the frame is not one, or is cut short.
pub fn verify_frame(frame: &[u8]) -> Option<FrameCheck> {
    let eth = EthernetFrame::new_checked(frame).ok()?;
    if eth.ethertype() != EthernetProtocol::Ipv4 {
        return None;
    }

    let ip = Ipv4Packet::new_checked(eth.payload()).ok()?;
    if ip.next_header() != IpProtocol::Tcp {
        return None;
    }

    let src = IpAddress::Ipv4(ip.src_addr());
    let dst = IpAddress::Ipv4(ip.dst_addr());
    let tcp = TcpPacket::new_checked(ip.payload()).ok()?;

    Some(FrameCheck {
        ipv4: ip.verify_checksum(),
        tcp: tcp.verify_checksum(&src, &dst),
    })
}

/// Read the rewritten fields of an Ethernet/IPv4/TCP frame.
pub fn fingerprint(frame: &[u8]) -> Option<Fingerprint> {
    let eth = EthernetFrame::new_checked(frame).ok()?;
    let ip = Ipv4Packet::new_checked(eth.payload()).ok()?;
    let tcp = TcpPacket::new_checked(ip.payload()).ok()?;

    Some(Fingerprint {
        ttl: ip.hop_limit(),
        ident: ip.ident(),
        window: tcp.window_len(),
    })
}

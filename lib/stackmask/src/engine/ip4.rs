// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! IPv4 headers.

use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

pub const IPV4_VERSION: u8 = 4;

/// The size of an IPv4 header without options.
pub const IPV4_HDR_SZ: usize = size_of::<Ipv4Hdr>();
/// The largest IHL value expressible in four bits.
pub const IPV4_MAX_IHL: u8 = 15;
pub const IPV4_MIN_IHL: u8 = 5;

pub const IPV4_HDR_VER_MASK: u8 = 0xF0;
pub const IPV4_HDR_VER_SHIFT: u8 = 4;
pub const IPV4_HDR_IHL_MASK: u8 = 0x0F;

pub const IPV4_FLAG_MF: u16 = 0x2000;
pub const IPV4_FRAG_OFFSET_MASK: u16 = 0x1FFF;

pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

/// Byte offset of the TTL within the header.
pub const IPV4_TTL_OFFSET: usize = 8;
/// Byte offset of the identification within the header.
pub const IPV4_IDENT_OFFSET: usize = 4;

/// The fixed 20-byte portion of an IPv4 header.
///
/// Options, if any, follow this struct in the frame; they are skipped
/// over but never interpreted or modified.
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
#[repr(C)]
pub struct Ipv4Hdr {
    pub ver_ihl: u8,
    pub dscp_ecn: u8,
    pub total_len: U16,
    pub ident: U16,
    pub frag_and_flags: U16,
    pub ttl: u8,
    pub proto: u8,
    /// Checksum bytes exactly as they are stored in the header.
    pub csum: [u8; 2],
    pub src: [u8; 4],
    pub dst: [u8; 4],
}

impl Ipv4Hdr {
    pub fn version(&self) -> u8 {
        (self.ver_ihl & IPV4_HDR_VER_MASK) >> IPV4_HDR_VER_SHIFT
    }

    pub fn ihl(&self) -> u8 {
        self.ver_ihl & IPV4_HDR_IHL_MASK
    }

    /// The header length in bytes, options included.
    pub fn hdr_len(&self) -> usize {
        usize::from(self.ihl()) * 4
    }

    pub fn total_len(&self) -> usize {
        usize::from(self.total_len.get())
    }

    /// Is this packet a piece of a larger datagram?
    ///
    /// Either more fragments follow, or this one starts somewhere
    /// other than offset zero.
    pub fn is_fragment(&self) -> bool {
        let ff = self.frag_and_flags.get();
        ff & IPV4_FLAG_MF != 0 || ff & IPV4_FRAG_OFFSET_MASK != 0
    }

    /// The 16-bit word holding the TTL, as summed by the checksum.
    ///
    /// The TTL is the high byte of the `[ttl, protocol]` word.
    pub fn ttl_word(&self) -> u16 {
        u16::from_be_bytes([self.ttl, self.proto])
    }

    /// The same word with the TTL replaced by `ttl`.
    pub fn ttl_word_with(&self, ttl: u8) -> u16 {
        u16::from_be_bytes([ttl, self.proto])
    }

    pub fn csum(&self) -> u16 {
        u16::from_be_bytes(self.csum)
    }

    pub fn set_csum(&mut self, csum: u16) {
        self.csum = csum.to_be_bytes();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[rustfmt::skip]
    const HDR: [u8; 20] = [
        // version + IHL
        0x45,
        // DSCP + ECN
        0x00,
        // total length
        0x00, 0x3C,
        // ident
        0x0A, 0x66,
        // flags + frag offset
        0x40, 0x00,
        // TTL
        0x40,
        // protocol
        0x06,
        // checksum
        0x00, 0x00,
        // source
        0x0A, 0x00, 0x00, 0x36,
        // dest
        0x34, 0x0A, 0x80, 0x45,
    ];

    #[test]
    fn fields() {
        let ip = Ipv4Hdr::ref_from_bytes(&HDR[..]).unwrap();
        assert_eq!(IPV4_HDR_SZ, 20);
        assert_eq!(ip.version(), 4);
        assert_eq!(ip.ihl(), 5);
        assert_eq!(ip.hdr_len(), 20);
        assert_eq!(ip.total_len(), 60);
        assert_eq!(ip.ident.get(), 2662);
        assert_eq!(ip.ttl, 64);
        assert_eq!(ip.proto, IPPROTO_TCP);
        assert_eq!(ip.src, [10, 0, 0, 54]);
        assert_eq!(ip.dst, [52, 10, 128, 69]);
        assert_eq!(ip.ttl_word(), 0x4006);
        assert_eq!(ip.ttl_word_with(128), 0x8006);
        // DF alone does not make a fragment.
        assert!(!ip.is_fragment());
    }

    #[test]
    fn fragments() {
        let mut bytes = HDR;
        // MF
        bytes[6] = 0x20;
        let ip = Ipv4Hdr::ref_from_bytes(&bytes[..]).unwrap();
        assert!(ip.is_fragment());

        // Non-zero offset, last fragment.
        bytes[6] = 0x00;
        bytes[7] = 0xB9;
        let ip = Ipv4Hdr::ref_from_bytes(&bytes[..]).unwrap();
        assert!(ip.is_fragment());
    }

    #[test]
    fn field_offsets() {
        let mut ip = *Ipv4Hdr::ref_from_bytes(&HDR[..]).unwrap();
        ip.ttl = 0xEE;
        ip.ident.set(0xABCD);
        ip.set_csum(0x1234);

        let bytes = ip.as_bytes();
        assert_eq!(bytes[IPV4_TTL_OFFSET], 0xEE);
        assert_eq!(&bytes[IPV4_IDENT_OFFSET..][..2], &[0xAB, 0xCD]);
        assert_eq!(&bytes[10..12], &[0x12, 0x34]);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! TCP headers.

use bitflags::bitflags;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;
use zerocopy::byteorder::network_endian::U32;

pub const TCP_HDR_OFFSET_MASK: u8 = 0xF0;
pub const TCP_HDR_OFFSET_SHIFT: u8 = 4;

/// The size of a TCP header without options.
pub const TCP_HDR_SZ: usize = size_of::<TcpHdr>();
pub const TCP_MIN_DATA_OFFSET: u8 = 5;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct TcpFlags: u8 {
        const FIN = 0x01;
        const SYN = 0x02;
        const RST = 0x04;
        const PSH = 0x08;
        const ACK = 0x10;
        const URG = 0x20;
        const ECE = 0x40;
        const CWR = 0x80;
    }
}

/// The fixed 20-byte portion of a TCP header.
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
#[repr(C)]
pub struct TcpHdr {
    pub src: U16,
    pub dst: U16,
    pub seq: U32,
    pub ack: U32,
    pub offset: u8,
    pub flags: u8,
    pub window: U16,
    /// Checksum bytes exactly as they are stored in the header.
    pub csum: [u8; 2],
    pub urg: U16,
}

impl TcpHdr {
    /// The data offset, in 32-bit words.
    pub fn data_offset(&self) -> u8 {
        (self.offset & TCP_HDR_OFFSET_MASK) >> TCP_HDR_OFFSET_SHIFT
    }

    /// The header length in bytes, options included.
    pub fn hdr_len(&self) -> usize {
        usize::from(self.data_offset()) * 4
    }

    pub fn flags(&self) -> TcpFlags {
        TcpFlags::from_bits_retain(self.flags)
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

    #[test]
    fn fields() {
        #[rustfmt::skip]
        let bytes = [
            // source port
            0xC0, 0x02,
            // dest port
            0x00, 0x50,
            // seq
            0x95, 0xAC, 0xAD, 0x03,
            // ack
            0x2C, 0xF5, 0x5E, 0x8D,
            // data offset
            0x50,
            // flags
            0x12,
            // window
            0xFB, 0xB4,
            // checksum
            0xBE, 0xEF,
            // URG pointer
            0x00, 0x00,
        ];

        assert_eq!(TCP_HDR_SZ, 20);
        let tcp = TcpHdr::ref_from_bytes(&bytes[..]).unwrap();
        assert_eq!(tcp.src.get(), 49154);
        assert_eq!(tcp.dst.get(), 80);
        assert_eq!(tcp.seq.get(), 2511121667);
        assert_eq!(tcp.ack.get(), 754278029);
        assert_eq!(tcp.data_offset(), 5);
        assert_eq!(tcp.hdr_len(), 20);
        assert_eq!(tcp.flags(), TcpFlags::SYN | TcpFlags::ACK);
        assert_eq!(tcp.window.get(), 64436);
        assert_eq!(tcp.csum(), 0xBEEF);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Routines for building Ethernet/IPv4/TCP frames.

use smoltcp::wire::EthernetAddress;
use smoltcp::wire::EthernetFrame;
use smoltcp::wire::EthernetProtocol;
use smoltcp::wire::IpAddress;
use smoltcp::wire::IpProtocol;
use smoltcp::wire::Ipv4Address;
use smoltcp::wire::Ipv4Packet;
use smoltcp::wire::TcpPacket;
use smoltcp::wire::TcpSeqNumber;

pub const ETH_HDR_LEN: usize = 14;
pub const IP_HDR_LEN: usize = 20;
pub const TCP_HDR_LEN: usize = 20;

/// A description of an outbound TCP frame, as a Linux host would
/// send it unless told otherwise.
///
/// Both checksums are filled in by [`TcpFrame::build()`].
#[derive(Clone, Debug)]
pub struct TcpFrame {
    pub eth_src: [u8; 6],
    pub eth_dst: [u8; 6],
    pub ether_type: u16,

    pub src: Ipv4Address,
    pub dst: Ipv4Address,
    pub ttl: u8,
    pub ident: u16,
    pub dont_frag: bool,
    pub more_frags: bool,
    /// In bytes; must be a multiple of 8.
    pub frag_offset: u16,
    pub protocol: IpProtocol,
    /// Raw IPv4 options; the length must be a multiple of 4.
    pub ip_options: Vec<u8>,

    pub src_port: u16,
    pub dst_port: u16,
    pub seq: i32,
    pub syn: bool,
    pub window: u16,
    /// Raw TCP options; the length must be a multiple of 4.
    pub tcp_options: Vec<u8>,
    pub payload: Vec<u8>,

    /// Zero bytes to append after the IP datagram, as a NIC pads
    /// short frames.
    pub eth_pad: usize,
}

impl Default for TcpFrame {
    fn default() -> Self {
        Self {
            eth_src: [0xA8, 0x40, 0x25, 0xFA, 0xFA, 0x37],
            eth_dst: [0xA8, 0x40, 0x25, 0xFF, 0x77, 0x77],
            ether_type: 0x0800,
            src: Ipv4Address::new(192, 168, 1, 10),
            dst: Ipv4Address::new(93, 184, 216, 34),
            ttl: 64,
            ident: 0x1C46,
            dont_frag: true,
            more_frags: false,
            frag_offset: 0,
            protocol: IpProtocol::Tcp,
            ip_options: vec![],
            src_port: 49154,
            dst_port: 443,
            seq: 0x1234_5678,
            syn: true,
            window: 29200,
            tcp_options: vec![],
            payload: vec![],
            eth_pad: 0,
        }
    }
}

impl TcpFrame {
    pub fn ip_hdr_len(&self) -> usize {
        IP_HDR_LEN + self.ip_options.len()
    }

    pub fn tcp_hdr_len(&self) -> usize {
        TCP_HDR_LEN + self.tcp_options.len()
    }

    /// The IPv4 total length.
    pub fn total_len(&self) -> usize {
        self.ip_hdr_len() + self.tcp_hdr_len() + self.payload.len()
    }

    /// Offset of the TCP header within the built frame.
    pub fn tcp_offset(&self) -> usize {
        ETH_HDR_LEN + self.ip_hdr_len()
    }

    /// Serialize the frame, filling in both checksums.
    pub fn build(&self) -> Vec<u8> {
        assert_eq!(self.ip_options.len() % 4, 0, "IP options not aligned");
        assert_eq!(self.tcp_options.len() % 4, 0, "TCP options not aligned");

        let ip_end = ETH_HDR_LEN + self.total_len();
        let mut buf = vec![0u8; ip_end + self.eth_pad];

        let mut eth = EthernetFrame::new_unchecked(&mut buf[..]);
        eth.set_dst_addr(EthernetAddress(self.eth_dst));
        eth.set_src_addr(EthernetAddress(self.eth_src));
        eth.set_ethertype(EthernetProtocol::from(self.ether_type));

        let mut ip = Ipv4Packet::new_unchecked(&mut buf[ETH_HDR_LEN..ip_end]);
        ip.set_version(4);
        ip.set_header_len(self.ip_hdr_len() as u8);
        ip.set_dscp(0);
        ip.set_ecn(0);
        ip.set_total_len(self.total_len() as u16);
        ip.set_ident(self.ident);
        ip.clear_flags();
        ip.set_dont_frag(self.dont_frag);
        ip.set_more_frags(self.more_frags);
        ip.set_frag_offset(self.frag_offset);
        ip.set_hop_limit(self.ttl);
        ip.set_next_header(self.protocol);
        ip.set_src_addr(self.src);
        ip.set_dst_addr(self.dst);
        buf[ETH_HDR_LEN + IP_HDR_LEN..][..self.ip_options.len()]
            .copy_from_slice(&self.ip_options);
        Ipv4Packet::new_unchecked(&mut buf[ETH_HDR_LEN..ip_end])
            .fill_checksum();

        let tcp_off = self.tcp_offset();
        let mut tcp = TcpPacket::new_unchecked(&mut buf[tcp_off..ip_end]);
        tcp.set_src_port(self.src_port);
        tcp.set_dst_port(self.dst_port);
        tcp.set_seq_number(TcpSeqNumber(self.seq));
        tcp.set_ack_number(TcpSeqNumber(0));
        tcp.set_header_len(self.tcp_hdr_len() as u8);
        tcp.clear_flags();
        tcp.set_syn(self.syn);
        tcp.set_ack(!self.syn);
        tcp.set_psh(!self.payload.is_empty());
        tcp.set_window_len(self.window);
        tcp.set_urgent_at(0);

        let opts_off = tcp_off + TCP_HDR_LEN;
        buf[opts_off..][..self.tcp_options.len()]
            .copy_from_slice(&self.tcp_options);
        let payload_off = tcp_off + self.tcp_hdr_len();
        buf[payload_off..ip_end].copy_from_slice(&self.payload);

        TcpPacket::new_unchecked(&mut buf[tcp_off..ip_end]).fill_checksum(
            &IpAddress::Ipv4(self.src),
            &IpAddress::Ipv4(self.dst),
        );

        buf
    }
}

/// The options a Windows host puts in its SYN: MSS, NOP, window
/// scale, NOP, NOP, SACK permitted.
pub const SYN_OPTIONS: [u8; 12] = [
    0x02, 0x04, 0x05, 0xB4, 0x01, 0x03, 0x03, 0x08, 0x01, 0x01, 0x04, 0x02,
];

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Bounds validation of the headers we rewrite.
//!
//! [`validate()`] walks a cursor from the Ethernet header to the TCP
//! header, checking that each header fits before the end of the view
//! before it is read. A length field is only trusted after the header
//! carrying it has been checked. Classification is interleaved with
//! the walk so that a frame we would not rewrite is never read any
//! further than needed to say so.
//!
//! The walk is a fixed sequence of steps with no loops: IP and TCP
//! options are skipped over using their length fields, never parsed.

use super::classify::NotApplicable;
use super::classify::classify_ether;
use super::classify::classify_ipv4;
use super::ether::ETHER_HDR_SZ;
use super::ether::EtherHdr;
use super::frame::FrameView;
use super::frame::Layer;
use super::frame::Span;
use super::frame::Truncated;
use super::ip4::IPV4_HDR_SZ;
use super::ip4::IPV4_MIN_IHL;
use super::ip4::IPV4_VERSION;
use super::ip4::Ipv4Hdr;
use super::tcp::TCP_HDR_SZ;
use super::tcp::TCP_MIN_DATA_OFFSET;
use super::tcp::TcpHdr;
use core::fmt;
use core::fmt::Display;

/// A frame which claims IPv4/TCP but whose headers contradict
/// themselves.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Malformed {
    /// IPv4 ethertype, but the version nibble is not 4.
    Version(u8),

    /// The IHL is below the minimum of 5 words.
    Ihl(u8),

    /// The IPv4 total length cannot hold the IPv4 and TCP headers.
    TotalLen { total_len: usize, min: usize },

    /// The TCP data offset is below the minimum of 5 words.
    DataOffset(u8),
}

impl Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Version(v) => write!(f, "bad IP version: {v}"),
            Self::Ihl(ihl) => write!(f, "bad IHL: {ihl}"),
            Self::TotalLen { total_len, min } => {
                write!(f, "total length {total_len} below minimum {min}")
            }
            Self::DataOffset(off) => write!(f, "bad TCP data offset: {off}"),
        }
    }
}

/// Why a frame is not a rewrite candidate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    Truncated(Layer, Truncated),
    NotApplicable(NotApplicable),
    Malformed(Malformed),
}

impl From<NotApplicable> for ParseError {
    fn from(na: NotApplicable) -> Self {
        Self::NotApplicable(na)
    }
}

impl From<Malformed> for ParseError {
    fn from(m: Malformed) -> Self {
        Self::Malformed(m)
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Truncated(layer, t) => write!(f, "truncated {layer}: {t}"),
            Self::NotApplicable(na) => write!(f, "{na}"),
            Self::Malformed(m) => write!(f, "malformed: {m}"),
        }
    }
}

/// The validated regions of an IPv4/TCP frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Candidate {
    /// The fixed IPv4 header.
    pub ip: Span,

    /// The IPv4 header including options, `ihl * 4` bytes.
    pub ip_full: Span,

    /// The fixed TCP header.
    pub tcp: Span,

    /// The TCP segment as described by the IPv4 total length, header
    /// and payload, if it lies wholly within the view. Only looked
    /// for when asked.
    pub segment: Option<Span>,
}

fn truncated(layer: Layer) -> impl Fn(Truncated) -> ParseError {
    move |t| ParseError::Truncated(layer, t)
}

/// Validate that `view` holds an unfragmented IPv4/TCP packet whose
/// headers fit, and return where they are.
///
/// With `want_segment`, also check whether the whole TCP segment is
/// present, as needed to recompute its checksum.
pub fn validate(
    view: &FrameView,
    want_segment: bool,
) -> Result<Candidate, ParseError> {
    let eth = view.header::<EtherHdr>(0).map_err(truncated(Layer::Ether))?;
    classify_ether(eth)?;

    let ip_off = ETHER_HDR_SZ;
    let ip_span =
        view.fits(ip_off, IPV4_HDR_SZ).map_err(truncated(Layer::Ipv4))?;
    let ip = view.header::<Ipv4Hdr>(ip_off).map_err(truncated(Layer::Ipv4))?;

    if ip.version() != IPV4_VERSION {
        return Err(Malformed::Version(ip.version()).into());
    }

    if ip.ihl() < IPV4_MIN_IHL {
        return Err(Malformed::Ihl(ip.ihl()).into());
    }

    classify_ipv4(ip)?;

    let ip_hdr_len = ip.hdr_len();
    let ip_full =
        view.fits(ip_off, ip_hdr_len).map_err(truncated(Layer::Ipv4))?;

    let min = ip_hdr_len + TCP_HDR_SZ;
    if ip.total_len() < min {
        let total_len = ip.total_len();
        return Err(Malformed::TotalLen { total_len, min }.into());
    }

    let tcp_off = ip_full.end();
    let tcp_span =
        view.fits(tcp_off, TCP_HDR_SZ).map_err(truncated(Layer::Tcp))?;
    let tcp = view.header::<TcpHdr>(tcp_off).map_err(truncated(Layer::Tcp))?;

    if tcp.data_offset() < TCP_MIN_DATA_OFFSET {
        return Err(Malformed::DataOffset(tcp.data_offset()).into());
    }

    let segment = if want_segment {
        view.fits(tcp_off, ip.total_len() - ip_hdr_len).ok()
    } else {
        None
    };

    Ok(Candidate { ip: ip_span, ip_full, tcp: tcp_span, segment })
}

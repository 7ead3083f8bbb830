// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types for calculating the internet checksum.
//!
//! The [`Checksum`] type is a rolling one's complement sum. It lets us
//! build up (or incrementally adjust) a sum and fold the carries only
//! once, when it is finalized into a [`HeaderChecksum`]: the value as
//! it is stored in the header, i.e. with one's complement applied.
//!
//! # Checksums and Endianness
//!
//! The one's complement sum is byte-order independent (RFC 1071
//! §1.B). Every 16-bit word summed here is read in network order and
//! the result is stored back in network order, so the logical `u16`
//! values used throughout this module are the big-endian reading of
//! the header bytes. Nothing ever byte-swaps a checksum.
//!
//! # Incremental update
//!
//! When a handful of header words change, the stored checksum `HC` is
//! adjusted from the old and new value of each word, per RFC 1624
//! eqn. 3:
//!
//! ```text
//! HC' = ~(~HC + ~m + m')
//! ```
//!
//! When several words under the same checksum change, all of their
//! deltas are added to the one running sum and folded once at the
//! end. Updating field by field, finalizing in between, would
//! produce the same value mathematically but introduces the `-0`
//! ambiguity RFC 1624 warns about at every intermediate step.
//!
//! # Relevant RFCs
//!
//! * 1071 Computing the Internet Checksum
//!
//! * 1141 Incremental Updating of the Internet Checksum
//!
//! * 1624 Computation of the Internet Checksum via Incremental Update

use super::ip4::IPPROTO_TCP;
use super::ip4::IPV4_HDR_SZ;
use super::tcp::TCP_HDR_SZ;
use core::fmt;
use core::fmt::Display;

/// Byte offset of the checksum within an IPv4 header.
pub const IPV4_CSUM_OFFSET: usize = 10;
/// Byte offset of the checksum within a TCP header.
pub const TCP_CSUM_OFFSET: usize = 16;

/// A checksum could not be computed over the bytes given.
///
/// This is not expected given validated spans; callers fall back to
/// another method rather than fail the frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChecksumError {
    /// The region is shorter than the header it should contain.
    Short { needed: usize, got: usize },

    /// The TCP segment is longer than its pseudo-header can express.
    TooLong(usize),
}

impl Display for ChecksumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Short { needed, got } => {
                write!(f, "need {needed} bytes to checksum, got {got}")
            }
            Self::TooLong(len) => write!(f, "segment too long: {len}"),
        }
    }
}

/// The checksum value, as it is contained in a network header.
///
/// This is meant to hold the bytes as they are stored in the header
/// itself. Notably, it contains the bytes with one's complement
/// applied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderChecksum {
    inner: [u8; 2],
}

impl HeaderChecksum {
    /// Return the bytes of this header checksum.
    pub fn bytes(&self) -> [u8; 2] {
        self.inner
    }

    /// Return the big-endian reading of the header bytes.
    pub fn value(&self) -> u16 {
        u16::from_be_bytes(self.inner)
    }

    /// Wrap the checksum bytes in a header.
    ///
    /// NOTE: The "wrap" verbiage is meant to make it clear that we are
    /// wrapping a pair of bytes which represent a header checksum --
    /// i.e., the one's complement of a one's complement sum.
    pub fn wrap(hc: [u8; 2]) -> Self {
        Self { inner: hc }
    }
}

impl From<Checksum> for HeaderChecksum {
    /// Finalize the rolling checksum and put it into header form by
    /// performing one's complement.
    fn from(mut csum: Checksum) -> HeaderChecksum {
        Self { inner: (!csum.finalize()).to_be_bytes() }
    }
}

/// A rolling one's complement checksum calculation.
///
/// Carries are accumulated in a 64-bit counter and only folded when
/// the sum is finalized. The counter cannot overflow for any input an
/// IPv4 total length can describe.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Checksum {
    inner: u64,
}

impl Checksum {
    /// Creates a new checksum counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new rolling checksum, starting with the passed in
    /// `bytes`.
    pub fn compute(bytes: &[u8]) -> Self {
        let mut csum = Self::new();
        csum.add_bytes(bytes);
        csum
    }

    /// Update the sum by adding the contents of `bytes`.
    ///
    /// A trailing odd byte is padded with zero on the right, per RFC
    /// 1071.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        let mut words = bytes.chunks_exact(2);
        for w in &mut words {
            self.add_word(u16::from_be_bytes([w[0], w[1]]));
        }

        if let [last] = words.remainder() {
            self.add_word(u16::from_be_bytes([*last, 0]));
        }
    }

    /// Add a single 16-bit word to the sum.
    pub fn add_word(&mut self, word: u16) {
        self.inner += u64::from(word);
    }

    /// Remove a single 16-bit word from the sum, by adding its one's
    /// complement.
    pub fn sub_word(&mut self, word: u16) {
        self.inner += u64::from(!word);
    }

    /// Finalize the sum by adding up all the accumulated carries and
    /// returning the resulting value as a `u16`.
    pub fn finalize(&mut self) -> u16 {
        while (self.inner >> 16) != 0 {
            self.inner = (self.inner >> 16) + (self.inner & 0xFFFF);
        }

        self.inner as u16
    }
}

impl From<HeaderChecksum> for Checksum {
    // Convert a header's checksum bytes into a rolling checksum.
    fn from(hc: HeaderChecksum) -> Self {
        Self { inner: u64::from(!hc.value()) }
    }
}

impl core::ops::Add for Checksum {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self { inner: self.inner + other.inner }
    }
}

impl core::ops::AddAssign for Checksum {
    fn add_assign(&mut self, other: Self) {
        self.inner += other.inner
    }
}

/// The old and new value of one 16-bit word under a checksum.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WordChange {
    pub old: u16,
    pub new: u16,
}

impl WordChange {
    pub fn new(old: u16, new: u16) -> Self {
        Self { old, new }
    }
}

/// Update the stored checksum `old_csum` for one word changing from
/// `old` to `new`.
///
/// This is RFC 1624 eqn. 3 and is the only arithmetic used to adjust
/// a checksum in place.
pub fn update_checksum(old_csum: u16, old: u16, new: u16) -> u16 {
    update_checksum_all(old_csum, [WordChange::new(old, new)])
}

/// Update the stored checksum `old_csum` for every word in `changes`,
/// summing all deltas before a single fold.
pub fn update_checksum_all<I>(old_csum: u16, changes: I) -> u16
where
    I: IntoIterator<Item = WordChange>,
{
    let stored = HeaderChecksum::wrap(old_csum.to_be_bytes());
    let mut csum = Checksum::from(stored);
    for change in changes {
        csum.sub_word(change.old);
        csum.add_word(change.new);
    }
    HeaderChecksum::from(csum).value()
}

/// Compute the checksum of an IPv4 header from scratch.
///
/// `hdr` is the full header, options included. The stored checksum
/// bytes are skipped, as if they were zero.
pub fn ipv4_checksum(hdr: &[u8]) -> Result<u16, ChecksumError> {
    let (head, tail) = split_around_csum(hdr, IPV4_HDR_SZ, IPV4_CSUM_OFFSET)?;
    let mut csum = Checksum::compute(head);
    csum.add_bytes(tail);
    Ok(HeaderChecksum::from(csum).value())
}

/// Compute the checksum of a TCP segment from scratch.
///
/// `segment` is the TCP header, options, and payload. The stored
/// checksum bytes are skipped, as if they were zero.
pub fn tcp_checksum(
    src: [u8; 4],
    dst: [u8; 4],
    segment: &[u8],
) -> Result<u16, ChecksumError> {
    let (head, tail) =
        split_around_csum(segment, TCP_HDR_SZ, TCP_CSUM_OFFSET)?;
    let mut csum = pseudo_hdr(src, dst, segment.len())?;
    csum.add_bytes(head);
    csum.add_bytes(tail);
    Ok(HeaderChecksum::from(csum).value())
}

/// Does the IPv4 header `hdr` carry a correct checksum?
pub fn verify_ipv4(hdr: &[u8]) -> bool {
    if hdr.len() < IPV4_HDR_SZ {
        return false;
    }

    Checksum::compute(hdr).finalize() == 0xFFFF
}

/// Does the TCP `segment` carry a correct checksum?
pub fn verify_tcp(src: [u8; 4], dst: [u8; 4], segment: &[u8]) -> bool {
    if segment.len() < TCP_HDR_SZ {
        return false;
    }

    match pseudo_hdr(src, dst, segment.len()) {
        Ok(mut csum) => {
            csum.add_bytes(segment);
            csum.finalize() == 0xFFFF
        }
        Err(_) => false,
    }
}

fn pseudo_hdr(
    src: [u8; 4],
    dst: [u8; 4],
    seg_len: usize,
) -> Result<Checksum, ChecksumError> {
    let len = u16::try_from(seg_len)
        .map_err(|_| ChecksumError::TooLong(seg_len))?;
    let mut csum = Checksum::compute(&src);
    csum.add_bytes(&dst);
    csum.add_word(u16::from(IPPROTO_TCP));
    csum.add_word(len);
    Ok(csum)
}

// Split `bytes` into the part before and after the two checksum bytes
// at `offset`.
fn split_around_csum(
    bytes: &[u8],
    min_len: usize,
    offset: usize,
) -> Result<(&[u8], &[u8]), ChecksumError> {
    let short = ChecksumError::Short { needed: min_len, got: bytes.len() };
    if bytes.len() < min_len {
        return Err(short);
    }

    let head = bytes.get(..offset).ok_or(short)?;
    let tail = bytes.get(offset + 2..).ok_or(short)?;
    Ok((head, tail))
}

#[cfg(test)]
mod test {
    use super::*;

    // Example header from RFC 1071 §3 / countless textbooks, checksum
    // 0xB861.
    #[rustfmt::skip]
    const IP_HDR: [u8; 20] = [
        0x45, 0x00, 0x00, 0x73,
        0x00, 0x00, 0x40, 0x00,
        0x40, 0x11, 0xB8, 0x61,
        0xC0, 0xA8, 0x00, 0x01,
        0xC0, 0xA8, 0x00, 0xC7,
    ];

    #[test]
    fn full_ipv4() {
        assert_eq!(ipv4_checksum(&IP_HDR), Ok(0xB861));
        assert!(verify_ipv4(&IP_HDR));

        let mut bad = IP_HDR;
        bad[8] = 0x3F;
        assert!(!verify_ipv4(&bad));
    }

    #[test]
    fn incremental_matches_full() {
        let mut hdr = IP_HDR;
        let old = u16::from_be_bytes([hdr[8], hdr[9]]);
        hdr[8] = 0x80;
        let new = u16::from_be_bytes([hdr[8], hdr[9]]);

        let updated = update_checksum(0xB861, old, new);
        assert_eq!(Ok(updated), ipv4_checksum(&hdr));

        hdr[10..12].copy_from_slice(&updated.to_be_bytes());
        assert!(verify_ipv4(&hdr));
    }

    #[test]
    fn incremental_sums_deltas_once() {
        let mut hdr = IP_HDR;
        let ttl = WordChange::new(0x4011, 0x8011);
        let ident = WordChange::new(0x0000, 0xBEEF);
        hdr[8] = 0x80;
        hdr[4..6].copy_from_slice(&[0xBE, 0xEF]);

        let all = update_checksum_all(0xB861, [ttl, ident]);
        assert_eq!(Ok(all), ipv4_checksum(&hdr));

        // Chaining single updates agrees.
        let chained = update_checksum(
            update_checksum(0xB861, ttl.old, ttl.new),
            ident.old,
            ident.new,
        );
        assert_eq!(all, chained);
    }

    #[test]
    fn incremental_no_change_is_identity() {
        assert_eq!(update_checksum(0xB861, 0x4011, 0x4011), 0xB861);
        assert_eq!(update_checksum_all(0x1234, []), 0x1234);
    }

    // RFC 1624 §4 example: a header whose sum lands on 0xFFFF must
    // never be updated to the non-canonical 0xFFFF checksum via eqn. 2;
    // eqn. 3 yields 0x0000.
    #[test]
    fn rfc1624_example() {
        assert_eq!(update_checksum(0xDD2F, 0x5555, 0x3285), 0x0000);
    }

    #[test]
    fn odd_length_pads_right() {
        let mut csum = Checksum::compute(&[0x01]);
        assert_eq!(csum.finalize(), 0x0100);
    }

    #[test]
    fn tcp_round_trip() {
        let src = [10, 0, 0, 1];
        let dst = [10, 0, 0, 2];
        #[rustfmt::skip]
        let mut seg = [
            0x04, 0xD2, 0x00, 0x50,
            0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x00,
            0x50, 0x02, 0x72, 0x10,
            0x00, 0x00, 0x00, 0x00,
            // payload, odd length
            0x68, 0x69, 0x21,
        ];

        let csum = tcp_checksum(src, dst, &seg).unwrap();
        seg[16..18].copy_from_slice(&csum.to_be_bytes());
        assert!(verify_tcp(src, dst, &seg));

        // Window 29200 -> 64240, incrementally.
        let updated = update_checksum(csum, 0x7210, 0xFAF0);
        seg[14..16].copy_from_slice(&[0xFA, 0xF0]);
        seg[16..18].copy_from_slice(&updated.to_be_bytes());
        assert!(verify_tcp(src, dst, &seg));
        assert_eq!(tcp_checksum(src, dst, &seg), Ok(updated));
    }

    #[test]
    fn short_input() {
        assert_eq!(
            ipv4_checksum(&IP_HDR[..12]),
            Err(ChecksumError::Short { needed: 20, got: 12 })
        );
        assert!(tcp_checksum([0; 4], [0; 4], &[0; 19]).is_err());
        assert!(!verify_tcp([0; 4], [0; 4], &[0; 4]));
        assert!(!verify_ipv4(&[]));
    }
}

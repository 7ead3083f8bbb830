// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! A bounds-checked window over a single frame.
//!
//! A [`FrameView`] borrows the frame buffer for the duration of one
//! processing call. It carries an origin and an end, mirroring the
//! `data`/`data_end` pair a datapath hook is given, and it is the only
//! way the engine touches frame bytes. Every access is expressed as an
//! offset relative to the origin plus a length, and is checked against
//! the end before any byte is read: there is no raw pointer arithmetic
//! and no way to reach a byte outside of `[origin, end)`.

use core::fmt;
use core::fmt::Display;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

/// The header a bounds check was guarding.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Layer {
    Ether,
    Ipv4,
    Tcp,
}

impl Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Ether => "Ethernet",
            Self::Ipv4 => "IPv4",
            Self::Tcp => "TCP",
        };
        write!(f, "{s}")
    }
}

/// A required region does not fit before the end of the frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Truncated {
    /// Offset of the region, relative to the view's origin.
    pub offset: usize,
    /// Bytes the region needs.
    pub needed: usize,
    /// Bytes available between the offset and the end.
    pub avail: usize,
}

impl Display for Truncated {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "need {} bytes at offset {}, only {} available",
            self.needed, self.offset, self.avail
        )
    }
}

/// The origin/end pair handed to [`FrameView::with_bounds()`] does
/// not describe a region of the buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BadBounds {
    pub origin: usize,
    pub end: usize,
    pub buf_len: usize,
}

impl Display for BadBounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "bounds [{}, {}) do not lie within a {}-byte buffer",
            self.origin, self.end, self.buf_len
        )
    }
}

/// A region of a frame known to fit before its end.
///
/// A span is only produced by [`FrameView::fits()`], after the check
/// has passed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Span {
    offset: usize,
    len: usize,
}

impl Span {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// The offset of the first byte following this span.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// A bounds-aware read/write window over a frame buffer.
#[derive(Debug)]
pub struct FrameView<'a> {
    // Only `buf[origin..end]` is ever handed out.
    buf: &'a mut [u8],
    origin: usize,
    end: usize,
}

impl<'a> FrameView<'a> {
    /// Create a view covering all of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        let end = buf.len();
        Self { buf, origin: 0, end }
    }

    /// Create a view covering `buf[origin..end]`.
    ///
    /// The bytes outside of that range are never read or written.
    pub fn with_bounds(
        buf: &'a mut [u8],
        origin: usize,
        end: usize,
    ) -> Result<Self, BadBounds> {
        if origin > end || end > buf.len() {
            return Err(BadBounds { origin, end, buf_len: buf.len() });
        }

        Ok(Self { buf, origin, end })
    }

    /// The number of bytes between origin and end.
    pub fn len(&self) -> usize {
        self.end - self.origin
    }

    /// Check that `len` bytes at `offset` (relative to the origin)
    /// fit before the end of the frame.
    ///
    /// This is the only place a [`Span`] is minted.
    pub fn fits(&self, offset: usize, len: usize) -> Result<Span, Truncated> {
        let avail = self.len().saturating_sub(offset);

        match offset.checked_add(len) {
            Some(span_end) if span_end <= self.len() => {
                Ok(Span { offset, len })
            }
            _ => Err(Truncated { offset, needed: len, avail }),
        }
    }

    /// The bytes covered by `span`.
    pub fn bytes(&self, span: Span) -> Result<&[u8], Truncated> {
        let (start, end) = self.absolute(span)?;
        self.buf.get(start..end).ok_or(self.truncated(span))
    }

    /// The bytes covered by `span`, for writing.
    pub fn bytes_mut(&mut self, span: Span) -> Result<&mut [u8], Truncated> {
        let (start, end) = self.absolute(span)?;
        let err = self.truncated(span);
        self.buf.get_mut(start..end).ok_or(err)
    }

    /// Read a header of type `H` at `offset`.
    pub fn header<H>(&self, offset: usize) -> Result<&H, Truncated>
    where
        H: FromBytes + KnownLayout + Immutable + Unaligned,
    {
        let span = self.fits(offset, size_of::<H>())?;
        let bytes = self.bytes(span)?;
        H::ref_from_bytes(bytes).map_err(|_| self.truncated(span))
    }

    /// Read a header of type `H` at `offset`, for writing.
    pub fn header_mut<H>(&mut self, offset: usize) -> Result<&mut H, Truncated>
    where
        H: FromBytes + IntoBytes + KnownLayout + Unaligned,
    {
        let span = self.fits(offset, size_of::<H>())?;
        let err = self.truncated(span);
        let bytes = self.bytes_mut(span)?;
        H::mut_from_bytes(bytes).map_err(|_| err)
    }

    /// Borrow two disjoint headers for writing at once: `A` at the
    /// start of `first` and `B` at the start of `second`.
    ///
    /// `first` must end at or before the start of `second`.
    pub fn header_pair_mut<A, B>(
        &mut self,
        first: Span,
        second: Span,
    ) -> Result<(&mut A, &mut B), Truncated>
    where
        A: FromBytes + IntoBytes + KnownLayout + Unaligned,
        B: FromBytes + IntoBytes + KnownLayout + Unaligned,
    {
        let err = self.truncated(second);
        if first.end() > second.offset {
            return Err(err);
        }

        let joined = self.fits(first.offset, second.end() - first.offset)?;
        let bytes = self.bytes_mut(joined)?;
        let (a, b) = bytes.split_at_mut(second.offset - first.offset);

        let (a, _) = A::mut_from_prefix(a).map_err(|_| err)?;
        let (b, _) = B::mut_from_prefix(b).map_err(|_| err)?;
        Ok((a, b))
    }

    fn absolute(&self, span: Span) -> Result<(usize, usize), Truncated> {
        // Re-check: a span minted by another, longer view must not
        // reach past this one.
        let checked = self.fits(span.offset, span.len)?;
        Ok((self.origin + checked.offset, self.origin + checked.end()))
    }

    fn truncated(&self, span: Span) -> Truncated {
        Truncated {
            offset: span.offset,
            needed: span.len,
            avail: self.len().saturating_sub(span.offset),
        }
    }
}

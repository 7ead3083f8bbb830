// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! stackmask: outbound IPv4/TCP fingerprint rewriting.
//!
//! The [`engine`] takes a raw Ethernet frame on its way out and, when
//! it carries IPv4/TCP, rewrites the TTL, IP identification, and TCP
//! window so the frame looks like it came from a different operating
//! system's stack, keeping both checksums valid. The per-frame path
//! is bounded, allocation-free, and never panics: anything it does
//! not fully understand is passed through untouched.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "engine", test))]
extern crate alloc;

#[cfg(any(feature = "api", test))]
pub mod api;
#[cfg(any(feature = "engine", test))]
pub mod dynamic;
#[cfg(any(feature = "engine", test))]
pub mod engine;
#[cfg(any(feature = "std", test))]
pub mod print;
#[cfg(any(feature = "engine", test))]
pub mod provider;

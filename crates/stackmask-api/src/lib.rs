// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

#![no_std]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
extern crate alloc;

pub mod cfg;
pub mod preset;
pub mod profile;
pub mod stat;
pub mod verdict;

pub use cfg::*;
pub use preset::*;
pub use profile::*;
pub use stat::*;
pub use verdict::*;

/// The overall version of the API. Anytime the profile layout or any
/// other shared type changes, this number should increment. A control
/// plane compiled against a different version must not write the
/// profile map.
pub const API_VERSION: u64 = 1;

/// Major version of the stackmask package.
pub const MAJOR_VERSION: u64 = 0;

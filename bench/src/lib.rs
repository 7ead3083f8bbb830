// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Frame corpora shared by the benchmarks.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use stackmask_test_utils::TcpFrame;
use stackmask_test_utils::frame::SYN_OPTIONS;

/// TCP payload sizes to benchmark: a bare ACK, a default-MSS
/// segment, and a full Ethernet-MTU segment.
pub const PAYLOAD_SIZES: [usize; 3] = [0, 536, 1460];

/// A frame carrying `payload_len` bytes of TCP payload.
pub fn tcp_frame(payload_len: usize) -> Vec<u8> {
    TcpFrame {
        syn: payload_len == 0,
        tcp_options: SYN_OPTIONS.to_vec(),
        payload: vec![0x61; payload_len],
        ..Default::default()
    }
    .build()
}

/// A fixed-seed batch of frames with differing TTL, identification,
/// and window, so that no two runs rewrite the same words.
pub fn mixed_frames(count: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(0xBE7C_0001);
    (0..count)
        .map(|_| {
            TcpFrame {
                ttl: rng.random_range(1..=255),
                ident: rng.random(),
                window: rng.random(),
                payload: vec![0x61; rng.random_range(0..=1460)],
                ..Default::default()
            }
            .build()
        })
        .collect()
}

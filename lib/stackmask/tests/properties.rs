// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Randomized checks of checksum validity and idempotence.
//!
//! Every run uses a fixed seed so a failure can be reproduced.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use stackmask::engine::checksum::ipv4_checksum;
use stackmask::engine::checksum::update_checksum;
use stackmask::engine::checksum::update_checksum_all;
use stackmask::engine::checksum::verify_ipv4;
use stackmask::engine::checksum::WordChange;
use stackmask_test_utils::*;

const ITERATIONS: usize = 2_000;

fn random_frame(rng: &mut StdRng) -> TcpFrame {
    let ip_words = rng.random_range(0..=10);
    let tcp_words = rng.random_range(0..=10);

    TcpFrame {
        src: Ipv4Address::from_bytes(&rng.random::<[u8; 4]>()),
        dst: Ipv4Address::from_bytes(&rng.random::<[u8; 4]>()),
        ttl: rng.random_range(1..=255),
        ident: rng.random(),
        dont_frag: rng.random_bool(0.5),
        ip_options: vec![0x01; ip_words * 4],
        src_port: rng.random(),
        dst_port: rng.random(),
        seq: rng.random(),
        syn: rng.random_bool(0.5),
        window: rng.random(),
        tcp_options: vec![0x01; tcp_words * 4],
        payload: (0..rng.random_range(0..300)).map(|_| rng.random()).collect(),
        eth_pad: rng.random_range(0..8),
        ..Default::default()
    }
}

fn random_profile(rng: &mut StdRng, frame: &TcpFrame) -> MutationProfile {
    let hint = match rng.random_range(0..3) {
        0 => 0,
        1 => frame.ttl,
        _ => rng.random(),
    };
    let ident = if rng.random_bool(0.5) { 0 } else { rng.random() };
    let mode = if rng.random_bool(0.5) {
        ChecksumMode::Full
    } else {
        ChecksumMode::Incremental
    };

    MutationProfile::new(rng.random_range(1..=255), rng.random_range(1..=65535))
        .with_source_ttl_hint(hint)
        .with_ident(ident)
        .with_checksum(mode)
}

#[test]
fn masked_frames_verify() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0001);

    for i in 0..ITERATIONS {
        let spec = random_frame(&mut rng);
        let profile = random_profile(&mut rng, &spec);
        let mut frame = spec.build();

        let o = mask(&mut frame, &profile);
        assert_eq!(o.verdict, Verdict::PassMutated, "iteration {i}: {o}");
        assert!(
            verify_frame(&frame).unwrap().ok(),
            "iteration {i}: {spec:?} under {profile}"
        );

        let fp = fingerprint(&frame).unwrap();
        assert_eq!(fp.window, profile.target_window, "iteration {i}");
        if profile.rewrites_ttl(spec.ttl) {
            assert_eq!(fp.ttl, profile.target_ttl, "iteration {i}");
        } else {
            assert_eq!(fp.ttl, spec.ttl, "iteration {i}");
        }
        if profile.rewrites_ident() {
            assert_eq!(fp.ident, profile.target_ident, "iteration {i}");
        } else {
            assert_eq!(fp.ident, spec.ident, "iteration {i}");
        }
    }
}

#[test]
fn idempotent() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0002);

    for i in 0..ITERATIONS {
        let spec = random_frame(&mut rng);
        let profile = random_profile(&mut rng, &spec);
        let mut frame = spec.build();

        mask(&mut frame, &profile);
        let once = frame.clone();
        mask(&mut frame, &profile);
        assert_eq!(frame, once, "iteration {i}: {spec:?} under {profile}");
    }
}

// Starting from valid checksums, both modes produce the same bytes.
#[test]
fn full_and_incremental_agree() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0003);

    for i in 0..ITERATIONS {
        let spec = random_frame(&mut rng);
        let profile = random_profile(&mut rng, &spec);

        let mut inc = spec.build();
        let mut full = inc.clone();
        mask(&mut inc, &profile.with_checksum(ChecksumMode::Incremental));
        mask(&mut full, &profile.with_checksum(ChecksumMode::Full));
        assert_eq!(inc, full, "iteration {i}: {spec:?} under {profile}");
    }
}

#[test]
fn update_matches_recompute() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0004);

    for i in 0..ITERATIONS {
        let mut hdr: [u8; 20] = rng.random();
        hdr[0] = 0x45;
        let csum = ipv4_checksum(&hdr).unwrap();
        hdr[10..12].copy_from_slice(&csum.to_be_bytes());
        assert!(verify_ipv4(&hdr));

        // Change one to three of the words outside of the checksum.
        let mut changes = vec![];
        for _ in 0..rng.random_range(1..=3) {
            let word = *[1, 2, 3, 4, 6, 7, 8, 9]
                .get(rng.random_range(0..8))
                .unwrap();
            let at = word * 2;
            let old = u16::from_be_bytes([hdr[at], hdr[at + 1]]);
            let new: u16 = rng.random();
            hdr[at..at + 2].copy_from_slice(&new.to_be_bytes());
            changes.push(WordChange::new(old, new));
        }

        let expected = ipv4_checksum(&hdr).unwrap();
        let all = update_checksum_all(csum, changes.iter().copied());
        let chained = changes
            .iter()
            .fold(csum, |acc, c| update_checksum(acc, c.old, c.new));
        assert_eq!(all, expected, "iteration {i}: {hdr:02X?}");
        assert_eq!(chained, expected, "iteration {i}: {hdr:02X?}");
    }
}

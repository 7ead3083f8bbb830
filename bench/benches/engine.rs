// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use criterion::BatchSize;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use stackmask::engine::checksum::WordChange;
use stackmask::engine::checksum::update_checksum_all;
use stackmask::engine::process_frame;
use stackmask_bench::PAYLOAD_SIZES;
use stackmask_bench::mixed_frames;
use stackmask_bench::tcp_frame;
use stackmask_test_utils::*;
use std::hint::black_box;

fn modes() -> [(&'static str, MutationProfile); 2] {
    let p = OsPreset::Windows.profile().with_ident(0x4242);
    [
        ("incremental", p.with_checksum(ChecksumMode::Incremental)),
        ("full", p.with_checksum(ChecksumMode::Full)),
    ]
}

// Every iteration rewrites a fresh copy, so all three fields change.
pub fn rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");

    for len in PAYLOAD_SIZES {
        let frame = tcp_frame(len);
        group.throughput(Throughput::Bytes(frame.len() as u64));

        for (name, profile) in modes() {
            group.bench_with_input(
                BenchmarkId::new(name, len),
                &frame,
                |b, frame| {
                    b.iter_batched_ref(
                        || frame.clone(),
                        |f| process_frame(black_box(f), Some(&profile)),
                        BatchSize::SmallInput,
                    )
                },
            );
        }
    }
}

// A frame already carrying the profile is validated but not written.
pub fn already_masked(c: &mut Criterion) {
    let mut group = c.benchmark_group("already-masked");

    for (name, profile) in modes() {
        let mut frame = tcp_frame(1460);
        process_frame(&mut frame, Some(&profile));

        group.bench_function(name, |b| {
            b.iter(|| process_frame(black_box(&mut frame), Some(&profile)))
        });
    }
}

pub fn pass_through(c: &mut Criterion) {
    let mut group = c.benchmark_group("pass-through");
    let profile = OsPreset::Windows.profile();

    let mut ipv6 =
        TcpFrame { ether_type: 0x86DD, ..Default::default() }.build();
    group.bench_function("not-ipv4", |b| {
        b.iter(|| process_frame(black_box(&mut ipv6), Some(&profile)))
    });

    let mut udp =
        TcpFrame { protocol: IpProtocol::Udp, ..Default::default() }.build();
    group.bench_function("not-tcp", |b| {
        b.iter(|| process_frame(black_box(&mut udp), Some(&profile)))
    });

    let mut frame = tcp_frame(0);
    group.bench_function("no-profile", |b| {
        b.iter(|| process_frame(black_box(&mut frame), None))
    });
}

pub fn masker_mixed(c: &mut Criterion) {
    let frames = mixed_frames(256);
    let m = Masker::new(Providers { log: Box::new(NullLog) });
    let _ = m.set_profile(OsPreset::Linux.profile().with_ident(0x0101));

    c.bench_function("masker/mixed-256", |b| {
        b.iter_batched_ref(
            || frames.clone(),
            |frames| {
                for f in frames.iter_mut() {
                    black_box(m.process(f));
                }
            },
            BatchSize::LargeInput,
        )
    });
}

pub fn checksum_update(c: &mut Criterion) {
    let changes = [
        WordChange::new(0x4006, 0x8006),
        WordChange::new(0x1C46, 0x4242),
    ];

    c.bench_function("checksum/update-two-words", |b| {
        b.iter(|| update_checksum_all(black_box(0xB861), black_box(changes)))
    });
}

criterion_group!(
    engine,
    rewrite,
    already_masked,
    pass_through,
    masker_mixed,
    checksum_update
);
criterion_main!(engine);

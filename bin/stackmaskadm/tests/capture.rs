// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Replaying captures written by the test pcap builder.

use stackmask::engine::Reason;
use stackmask_test_utils::MalformedPolicy;
use stackmask_test_utils::Masker;
use stackmask_test_utils::NullLog;
use stackmask_test_utils::OsPreset;
use stackmask_test_utils::Providers;
use stackmask_test_utils::TcpFrame;
use stackmask_test_utils::Verdict;
use stackmask_test_utils::fingerprint;
use stackmask_test_utils::masker;
use stackmask_test_utils::pcap::PcapBuilder;
use stackmask_test_utils::pcap::read_frames;
use stackmask_test_utils::verify_frame;
use stackmaskadm::Capture;
use stackmaskadm::FrameCheck;
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("stackmaskadm-{}-{name}.pcap", std::process::id()))
}

fn frames() -> Vec<Vec<u8>> {
    let tcp = TcpFrame::default().build();
    let arp = TcpFrame { ether_type: 0x0806, ..Default::default() }.build();
    let mut bad_doff = TcpFrame::default().build();
    bad_doff[14 + 20 + 12] = 0x30;
    let short = tcp[..30].to_vec();
    vec![tcp, arp, bad_doff, short]
}

fn write_capture(name: &str) -> PathBuf {
    let path = scratch(name);
    let mut pcap = PcapBuilder::new(&path);
    for f in frames() {
        pcap.add_frame(&f);
    }
    path
}

#[test]
fn rewrite_capture() {
    let input = write_capture("rewrite-in");
    let output = scratch("rewrite-out");

    let m = masker(Some(OsPreset::Windows.profile()));
    let cap = Capture::read(&input).unwrap();
    assert_eq!(cap.frames.len(), 4);

    let replay = stackmaskadm::replay(&m, cap);
    replay.passed.write(&output).unwrap();

    let verdicts: Vec<_> = replay.outcomes.iter().map(|o| o.verdict).collect();
    assert_eq!(
        verdicts,
        [
            Verdict::PassMutated,
            Verdict::PassUnchanged,
            Verdict::PassUnchanged,
            Verdict::PassUnchanged,
        ]
    );
    assert!(matches!(replay.outcomes[3].reason, Reason::Truncated(_)));
    assert_eq!(replay.stats.total(), 4);
    assert_eq!(replay.stats.mutated, 1);

    // Everything passes, and only the TCP frame has changed.
    let orig = frames();
    let out = read_frames(&output);
    assert_eq!(out.len(), 4);
    assert_ne!(out[0], orig[0]);
    assert_eq!(out[1..], orig[1..]);

    let fp = fingerprint(&out[0]).unwrap();
    assert_eq!((fp.ttl, fp.window), (128, 64240));
    assert!(verify_frame(&out[0]).unwrap().ok());

    std::fs::remove_file(input).unwrap();
    std::fs::remove_file(output).unwrap();
}

#[test]
fn rewrite_drops_malformed() {
    let input = write_capture("drop-in");
    let m = Masker::new(Providers { log: Box::new(NullLog) });
    let profile =
        OsPreset::Linux.profile().with_malformed(MalformedPolicy::Drop);
    m.set_profile(profile).unwrap();

    let replay = stackmaskadm::replay(&m, Capture::read(&input).unwrap());
    assert_eq!(replay.outcomes[2].verdict, Verdict::Drop);
    assert_eq!(replay.passed.frames.len(), 3);
    assert_eq!(replay.stats.dropped, 1);

    std::fs::remove_file(input).unwrap();
}

#[test]
fn verify_capture() {
    let input = write_capture("verify");
    let mut cap = Capture::read(&input).unwrap();

    let checks = stackmaskadm::verify(&cap);
    assert_eq!(checks[0], FrameCheck::Checked { ipv4: true, tcp: Some(true) });
    assert!(matches!(checks[1], FrameCheck::Skipped(_)));
    assert!(matches!(checks[2], FrameCheck::Skipped(_)));
    assert!(matches!(checks[3], FrameCheck::Skipped(_)));
    assert!(checks.iter().all(|c| !c.is_bad()));

    // Corrupt the IP checksum of the TCP frame.
    cap.frames[0].data[24] ^= 0xFF;
    let checks = stackmaskadm::verify(&cap);
    assert_eq!(checks[0], FrameCheck::Checked { ipv4: false, tcp: Some(true) });
    assert!(checks[0].is_bad());

    std::fs::remove_file(input).unwrap();
}

#[test]
fn round_trip() {
    let input = write_capture("round-trip");
    let cap = Capture::read(&input).unwrap();
    let bytes = cap.to_bytes().unwrap();
    assert_eq!(bytes, std::fs::read(&input).unwrap());
    assert_eq!(Capture::parse(&bytes).unwrap(), cap);

    std::fs::remove_file(input).unwrap();
}

#[test]
fn profile_cfg() {
    let path = std::env::temp_dir()
        .join(format!("stackmaskadm-{}-profile.toml", std::process::id()));
    std::fs::write(&path, "preset = \"macos\"\nsource_ttl_hint = 64\n")
        .unwrap();

    let cfg = stackmaskadm::load_cfg(&path).unwrap();
    let p = cfg.resolve().unwrap();
    assert_eq!(p, OsPreset::MacOs.profile().with_source_ttl_hint(64));

    std::fs::write(&path, "preset = \"macos\"\nbogus = 1\n").unwrap();
    assert!(stackmaskadm::load_cfg(&path).is_err());

    std::fs::remove_file(path).unwrap();
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Offline administration of stackmask profiles and captures.
//!
//! Everything here works on files: profile configs written in TOML,
//! and pcap captures replayed through a [`Masker`] in userland.

use anyhow::Context;
use anyhow::anyhow;
use anyhow::bail;
use pcap_parser::Linktype;
use pcap_parser::ToVec;
use pcap_parser::pcap;
use pcap_parser::pcap::LegacyPcapBlock;
use pcap_parser::pcap::PcapHeader;
use slog::Drain;
use stackmask::api::MaskStatsSnapshot;
use stackmask::api::ProfileCfg;
use stackmask::api::Verdict;
use stackmask::engine::FrameView;
use stackmask::engine::Masker;
use stackmask::engine::Outcome;
use stackmask::engine::checksum::verify_ipv4;
use stackmask::engine::checksum::verify_tcp;
use stackmask::engine::ip4::Ipv4Hdr;
use stackmask::engine::parse::ParseError;
use stackmask::engine::parse::validate;
use stackmask::provider::LogLevel;
use stackmask::provider::LogProvider;
use stackmask::provider::Providers;
use std::path::Path;

/// Build the root logger, filtered by `RUST_LOG`.
pub fn logger() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain);
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, slog::o!("component" => "stackmask"))
}

/// Route engine log messages into slog.
pub struct SlogLog(pub slog::Logger);

impl LogProvider for SlogLog {
    fn log(&self, level: LogLevel, msg: &str) {
        match level {
            LogLevel::Note => slog::info!(self.0, "{}", msg),
            LogLevel::Warn => slog::warn!(self.0, "{}", msg),
            LogLevel::Error => slog::error!(self.0, "{}", msg),
        }
    }
}

/// Create a masker which logs through `log`.
pub fn masker(log: &slog::Logger) -> Masker {
    Masker::new(Providers { log: Box::new(SlogLog(log.clone())) })
}

/// Read a profile config from the TOML file at `path`.
pub fn load_cfg(path: impl AsRef<Path>) -> anyhow::Result<ProfileCfg> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Parse a raw profile map value, in hex with a `0x` prefix or in
/// decimal.
pub fn parse_raw(s: &str) -> anyhow::Result<u64> {
    let s = s.trim().replace('_', "");
    let res = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    res.map_err(|e| anyhow!("invalid raw value {s:?}: {e}"))
}

/// One captured frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub ts_sec: u32,
    pub ts_usec: u32,

    /// The length of the frame on the wire, which may exceed what was
    /// captured.
    pub origlen: u32,
    pub data: Vec<u8>,
}

/// The frames of an Ethernet pcap capture.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Capture {
    pub snaplen: u32,
    pub frames: Vec<Frame>,
}

impl Capture {
    pub fn read(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&bytes)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(bytes: &[u8]) -> anyhow::Result<Self> {
        let (mut rest, hdr) = pcap::parse_pcap_header(bytes)
            .map_err(|e| anyhow!("bad pcap header: {e:?}"))?;

        if hdr.network != Linktype::ETHERNET {
            bail!("expected an Ethernet capture, got {:?}", hdr.network);
        }

        let mut frames = vec![];
        while !rest.is_empty() {
            let (next, block) = pcap::parse_pcap_frame(rest).map_err(|e| {
                anyhow!("bad pcap record {}: {e:?}", frames.len())
            })?;

            frames.push(Frame {
                ts_sec: block.ts_sec,
                ts_usec: block.ts_usec,
                origlen: block.origlen,
                data: block.data.to_vec(),
            });
            rest = next;
        }

        Ok(Self { snaplen: hdr.snaplen, frames })
    }

    pub fn write(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let mut hdr = PcapHeader {
            magic_number: 0xa1b2c3d4,
            version_major: 2,
            version_minor: 4,
            thiszone: 0,
            sigfigs: 0,
            snaplen: self.snaplen,
            network: Linktype::ETHERNET,
        };

        let mut out = hdr
            .to_vec()
            .map_err(|e| anyhow!("failed to serialize pcap header: {e:?}"))?;

        for (i, frame) in self.frames.iter().enumerate() {
            let mut block = LegacyPcapBlock {
                ts_sec: frame.ts_sec,
                ts_usec: frame.ts_usec,
                caplen: u32::try_from(frame.data.len())?,
                origlen: frame.origlen,
                data: &frame.data,
            };
            let rec = block
                .to_vec()
                .map_err(|e| anyhow!("failed to serialize frame {i}: {e:?}"))?;
            out.extend_from_slice(&rec);
        }

        Ok(out)
    }
}

/// The result of replaying a capture through a masker.
#[derive(Debug)]
pub struct Replay {
    /// The frames which were passed, mutated or not.
    pub passed: Capture,

    /// The outcome of every input frame, in order.
    pub outcomes: Vec<Outcome>,

    pub stats: MaskStatsSnapshot,
}

/// Run every frame of `cap` through `masker`.
///
/// Frames given a [`Verdict::Drop`] are left out of the returned
/// capture, as the dispatch layer would have done.
pub fn replay(masker: &Masker, cap: Capture) -> Replay {
    let mut outcomes = Vec::with_capacity(cap.frames.len());
    let mut frames = Vec::with_capacity(cap.frames.len());

    for mut frame in cap.frames {
        let mut view = FrameView::new(&mut frame.data);
        let outcome = masker.process_view(&mut view);
        if outcome.verdict != Verdict::Drop {
            frames.push(frame);
        }
        outcomes.push(outcome);
    }

    Replay {
        passed: Capture { snaplen: cap.snaplen, frames },
        outcomes,
        stats: masker.stats(),
    }
}

/// The checksum state of one captured frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameCheck {
    /// Not a whole IPv4/TCP frame, so nothing to check.
    Skipped(ParseError),

    /// `tcp` is `None` when the segment was not wholly captured.
    Checked { ipv4: bool, tcp: Option<bool> },
}

impl FrameCheck {
    /// Did any checksum fail to verify?
    pub fn is_bad(&self) -> bool {
        matches!(
            self,
            Self::Checked { ipv4: false, .. }
                | Self::Checked { tcp: Some(false), .. }
        )
    }
}

/// Verify the IPv4 and TCP checksums of `frame`.
pub fn check_frame(frame: &[u8]) -> FrameCheck {
    // The view wants a mutable buffer; never hand it the caller's.
    let mut buf = frame.to_vec();
    let view = FrameView::new(&mut buf);

    let c = match validate(&view, true) {
        Ok(c) => c,
        Err(e) => return FrameCheck::Skipped(e),
    };

    let ip = view.header::<Ipv4Hdr>(c.ip.offset());
    let (ipv4, addrs) = match (view.bytes(c.ip_full), ip) {
        (Ok(hdr), Ok(ip)) => (verify_ipv4(hdr), Some((ip.src, ip.dst))),
        _ => (false, None),
    };

    let tcp = match (c.segment, addrs) {
        (Some(seg), Some((src, dst))) => {
            view.bytes(seg).ok().map(|seg| verify_tcp(src, dst, seg))
        }
        _ => None,
    };

    FrameCheck::Checked { ipv4, tcp }
}

/// Verify every frame of `cap`.
pub fn verify(cap: &Capture) -> Vec<FrameCheck> {
    cap.frames.iter().map(|f| check_frame(&f.data)).collect()
}

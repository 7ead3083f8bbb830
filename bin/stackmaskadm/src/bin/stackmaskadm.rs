// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use slog::info;
use tabwriter::TabWriter;

use stackmask::api::API_VERSION;
use stackmask::api::ChecksumMode;
use stackmask::api::MAJOR_VERSION;
use stackmask::api::MalformedPolicy;
use stackmask::api::MutationProfile;
use stackmask::api::OsPreset;
use stackmask::api::ProfileCfg;
use stackmask::print::print_presets;
use stackmask::print::print_profile;
use stackmask::print::print_stats;
use stackmaskadm::Capture;
use stackmaskadm::FrameCheck;

/// Administer stackmask fingerprint profiles
#[derive(Debug, Parser)]
#[command(version=stackmask_pkg_version())]
enum Command {
    /// List the built-in OS presets.
    Presets,

    /// Resolve a profile and print its raw map value.
    Encode {
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Decode a raw map value into a profile.
    Decode {
        /// The value, in hex with a `0x` prefix or in decimal.
        value: String,
    },

    /// Run every frame of a capture through the engine.
    Rewrite {
        /// The capture to read.
        input: PathBuf,

        /// Where to write the frames which pass.
        output: PathBuf,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Print the outcome of every frame.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check the IPv4 and TCP checksums of every frame of a capture.
    Verify { pcap: PathBuf },
}

/// How to arrive at a profile.
///
/// A config file is read first, then the preset, then any individual
/// field overrides.
#[derive(Args, Clone, Debug)]
struct ProfileArgs {
    /// A TOML profile config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// The OS preset to start from.
    #[arg(long)]
    preset: Option<OsPreset>,

    #[arg(long)]
    ttl: Option<u8>,

    #[arg(long)]
    window: Option<u16>,

    /// Only rewrite the TTL of frames carrying this one.
    #[arg(long)]
    ttl_hint: Option<u8>,

    /// The IP identification to write; 0 leaves it alone.
    #[arg(long)]
    ident: Option<u16>,

    #[arg(long)]
    checksum: Option<ChecksumMode>,

    #[arg(long)]
    malformed: Option<MalformedPolicy>,
}

impl ProfileArgs {
    fn resolve(&self) -> anyhow::Result<MutationProfile> {
        let file = match &self.config {
            Some(path) => stackmaskadm::load_cfg(path)?,
            None => ProfileCfg::default(),
        };

        let flags = ProfileCfg {
            preset: self.preset,
            target_ttl: self.ttl,
            target_window: self.window,
            source_ttl_hint: self.ttl_hint,
            target_ident: self.ident,
            checksum: self.checksum,
            malformed: self.malformed,
        };

        Ok(file.merge(flags).resolve()?)
    }
}

fn stackmask_pkg_version() -> String {
    format!("{MAJOR_VERSION}.{API_VERSION}.0")
}

fn print_checks(checks: &[FrameCheck]) -> std::io::Result<()> {
    let show = |ok: bool| if ok { "ok" } else { "BAD" };

    let mut t = TabWriter::new(std::io::stdout());
    writeln!(t, "FRAME\tIPV4\tTCP\tNOTE")?;
    for (i, check) in checks.iter().enumerate() {
        match check {
            FrameCheck::Skipped(e) => writeln!(t, "{i}\t-\t-\t{e}")?,
            FrameCheck::Checked { ipv4, tcp: Some(tcp) } => {
                writeln!(t, "{i}\t{}\t{}\t", show(*ipv4), show(*tcp))?
            }
            FrameCheck::Checked { ipv4, tcp: None } => writeln!(
                t,
                "{i}\t{}\t-\tsegment not fully captured",
                show(*ipv4)
            )?,
        }
    }
    t.flush()
}

fn main() -> anyhow::Result<()> {
    let cmd = Command::parse();
    match cmd {
        Command::Presets => print_presets()?,

        Command::Encode { profile } => {
            let p = profile.resolve()?;
            println!("{:#018x}", p.to_raw());
        }

        Command::Decode { value } => {
            let raw = stackmaskadm::parse_raw(&value)?;
            let p = MutationProfile::from_raw(raw)?;
            print_profile(p.as_ref())?;
        }

        Command::Rewrite { input, output, profile, verbose } => {
            let log = stackmaskadm::logger();
            let p = profile.resolve()?;
            let cap = Capture::read(&input)?;
            info!(log, "replaying capture";
                "path" => %input.display(),
                "frames" => cap.frames.len());

            let masker = stackmaskadm::masker(&log);
            masker.set_profile(p)?;
            let replay = stackmaskadm::replay(&masker, cap);

            if verbose {
                for (i, o) in replay.outcomes.iter().enumerate() {
                    println!("{i:>6} {o}");
                }
            }

            replay.passed.write(&output)?;
            info!(log, "wrote capture";
                "path" => %output.display(),
                "frames" => replay.passed.frames.len());
            print_stats(&replay.stats)?;
        }

        Command::Verify { pcap } => {
            let cap = Capture::read(&pcap)?;
            let checks = stackmaskadm::verify(&cap);
            print_checks(&checks)?;

            let bad = checks.iter().filter(|c| c.is_bad()).count();
            if bad != 0 {
                let n = checks.len();
                anyhow::bail!("{bad} of {n} frames failed to verify");
            }
        }
    }

    Ok(())
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Print profiles and stats in human-friendly manner.
//!
//! This is mostly just a place to hang printing routines so that they
//! can be used by both stackmaskadm and integration tests.

use crate::api::MaskStatsSnapshot;
use crate::api::MutationProfile;
use crate::api::OsPreset;
use std::io::Write;
use tabwriter::TabWriter;

/// Print the table of OS presets.
pub fn print_presets() -> std::io::Result<()> {
    print_presets_into(&mut std::io::stdout())
}

/// Print the table of OS presets into a given writer.
pub fn print_presets_into(writer: &mut impl Write) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "PRESET\tTTL\tWINDOW\tRAW")?;

    for preset in OsPreset::ALL {
        let p = preset.profile();
        writeln!(
            t,
            "{}\t{}\t{}\t{:#018x}",
            preset,
            p.target_ttl,
            p.target_window,
            p.to_raw(),
        )?;
    }
    t.flush()
}

/// Print a profile, or its absence, along with its raw value.
pub fn print_profile(
    profile: Option<&MutationProfile>,
) -> std::io::Result<()> {
    print_profile_into(&mut std::io::stdout(), profile)
}

/// Print a profile, or its absence, into a given writer.
pub fn print_profile_into(
    writer: &mut impl Write,
    profile: Option<&MutationProfile>,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    let Some(p) = profile else {
        writeln!(t, "no profile")?;
        return t.flush();
    };

    let hint = match p.source_ttl_hint {
        0 => "any".to_string(),
        hint => hint.to_string(),
    };
    let ident = match p.target_ident {
        0 => "kept".to_string(),
        ident => ident.to_string(),
    };

    writeln!(t, "RAW\t{:#018x}", p.to_raw())?;
    writeln!(t, "TTL\t{}", p.target_ttl)?;
    writeln!(t, "FROM TTL\t{hint}")?;
    writeln!(t, "WINDOW\t{}", p.target_window)?;
    writeln!(t, "IDENT\t{ident}")?;
    writeln!(t, "CHECKSUM\t{}", p.checksum)?;
    writeln!(t, "MALFORMED\t{}", p.malformed)?;
    t.flush()
}

/// Print a [`MaskStatsSnapshot`].
pub fn print_stats(stats: &MaskStatsSnapshot) -> std::io::Result<()> {
    print_stats_into(&mut std::io::stdout(), stats)
}

/// Print a [`MaskStatsSnapshot`] into a given writer.
pub fn print_stats_into(
    writer: &mut impl Write,
    stats: &MaskStatsSnapshot,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    writeln!(t, "Frames")?;
    write_hr(&mut t)?;
    writeln!(t, "TOTAL\t{}", stats.total())?;
    writeln!(t, "MUTATED\t{}", stats.mutated)?;
    writeln!(t, "  ALREADY MASKED\t{}", stats.already_masked)?;
    writeln!(t, "UNCHANGED\t{}", stats.unchanged())?;
    writeln!(t, "  NO PROFILE\t{}", stats.no_profile)?;
    writeln!(t, "  TRUNCATED\t{}", stats.truncated)?;
    writeln!(t, "  NOT IPV4\t{}", stats.not_ipv4)?;
    writeln!(t, "  NOT TCP\t{}", stats.not_tcp)?;
    writeln!(t, "  FRAGMENT\t{}", stats.fragment)?;
    writeln!(t, "MALFORMED\t{}", stats.malformed)?;
    writeln!(t, "DROPPED\t{}", stats.dropped)?;
    t.flush()?;

    writeln!(t, "\nChecksums")?;
    write_hr(&mut t)?;
    writeln!(t, "INCREMENTAL\t{}", stats.csum_incremental)?;
    writeln!(t, "FULL\t{}", stats.csum_full)?;
    writeln!(t, "PROFILE EPOCH\t{}", stats.profile_epoch)?;
    t.flush()
}

/// Output a horizontal rule to the given writer.
pub fn write_hr(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:-<40}", "-")
}

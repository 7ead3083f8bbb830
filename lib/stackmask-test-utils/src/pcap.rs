// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Routines for building and reading packet capture files.

use pcap_parser::Linktype;
use pcap_parser::ToVec;
use pcap_parser::pcap;
use pcap_parser::pcap::LegacyPcapBlock;
use pcap_parser::pcap::PcapHeader;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Build a packet capture file from a series of frames.
pub struct PcapBuilder {
    file: File,
    frames: u32,
}

impl PcapBuilder {
    /// Create a new pcap builder, writing all captures to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let mut file = File::create(path).unwrap();

        let mut hdr = PcapHeader {
            magic_number: 0xa1b2c3d4,
            version_major: 2,
            version_minor: 4,
            thiszone: 0,
            sigfigs: 0,
            snaplen: 1500,
            network: Linktype::ETHERNET,
        };

        file.write_all(&hdr.to_vec().unwrap()).unwrap();

        Self { file, frames: 0 }
    }

    /// Add a frame to the capture.
    pub fn add_frame(&mut self, frame: &[u8]) {
        self.frames += 1;
        let mut block = LegacyPcapBlock {
            ts_sec: 7777,
            ts_usec: self.frames,
            caplen: frame.len() as u32,
            origlen: frame.len() as u32,
            data: frame,
        };

        self.file.write_all(&block.to_vec().unwrap()).unwrap();
    }
}

/// Read every frame out of the capture at `path`.
pub fn read_frames(path: impl AsRef<Path>) -> Vec<Vec<u8>> {
    let bytes = std::fs::read(path).unwrap();
    let (mut rest, _hdr) = match pcap::parse_pcap_header(&bytes) {
        Ok(res) => res,
        Err(e) => panic!("failed to get header: {e:?}"),
    };

    let mut frames = vec![];
    while !rest.is_empty() {
        match pcap::parse_pcap_frame(rest) {
            Ok((next, block)) => {
                // We always want access to the entire frame.
                assert_eq!(block.origlen, block.caplen);
                frames.push(block.data.to_vec());
                rest = next;
            }

            Err(e) => panic!("failed to get next block: {e:?}"),
        }
    }
    frames
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

#![no_main]

use libfuzzer_sys::fuzz_target;
use stackmask::api::MutationProfile;
use stackmask::api::Verdict;
use stackmask::engine::FrameView;
use stackmask::engine::process;

// The first eight bytes pick the profile and the next two the end of
// the view; the rest is the frame.
fuzz_target!(|data: &[u8]| {
    let Some((raw, rest)) = data.split_first_chunk::<8>() else {
        return;
    };
    let Some((cut, frame)) = rest.split_first_chunk::<2>() else {
        return;
    };

    let Ok(profile) = MutationProfile::from_raw(u64::from_le_bytes(*raw))
    else {
        return;
    };

    let mut buf = frame.to_vec();
    let end = usize::from(u16::from_le_bytes(*cut)).min(buf.len());
    let mut view = FrameView::with_bounds(&mut buf, 0, end).unwrap();
    let outcome = process(&mut view, profile.as_ref());

    // Nothing past the end of the view is ever written.
    assert_eq!(buf[end..], frame[end..]);

    match outcome.verdict {
        Verdict::PassUnchanged | Verdict::Drop => assert_eq!(buf, frame),
        Verdict::PassMutated => {
            let once = buf.clone();
            let mut view = FrameView::with_bounds(&mut buf, 0, end).unwrap();
            let again = process(&mut view, profile.as_ref());
            assert_eq!(again.verdict, Verdict::PassMutated);
            assert_eq!(buf, once);
        }
    }
});

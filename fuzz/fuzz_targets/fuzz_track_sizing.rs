#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tessera_layout::{SolveMode, Track, TrackSize, solve_tracks};

#[derive(Debug, Arbitrary)]
enum RawSize {
    Fixed(f32),
    Auto,
    Proportional(f32),
}

#[derive(Debug, Arbitrary)]
struct RawTrack {
    size: RawSize,
    min: f32,
    max: f32,
}

#[derive(Debug, Arbitrary)]
struct Input {
    tracks: Vec<RawTrack>,
    contributions: Vec<f32>,
    available: f32,
    arrange: bool,
}

fuzz_target!(|input: Input| {
    if input.tracks.len() > 64 {
        return;
    }
    let mut tracks: Vec<Track> = input
        .tracks
        .iter()
        .map(|raw| {
            let size = match raw.size {
                RawSize::Fixed(px) => TrackSize::Fixed(px),
                RawSize::Auto => TrackSize::Auto,
                RawSize::Proportional(f) => TrackSize::Proportional(f),
            };
            Track::new(size).with_min(raw.min).with_max(raw.max)
        })
        .collect();
    let mode = if input.arrange {
        SolveMode::Arrange
    } else {
        SolveMode::Desired
    };

    let solution = solve_tracks(&mut tracks, input.available, mode, &input.contributions);

    // Post-conditions that must always hold:
    assert!(!solution.total.is_nan(), "NaN total");
    assert!(solution.total >= 0.0, "negative total");
    let mut previous = 0.0f32;
    for track in &tracks {
        let size = track.measured_size();
        let (lo, hi) = track.bounds();
        assert!(!size.is_nan(), "NaN track size");
        assert!(size >= lo && size <= hi, "{size} outside [{lo}, {hi}]");
        assert!(track.offset() >= previous, "offsets must not decrease");
        previous = track.offset();
        if input.available.is_finite() {
            assert!(size.is_finite(), "infinite size under a finite extent");
        }
    }
});

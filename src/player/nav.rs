//! Pure navigation target selection.
//!
//! These helpers compute *which* index to go to; the engine core decides
//! when and how to load it. All of them require a non-empty playlist.

use rand::{Rng, RngExt};

/// Pick the next index under shuffle: uniformly random, re-rolling while it
/// lands on `current`. A single-track playlist short-circuits to index 0 so
/// the re-roll cannot loop forever.
pub(super) fn shuffle_target(len: usize, current: Option<usize>, rng: &mut impl Rng) -> usize {
    debug_assert!(len > 0);
    if len == 1 {
        return 0;
    }
    loop {
        let candidate = rng.random_range(0..len);
        if Some(candidate) != current {
            return candidate;
        }
    }
}

/// Sequential next: wraps to the first track after the last.
pub(super) fn next_target(len: usize, current: Option<usize>) -> usize {
    debug_assert!(len > 0);
    current.map_or(0, |i| (i + 1) % len)
}

/// Sequential previous: wraps to the last track from the first.
pub(super) fn prev_target(len: usize, current: Option<usize>) -> usize {
    debug_assert!(len > 0);
    match current {
        Some(i) if i > 0 => i - 1,
        _ => len - 1,
    }
}

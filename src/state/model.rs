use serde::{Deserialize, Serialize};

use crate::track::Track;

/// What happens when the current track reaches its natural end.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    /// Stop after the last track of the playlist.
    #[serde(alias = "off")]
    None,
    /// Restart the current track when it ends.
    #[serde(alias = "repeat-one", alias = "loop-one")]
    One,
    /// Advance forever, wrapping at the end of the playlist.
    #[serde(alias = "repeat-all", alias = "loop-all")]
    All,
}

impl Default for RepeatMode {
    fn default() -> Self {
        Self::None
    }
}

impl RepeatMode {
    /// Cycle `None -> One -> All -> None`.
    pub fn cycled(self) -> Self {
        match self {
            Self::None => Self::One,
            Self::One => Self::All,
            Self::All => Self::None,
        }
    }
}

/// Snapshot of everything an observer can know about playback.
///
/// Observers receive clones of this; the authoritative copy lives in the
/// [`StateStore`](super::StateStore) and is only mutated by the engine thread.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_track: Option<Track>,
    /// Elapsed seconds in the current track; reset to 0 on every load.
    pub current_time: f64,
    /// Track length in seconds; 0 until metadata resolves.
    pub duration: f64,
    /// Output gain, always within `[0, 1]`.
    pub volume: f64,
    pub is_loading: bool,
    pub is_shuffle: bool,
    pub repeat_mode: RepeatMode,
    /// Current playlist in insertion order. Replaced wholesale by
    /// `set_playlist`, never merged.
    pub playlist: Vec<Track>,
    /// Position of the selected track in `playlist`; `None` when nothing is
    /// selected.
    pub current_index: Option<usize>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_track: None,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            is_loading: false,
            is_shuffle: false,
            repeat_mode: RepeatMode::None,
            playlist: Vec::new(),
            current_index: None,
        }
    }
}

//! Engine-facing small types: commands and device events.
//!
//! Every public `Player` method maps to exactly one command; device-level
//! transitions arrive as [`DeviceEvent`]s. Both are applied by the engine
//! thread in arrival order, which is what keeps observable state free of
//! interleavings.

use crate::state::RepeatMode;
use crate::track::Track;

#[derive(Debug)]
pub(crate) enum PlayerCmd {
    /// Load (and start) the given track.
    Load(Track),
    Play,
    Pause,
    /// Pause and rewind to 0; used when a listening session is abandoned.
    Stop,
    SetVolume(f64),
    /// Seek to an absolute position in seconds.
    Seek(f64),
    /// Replace the playlist wholesale. Never auto-plays.
    SetPlaylist(Vec<Track>),
    /// Start the playlist entry at the given index.
    PlayIndex(usize),
    Next,
    Prev,
    ToggleShuffle,
    SetRepeatMode(RepeatMode),
    ToggleRepeat,
    /// Attach or clear the session credential used for play reports.
    SetSession(Option<String>),
    /// Tear the engine down and exit the thread.
    Quit,
}

/// Device-level transitions, funneled through the same serialization point
/// as commands.
///
/// The engine synthesizes these itself while polling the output device; tests
/// inject them directly to simulate hardware callbacks.
#[derive(Debug)]
pub(crate) enum DeviceEvent {
    /// Track metadata resolved; length in seconds when the container knows it.
    MetadataReady { duration: Option<f64> },
    /// Playback progressed to `seconds` into the current track.
    Progress { seconds: f64 },
    /// The current track reached its natural end.
    Ended,
    /// Acquisition or decoding failed irrecoverably for the current track.
    Failed { reason: String },
}

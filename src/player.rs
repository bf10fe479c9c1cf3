//! The playback engine and its public handle.
//!
//! `Player` is a thin command front-end: every method enqueues one command
//! for the engine thread, which owns the audio device and applies operations
//! and device events strictly in arrival order. None of the methods block,
//! none of them return errors; failures degrade to a safe state observable
//! through the snapshot.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use tracing::warn;

use crate::config::Settings;
use crate::state::{PlaybackState, RepeatMode, StateStore, Subscription};
use crate::track::Track;

mod core;
mod effects;
mod nav;
mod sink;
mod telemetry;
mod thread;
mod types;

#[cfg(test)]
mod tests;

use types::PlayerCmd;

pub struct Player {
    tx: Sender<PlayerCmd>,
    store: Arc<StateStore>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    /// Start an engine with the given settings.
    ///
    /// Always succeeds: when no audio output device is available the engine
    /// still serves state and playlist management, with track audio and the
    /// transition effect disabled.
    pub fn new(settings: Settings) -> Self {
        let initial = PlaybackState {
            volume: settings.playback.volume.clamp(0.0, 1.0),
            is_shuffle: settings.playback.shuffle,
            repeat_mode: settings.playback.repeat_mode,
            ..PlaybackState::default()
        };
        let store = StateStore::new(initial);
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let join = thread::spawn_engine_thread(settings, store.clone(), rx);

        Self {
            tx,
            store,
            join: Mutex::new(Some(join)),
        }
    }

    /// Register an observer; it immediately receives the current snapshot
    /// and then every subsequent one.
    pub fn subscribe(
        &self,
        observer: impl Fn(&PlaybackState) + Send + 'static,
    ) -> Subscription {
        self.store.subscribe(observer)
    }

    /// Synchronous point read of the current snapshot, independent of any
    /// subscription.
    pub fn state(&self) -> PlaybackState {
        self.store.snapshot()
    }

    /// Load (and start) a track directly, outside playlist navigation.
    pub fn load_track(&self, track: Track) {
        self.send(PlayerCmd::Load(track));
    }

    pub fn play(&self) {
        self.send(PlayerCmd::Play);
    }

    pub fn pause(&self) {
        self.send(PlayerCmd::Pause);
    }

    /// Pause and rewind to 0; used when a listening session is abandoned.
    pub fn stop(&self) {
        self.send(PlayerCmd::Stop);
    }

    /// Set the output volume; inputs are clamped to `[0, 1]`.
    pub fn set_volume(&self, volume: f64) {
        self.send(PlayerCmd::SetVolume(volume));
    }

    /// Seek to an absolute position in seconds, clamped to the known track
    /// length. A no-op while the duration is still unknown.
    pub fn seek(&self, seconds: f64) {
        self.send(PlayerCmd::Seek(seconds));
    }

    /// Replace the playlist wholesale. Clears the selection and never starts
    /// audio on its own.
    pub fn set_playlist(&self, tracks: Vec<Track>) {
        self.send(PlayerCmd::SetPlaylist(tracks));
    }

    /// Start the playlist entry at `index`; out-of-range indices are ignored.
    pub fn play_by_index(&self, index: usize) {
        self.send(PlayerCmd::PlayIndex(index));
    }

    pub fn next(&self) {
        self.send(PlayerCmd::Next);
    }

    pub fn previous(&self) {
        self.send(PlayerCmd::Prev);
    }

    /// Flip shuffle. Affects only how the next/previous target is picked;
    /// the playlist order is untouched.
    pub fn toggle_shuffle(&self) {
        self.send(PlayerCmd::ToggleShuffle);
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.send(PlayerCmd::SetRepeatMode(mode));
    }

    /// Cycle `None -> One -> All -> None`.
    pub fn toggle_repeat(&self) {
        self.send(PlayerCmd::ToggleRepeat);
    }

    /// Attach or clear the session credential used for play reports. With no
    /// session, reports are skipped silently.
    pub fn set_session(&self, session: Option<String>) {
        self.send(PlayerCmd::SetSession(session));
    }

    /// Tear the engine down: stop playback, release the device, clear every
    /// subscriber, drop the synthesis buffer. Idempotent; also runs on drop.
    pub fn destroy(&self) {
        let _ = self.tx.send(PlayerCmd::Quit);
        if let Ok(mut join) = self.join.lock() {
            if let Some(handle) = join.take() {
                let _ = handle.join();
            }
        }
    }

    fn send(&self, cmd: PlayerCmd) {
        if self.tx.send(cmd).is_err() {
            warn!("engine is shut down; command dropped");
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.destroy();
    }
}

//! Engine state machine: command handling, navigation and the end-of-track
//! policy.
//!
//! `EngineCore` lives on the engine thread and is the only mutator of the
//! `StateStore`. It owns the output device, the loaded media bytes and the
//! transition effect; everything it does is driven by [`PlayerCmd`]s and
//! [`DeviceEvent`]s applied strictly in arrival order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::state::{RepeatMode, StateStore};
use crate::track::Track;

use super::effects::TransitionEffect;
use super::nav;
use super::sink::{self, LoadedMedia};
use super::telemetry;
use super::types::{DeviceEvent, PlayerCmd};

/// Deferred navigation load. The target is re-validated against the playlist
/// as it exists when the delay elapses, not when the decision was made, so a
/// `set_playlist` arriving inside the delay window supersedes stale targets.
struct PendingLoad {
    index: usize,
    due: Instant,
}

pub(super) struct EngineCore {
    settings: Settings,
    store: Arc<StateStore>,

    stream: Option<OutputStream>,
    sink: Option<Sink>,
    effect: Option<TransitionEffect>,
    /// Voice from the latest transition; replacing it stops the previous
    /// burst, dropping it on teardown silences the effect entirely.
    effect_voice: Option<Sink>,

    media: Option<LoadedMedia>,
    session: Option<String>,
    pending: Option<PendingLoad>,

    // Wall-clock progress tracking: accumulated elapsed while paused plus
    // the instant the current run of playback started.
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl EngineCore {
    pub(super) fn new(settings: Settings, store: Arc<StateStore>) -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped; noisy
                // for an embedded engine.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                warn!("audio output unavailable, running without a device: {e}");
                None
            }
        };
        Self::with_stream(settings, store, stream)
    }

    #[cfg(test)]
    pub(super) fn without_device(settings: Settings, store: Arc<StateStore>) -> Self {
        Self::with_stream(settings, store, None)
    }

    fn with_stream(settings: Settings, store: Arc<StateStore>, stream: Option<OutputStream>) -> Self {
        let effect = settings
            .effects
            .enabled
            .then(|| TransitionEffect::generate(&settings.effects));
        Self {
            settings,
            store,
            stream,
            sink: None,
            effect,
            effect_voice: None,
            media: None,
            session: None,
            pending: None,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    #[cfg(test)]
    pub(super) fn state(&self) -> crate::state::PlaybackState {
        self.store.snapshot()
    }

    pub(super) fn handle_cmd(&mut self, cmd: PlayerCmd) {
        match cmd {
            PlayerCmd::Load(track) => self.load_track(track),
            PlayerCmd::Play => self.play(),
            PlayerCmd::Pause => self.pause(),
            PlayerCmd::Stop => self.stop(),
            PlayerCmd::SetVolume(v) => self.set_volume(v),
            PlayerCmd::Seek(t) => self.seek(t),
            PlayerCmd::SetPlaylist(tracks) => self.set_playlist(tracks),
            PlayerCmd::PlayIndex(i) => self.play_by_index(i),
            PlayerCmd::Next => self.next(),
            PlayerCmd::Prev => self.previous(),
            PlayerCmd::ToggleShuffle => self.store.update(|s| s.is_shuffle = !s.is_shuffle),
            PlayerCmd::SetRepeatMode(mode) => self.store.update(|s| s.repeat_mode = mode),
            PlayerCmd::ToggleRepeat => {
                self.store.update(|s| s.repeat_mode = s.repeat_mode.cycled())
            }
            PlayerCmd::SetSession(session) => self.session = session,
            // Handled by the engine loop before it reaches us.
            PlayerCmd::Quit => {}
        }
    }

    /// Periodic device poll: fire due deferred loads, publish progress and
    /// detect natural end-of-track.
    pub(super) fn tick(&mut self) {
        if let Some(pending) = self.pending.as_ref() {
            if Instant::now() >= pending.due {
                let index = pending.index;
                self.pending = None;
                self.fire_deferred_load(index);
            }
        }

        if !self.store.snapshot().is_playing {
            return;
        }
        if self.sink.as_ref().is_some_and(|s| s.empty()) {
            self.sink = None;
            self.on_device_event(DeviceEvent::Ended);
        } else if self.sink.is_some() {
            let seconds = self.elapsed().as_secs_f64();
            self.on_device_event(DeviceEvent::Progress { seconds });
        }
    }

    pub(super) fn on_device_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::MetadataReady { duration } => {
                self.store.update(|s| {
                    s.duration = duration.unwrap_or(0.0);
                    s.is_loading = false;
                });
            }
            DeviceEvent::Progress { seconds } => {
                self.store.update(|s| s.current_time = seconds);
            }
            DeviceEvent::Ended => {
                self.started_at = None;
                self.accumulated = Duration::ZERO;
                self.store.update(|s| s.is_playing = false);
                self.on_track_ended();
            }
            DeviceEvent::Failed { reason } => {
                // The failed track stays current so the UI can say which one
                // it could not play.
                warn!("playback failed: {reason}");
                self.store.update(|s| {
                    s.is_loading = false;
                    s.is_playing = false;
                });
            }
        }
    }

    // ---- Playback controller ----

    fn load_track(&mut self, track: Track) {
        let index = self
            .store
            .snapshot()
            .playlist
            .iter()
            .position(|t| t.id == track.id);
        self.apply_load(track, index);
    }

    fn apply_load(&mut self, track: Track, index: Option<usize>) {
        info!("loading \"{}\" by {}", track.title, track.artist);
        // A direct load supersedes any deferred navigation target.
        self.pending = None;
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.media = None;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.store.update(|s| {
            s.is_loading = true;
            s.is_playing = false;
            s.current_track = Some(track.clone());
            s.current_index = index;
            s.current_time = 0.0;
            s.duration = 0.0;
        });

        match sink::fetch_media(&track.media_url, self.settings.engine.fetch_timeout_ms) {
            Ok(media) => {
                let duration = media.duration.or(track.duration);
                self.media = Some(media);
                self.on_device_event(DeviceEvent::MetadataReady { duration });
                if self.stream.is_some() {
                    match self.rebuild_sink_at(Duration::ZERO, true) {
                        Ok(()) => self.store.update(|s| s.is_playing = true),
                        Err(e) => warn!("could not start \"{}\": {e}", track.title),
                    }
                }
                telemetry::report_play(&self.settings.telemetry, &track.id, self.session.as_deref());
            }
            Err(e) => self.on_device_event(DeviceEvent::Failed {
                reason: format!("\"{}\": {e}", track.title),
            }),
        }
    }

    fn play(&mut self) {
        if self.store.snapshot().current_track.is_none() {
            return;
        }
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
            if self.started_at.is_none() {
                self.started_at = Some(Instant::now());
            }
            self.store.update(|s| s.is_playing = true);
            return;
        }
        // The output voice is gone (after stop() or a drained sink); bring
        // one back at the current position when there is media to resume.
        if self.media.is_some() && self.stream.is_some() {
            let at = Duration::from_secs_f64(self.store.snapshot().current_time);
            match self.rebuild_sink_at(at, true) {
                Ok(()) => self.store.update(|s| s.is_playing = true),
                Err(e) => {
                    warn!("could not start playback: {e}");
                    self.store.update(|s| s.is_playing = false);
                }
            }
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
        if let Some(started) = self.started_at.take() {
            self.accumulated += started.elapsed();
        }
        self.store.update(|s| s.is_playing = false);
    }

    fn stop(&mut self) {
        // Stop is pause + rewind: the listening session is being abandoned,
        // not resumed. Media stays cached so play() can restart from 0.
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.store.update(|s| {
            s.is_playing = false;
            s.current_time = 0.0;
        });
    }

    fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(volume as f32);
        }
        self.store.update(|s| s.volume = volume);
    }

    fn seek(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let (duration, playing) = {
            let s = self.store.snapshot();
            (s.duration, s.is_playing)
        };
        // Unknown duration means the track is still loading; seeking into an
        // invalid position would race the load.
        if duration <= 0.0 {
            return;
        }
        let target = seconds.clamp(0.0, duration);

        if self.media.is_some() && self.stream.is_some() {
            if let Err(e) = self.rebuild_sink_at(Duration::from_secs_f64(target), playing) {
                warn!("seek failed: {e}");
                self.store.update(|s| s.is_playing = false);
            }
        } else {
            self.accumulated = Duration::from_secs_f64(target);
        }
        self.store.update(|s| s.current_time = target);
    }

    // ---- Playlist & navigation ----

    fn set_playlist(&mut self, tracks: Vec<Track>) {
        debug!("playlist replaced: {} tracks", tracks.len());
        // Wholesale swap; whatever is currently audible keeps playing and no
        // new audio starts.
        self.store.update(|s| {
            s.playlist = tracks;
            s.current_index = None;
        });
    }

    fn play_by_index(&mut self, index: usize) {
        let len = self.store.snapshot().playlist.len();
        if index >= len {
            return;
        }
        self.begin_transition(index);
    }

    fn next(&mut self) {
        let (len, current, shuffle) = {
            let s = self.store.snapshot();
            (s.playlist.len(), s.current_index, s.is_shuffle)
        };
        if len == 0 {
            return;
        }
        let target = if shuffle {
            nav::shuffle_target(len, current, &mut rand::rng())
        } else {
            nav::next_target(len, current)
        };
        self.begin_transition(target);
    }

    fn previous(&mut self) {
        let (len, current, shuffle) = {
            let s = self.store.snapshot();
            (s.playlist.len(), s.current_index, s.is_shuffle)
        };
        if len == 0 {
            return;
        }
        let target = if shuffle {
            nav::shuffle_target(len, current, &mut rand::rng())
        } else {
            nav::prev_target(len, current)
        };
        self.begin_transition(target);
    }

    /// The transition-sound-then-load sequence shared by every navigation
    /// path: audible feedback first, then the load after a short pause that
    /// masks acquisition latency. The engine keeps serving commands during
    /// the pause.
    fn begin_transition(&mut self, index: usize) {
        self.play_transition_effect();
        let delay = Duration::from_millis(self.settings.playback.navigation_delay_ms);
        if delay.is_zero() {
            self.fire_deferred_load(index);
        } else {
            self.pending = Some(PendingLoad {
                index,
                due: Instant::now() + delay,
            });
        }
    }

    fn fire_deferred_load(&mut self, index: usize) {
        // Bounds are checked against the playlist as it exists *now*.
        let track = self.store.snapshot().playlist.get(index).cloned();
        match track {
            Some(track) => self.apply_load(track, Some(index)),
            None => debug!("deferred load dropped: index {index} out of bounds"),
        }
    }

    /// End-of-track policy, invoked on natural end of media.
    fn on_track_ended(&mut self) {
        let (repeat, index, len) = {
            let s = self.store.snapshot();
            (s.repeat_mode, s.current_index, s.playlist.len())
        };
        match repeat {
            RepeatMode::One => self.restart_current(),
            RepeatMode::All => self.next(),
            RepeatMode::None => match index {
                Some(i) if i + 1 < len => self.next(),
                _ => self.finish_playlist(),
            },
        }
    }

    /// Repeat-one: rewind and resume without reloading the media and without
    /// a transition effect, so the listener hears "same track again" rather
    /// than "track changed".
    fn restart_current(&mut self) {
        debug!("repeat-one: restarting current track");
        self.accumulated = Duration::ZERO;
        self.store.update(|s| s.current_time = 0.0);
        if self.media.is_some() && self.stream.is_some() {
            match self.rebuild_sink_at(Duration::ZERO, true) {
                Ok(()) => self.store.update(|s| s.is_playing = true),
                Err(e) => warn!("repeat restart failed: {e}"),
            }
        }
    }

    /// Ran off the end of the playlist with repeat off: clear the selection
    /// entirely instead of leaving the last track selected-but-stopped.
    fn finish_playlist(&mut self) {
        debug!("end of playlist");
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.media = None;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.store.update(|s| {
            s.is_playing = false;
            s.current_track = None;
            s.current_index = None;
            s.current_time = 0.0;
            s.duration = 0.0;
        });
    }

    // ---- Resource handling ----

    fn rebuild_sink_at(&mut self, start_at: Duration, play: bool) -> Result<()> {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| Error::Output("no output device".into()))?;
        let media = self
            .media
            .as_ref()
            .ok_or_else(|| Error::Output("no media loaded".into()))?;

        let sink = sink::sink_at(stream, media, start_at)?;
        sink.set_volume(self.store.snapshot().volume as f32);
        if play {
            sink.play();
            self.started_at = Some(Instant::now());
        } else {
            self.started_at = None;
        }
        self.accumulated = start_at;
        self.sink = Some(sink);
        Ok(())
    }

    fn play_transition_effect(&mut self) {
        let (Some(stream), Some(effect)) = (self.stream.as_ref(), self.effect.as_ref()) else {
            return;
        };
        // Replacing the previous voice stops it; each transition gets a
        // fresh burst.
        self.effect_voice = effect.voice(stream);
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    /// Ordered teardown: stop output, release the device handle, clear
    /// observers, drop the synthesis buffer. Safe to run more than once; no
    /// device event can reach the store afterwards.
    pub(super) fn teardown(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        let _ = self.effect_voice.take();
        self.media = None;
        self.pending = None;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.store.update(|s| s.is_playing = false);
        self.stream = None;
        self.store.clear_observers();
        self.effect = None;
    }
}

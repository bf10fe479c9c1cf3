use std::time::Duration;

use chrono::Utc;

use super::core::EngineCore;
use super::effects::TransitionEffect;
use super::nav;
use super::types::{DeviceEvent, PlayerCmd};
use crate::config::{EffectsSettings, Settings};
use crate::state::{PlaybackState, RepeatMode, StateStore};
use crate::track::Track;

fn track(id: &str) -> Track {
    Track {
        id: id.into(),
        owner_id: "owner-1".into(),
        title: format!("Track {id}"),
        artist: "Artist".into(),
        media_url: format!("/nonexistent/{id}.mp3"),
        duration: None,
        size_bytes: None,
        content_type: Some("audio/mpeg".into()),
        play_count: None,
        last_played_at: None,
        created_at: Utc::now(),
    }
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.playback.navigation_delay_ms = 0;
    settings.effects.enabled = false;
    settings
}

fn core_with(tracks: Vec<Track>) -> EngineCore {
    let store = StateStore::new(PlaybackState::default());
    let mut core = EngineCore::without_device(test_settings(), store);
    core.handle_cmd(PlayerCmd::SetPlaylist(tracks));
    core
}

// ---- pure navigation helpers ----

#[test]
fn next_target_wraps_after_the_last_track() {
    assert_eq!(nav::next_target(3, Some(2)), 0);
    assert_eq!(nav::next_target(3, Some(0)), 1);
    assert_eq!(nav::next_target(3, None), 0);
}

#[test]
fn prev_target_wraps_to_the_last_track() {
    assert_eq!(nav::prev_target(3, Some(0)), 2);
    assert_eq!(nav::prev_target(3, Some(2)), 1);
    assert_eq!(nav::prev_target(3, None), 2);
}

#[test]
fn shuffle_target_never_repeats_the_current_index() {
    let mut rng = rand::rng();
    for current in 0..2 {
        for _ in 0..500 {
            assert_ne!(nav::shuffle_target(2, Some(current), &mut rng), current);
        }
    }
    for _ in 0..200 {
        assert_ne!(nav::shuffle_target(5, Some(3), &mut rng), 3);
    }
}

#[test]
fn shuffle_target_accepts_the_only_track_of_a_singleton_playlist() {
    let mut rng = rand::rng();
    assert_eq!(nav::shuffle_target(1, Some(0), &mut rng), 0);
    assert_eq!(nav::shuffle_target(1, None, &mut rng), 0);
}

// ---- playback controller ----

#[test]
fn volume_is_clamped_for_any_input() {
    let mut core = core_with(vec![]);
    core.handle_cmd(PlayerCmd::SetVolume(-0.5));
    assert_eq!(core.state().volume, 0.0);
    core.handle_cmd(PlayerCmd::SetVolume(1.5));
    assert_eq!(core.state().volume, 1.0);
    core.handle_cmd(PlayerCmd::SetVolume(0.4));
    assert_eq!(core.state().volume, 0.4);
    core.handle_cmd(PlayerCmd::SetVolume(f64::NAN));
    assert_eq!(core.state().volume, 0.4);
}

#[test]
fn pause_twice_leaves_state_identical_to_pausing_once() {
    let mut core = core_with(vec![track("a"), track("b")]);
    core.handle_cmd(PlayerCmd::PlayIndex(0));

    core.handle_cmd(PlayerCmd::Pause);
    let after_one = core.state();
    core.handle_cmd(PlayerCmd::Pause);
    assert_eq!(core.state(), after_one);
}

#[test]
fn seek_clamps_to_known_duration_and_noops_before_metadata() {
    let mut core = core_with(vec![]);

    // Duration unknown: any seek is ignored.
    core.handle_cmd(PlayerCmd::Seek(50.0));
    assert_eq!(core.state().current_time, 0.0);

    core.on_device_event(DeviceEvent::MetadataReady {
        duration: Some(200.0),
    });
    core.handle_cmd(PlayerCmd::Seek(-5.0));
    assert_eq!(core.state().current_time, 0.0);
    core.handle_cmd(PlayerCmd::Seek(500.0));
    assert_eq!(core.state().current_time, 200.0);
    core.handle_cmd(PlayerCmd::Seek(50.0));
    assert_eq!(core.state().current_time, 50.0);
}

#[test]
fn failed_load_clears_flags_but_keeps_the_track_current() {
    let mut core = core_with(vec![track("a")]);
    core.handle_cmd(PlayerCmd::PlayIndex(0));

    let state = core.state();
    assert!(!state.is_loading);
    assert!(!state.is_playing);
    // The UI gets to say which track failed.
    assert_eq!(state.current_track.as_ref().map(|t| t.id.as_str()), Some("a"));
    assert_eq!(state.current_index, Some(0));
}

// ---- playlist & navigation ----

#[test]
fn set_playlist_resets_selection_and_does_not_autoplay() {
    let mut core = core_with(vec![track("a"), track("b")]);
    core.handle_cmd(PlayerCmd::PlayIndex(1));
    assert_eq!(core.state().current_index, Some(1));

    core.handle_cmd(PlayerCmd::SetPlaylist(vec![track("c")]));
    let state = core.state();
    assert_eq!(state.current_index, None);
    assert!(!state.is_playing);
    assert_eq!(state.playlist.len(), 1);
}

#[test]
fn out_of_range_play_by_index_is_ignored() {
    let mut core = core_with(vec![track("a")]);
    core.handle_cmd(PlayerCmd::PlayIndex(5));
    let state = core.state();
    assert_eq!(state.current_index, None);
    assert!(state.current_track.is_none());
}

#[test]
fn navigation_on_an_empty_playlist_is_ignored() {
    let mut core = core_with(vec![]);
    core.handle_cmd(PlayerCmd::Next);
    core.handle_cmd(PlayerCmd::Prev);
    let state = core.state();
    assert_eq!(state.current_index, None);
    assert!(state.current_track.is_none());
}

#[test]
fn current_track_always_matches_the_selected_playlist_entry() {
    let mut core = core_with(vec![track("a"), track("b"), track("c")]);

    core.handle_cmd(PlayerCmd::PlayIndex(1));
    let state = core.state();
    assert_eq!(state.current_index, Some(1));
    assert_eq!(
        state.current_track.as_ref().map(|t| t.id.clone()),
        state.current_index.map(|i| state.playlist[i].id.clone())
    );

    core.handle_cmd(PlayerCmd::Next);
    let state = core.state();
    assert_eq!(state.current_index, Some(2));
    assert_eq!(
        state.current_track.as_ref().map(|t| t.id.clone()),
        Some(state.playlist[2].id.clone())
    );
}

#[test]
fn load_track_resolves_its_playlist_position_by_id() {
    let mut core = core_with(vec![track("a"), track("b")]);

    core.handle_cmd(PlayerCmd::Load(track("b")));
    assert_eq!(core.state().current_index, Some(1));

    // A one-off track outside the playlist plays with no selection.
    core.handle_cmd(PlayerCmd::Load(track("zz")));
    let state = core.state();
    assert_eq!(state.current_index, None);
    assert_eq!(state.current_track.as_ref().map(|t| t.id.as_str()), Some("zz"));
}

#[test]
fn next_wraps_around_without_shuffle() {
    let mut core = core_with(vec![track("a"), track("b"), track("c")]);
    core.handle_cmd(PlayerCmd::PlayIndex(2));
    core.handle_cmd(PlayerCmd::Next);
    assert_eq!(core.state().current_index, Some(0));
}

#[test]
fn previous_wraps_to_the_last_track_from_the_first() {
    let mut core = core_with(vec![track("a"), track("b"), track("c")]);
    core.handle_cmd(PlayerCmd::PlayIndex(0));
    core.handle_cmd(PlayerCmd::Prev);
    assert_eq!(core.state().current_index, Some(2));
}

#[test]
fn toggle_shuffle_keeps_playlist_order_and_selection() {
    let mut core = core_with(vec![track("a"), track("b")]);
    core.handle_cmd(PlayerCmd::PlayIndex(1));
    let before = core.state();

    core.handle_cmd(PlayerCmd::ToggleShuffle);
    let state = core.state();
    assert!(state.is_shuffle);
    assert_eq!(state.current_index, before.current_index);
    assert_eq!(state.playlist, before.playlist);
}

#[test]
fn toggle_repeat_cycles_through_all_modes() {
    let mut core = core_with(vec![]);
    assert_eq!(core.state().repeat_mode, RepeatMode::None);
    core.handle_cmd(PlayerCmd::ToggleRepeat);
    assert_eq!(core.state().repeat_mode, RepeatMode::One);
    core.handle_cmd(PlayerCmd::ToggleRepeat);
    assert_eq!(core.state().repeat_mode, RepeatMode::All);
    core.handle_cmd(PlayerCmd::ToggleRepeat);
    assert_eq!(core.state().repeat_mode, RepeatMode::None);
}

// ---- end-of-track policy ----

#[test]
fn repeat_one_restarts_the_same_track_from_zero() {
    let mut core = core_with(vec![track("a"), track("b")]);
    core.handle_cmd(PlayerCmd::PlayIndex(0));
    core.handle_cmd(PlayerCmd::SetRepeatMode(RepeatMode::One));
    core.on_device_event(DeviceEvent::Progress { seconds: 5.0 });

    core.on_device_event(DeviceEvent::Ended);

    let state = core.state();
    assert_eq!(state.current_index, Some(0));
    assert_eq!(state.current_time, 0.0);
}

#[test]
fn repeat_none_at_the_last_track_stops_and_clears_the_selection() {
    let mut core = core_with(vec![track("a"), track("b"), track("c")]);
    core.handle_cmd(PlayerCmd::PlayIndex(2));

    core.on_device_event(DeviceEvent::Ended);

    let state = core.state();
    assert!(!state.is_playing);
    assert_eq!(state.current_index, None);
    assert!(state.current_track.is_none());
    assert_eq!(state.duration, 0.0);
}

#[test]
fn repeat_none_mid_playlist_advances_to_the_next_track() {
    let mut core = core_with(vec![track("a"), track("b"), track("c")]);
    core.handle_cmd(PlayerCmd::PlayIndex(0));

    core.on_device_event(DeviceEvent::Ended);

    assert_eq!(core.state().current_index, Some(1));
}

#[test]
fn repeat_all_wraps_indefinitely_across_track_ends() {
    let mut core = core_with(vec![track("a"), track("b")]);
    core.handle_cmd(PlayerCmd::SetRepeatMode(RepeatMode::All));
    core.handle_cmd(PlayerCmd::PlayIndex(0));

    core.on_device_event(DeviceEvent::Ended);
    let state = core.state();
    assert_eq!(state.current_index, Some(1));
    assert_eq!(state.current_track.as_ref().map(|t| t.id.as_str()), Some("b"));

    core.on_device_event(DeviceEvent::Ended);
    let state = core.state();
    assert_eq!(state.current_index, Some(0));
    assert!(state.current_track.is_some());
}

// ---- deferred loads vs. playlist replacement ----

#[test]
fn deferred_load_revalidates_against_the_new_playlist() {
    let store = StateStore::new(PlaybackState::default());
    let mut settings = test_settings();
    settings.playback.navigation_delay_ms = 40;
    let mut core = EngineCore::without_device(settings, store);

    core.handle_cmd(PlayerCmd::SetPlaylist(vec![track("a"), track("b"), track("c")]));
    core.handle_cmd(PlayerCmd::Next); // target 0, deferred
    core.handle_cmd(PlayerCmd::SetPlaylist(vec![track("d")]));

    std::thread::sleep(Duration::from_millis(60));
    core.tick();

    // Index 0 is still valid against the replacement list, so the load
    // applies to the *new* playlist's entry.
    let state = core.state();
    assert_eq!(state.current_index, Some(0));
    assert_eq!(state.current_track.as_ref().map(|t| t.id.as_str()), Some("d"));
}

#[test]
fn deferred_load_is_dropped_when_its_index_no_longer_exists() {
    let store = StateStore::new(PlaybackState::default());
    let mut settings = test_settings();
    settings.playback.navigation_delay_ms = 40;
    let mut core = EngineCore::without_device(settings, store);

    core.handle_cmd(PlayerCmd::SetPlaylist(vec![track("a"), track("b"), track("c")]));
    core.handle_cmd(PlayerCmd::PlayIndex(2)); // deferred target 2
    core.handle_cmd(PlayerCmd::SetPlaylist(vec![track("d")]));

    std::thread::sleep(Duration::from_millis(60));
    core.tick();

    let state = core.state();
    assert_eq!(state.current_index, None);
    assert!(state.current_track.is_none());
}

// ---- real media ----

fn write_test_wav(path: &std::path::Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for n in 0..22_050 {
        let t = n as f32 / 44_100.0;
        let sample = (t * 440.0 * std::f32::consts::TAU).sin() * 0.2;
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn loading_a_real_file_resolves_duration_and_clears_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_test_wav(&path);

    let mut t = track("wav");
    t.media_url = path.to_str().unwrap().to_string();
    t.duration = Some(0.5);

    let mut core = core_with(vec![]);
    core.handle_cmd(PlayerCmd::Load(t));

    let state = core.state();
    assert!(!state.is_loading);
    assert!(state.duration > 0.0);
    assert_eq!(state.current_time, 0.0);
    assert_eq!(
        state.current_track.as_ref().map(|t| t.id.as_str()),
        Some("wav")
    );
}

// ---- transition effect ----

#[test]
fn transition_effect_buffer_has_the_configured_length_and_gain_ceiling() {
    let settings = EffectsSettings {
        enabled: true,
        noise_ms: 1000,
        gain: 0.3,
    };
    let effect = TransitionEffect::generate(&settings);
    let samples = effect.samples();
    assert_eq!(samples.len(), 44_100);
    assert!(samples.iter().all(|s| s.abs() <= 0.3));

    // The exponential ramp-down leaves the tail near-silent.
    assert!(samples[samples.len() - 100..]
        .iter()
        .all(|s| s.abs() < 0.3 * 0.01));
}

// ---- the full player handle ----

#[test]
fn player_processes_commands_and_tears_down_idempotently() {
    let mut settings = test_settings();
    settings.engine.poll_interval_ms = 10;
    let player = crate::Player::new(settings);

    let (tx, rx) = std::sync::mpsc::channel::<PlaybackState>();
    let _sub = player.subscribe(move |s| {
        let _ = tx.send(s.clone());
    });

    // The initial snapshot arrives synchronously at subscription.
    let first = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(first.playlist.is_empty());

    player.set_playlist(vec![track("a"), track("b")]);
    player.toggle_shuffle();

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    let mut latest = first;
    while !(latest.playlist.len() == 2 && latest.is_shuffle) {
        assert!(std::time::Instant::now() < deadline, "engine did not apply commands");
        latest = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    player.destroy();
    player.destroy();
    // Commands after teardown are dropped, not panicking.
    player.play();
    assert_eq!(player.state().playlist.len(), 2);
}

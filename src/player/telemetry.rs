//! Fire-and-forget play reporting.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::TelemetrySettings;

/// Report a track load to the play-count service.
///
/// Never blocks playback: the request runs on its own thread and every
/// failure is swallowed after logging. Skipped silently when telemetry is
/// unconfigured or there is no authenticated session.
pub(super) fn report_play(settings: &TelemetrySettings, track_id: &str, session: Option<&str>) {
    let Some(endpoint) = settings.endpoint.clone() else {
        return;
    };
    let Some(session) = session else {
        debug!("play report skipped: no session");
        return;
    };

    let session = session.to_string();
    let track_id = track_id.to_string();
    let timeout = Duration::from_millis(settings.timeout_ms);
    thread::spawn(move || {
        if let Err(e) = crate::remote::report_play(&endpoint, &track_id, &session, timeout) {
            warn!("play report for {track_id} failed: {e}");
        }
    });
}

//! Media acquisition and sink construction.
//!
//! A track's `media_url` is either a local path or an http(s) URL. Bytes are
//! pulled into memory once per load and kept for the lifetime of the current
//! track, so seeking, `stop` and repeat-one can rebuild the sink without
//! re-fetching. `skip_duration` is the seeking primitive; even
//! `Duration::ZERO` is fine.

use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::{Error, Result};

/// Media bytes for the currently loaded track, validated as decodable audio.
pub(super) struct LoadedMedia {
    bytes: Arc<[u8]>,
    /// Length reported by the decoder, when the container knows it.
    pub(super) duration: Option<f64>,
}

impl LoadedMedia {
    fn decoder(&self) -> Result<Decoder<Cursor<Arc<[u8]>>>> {
        Decoder::new(Cursor::new(self.bytes.clone())).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Pull the track's bytes into memory and probe them.
///
/// Fails the load here if the payload is not decodable audio, so the engine
/// never holds media it cannot play.
pub(super) fn fetch_media(media_url: &str, timeout_ms: u64) -> Result<LoadedMedia> {
    let bytes: Vec<u8> = if media_url.starts_with("http://") || media_url.starts_with("https://") {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        let response = client.get(media_url).send()?;
        if !response.status().is_success() {
            return Err(Error::Service {
                status: response.status().as_u16(),
                url: media_url.to_string(),
            });
        }
        response.bytes()?.to_vec()
    } else {
        fs::read(media_url)?
    };

    let media = LoadedMedia {
        bytes: bytes.into(),
        duration: None,
    };
    let duration = media.decoder()?.total_duration().map(|d| d.as_secs_f64());
    Ok(LoadedMedia { duration, ..media })
}

/// Create a paused `Sink` for `media` that starts playback at `start_at`.
pub(super) fn sink_at(
    stream: &OutputStream,
    media: &LoadedMedia,
    start_at: Duration,
) -> Result<Sink> {
    let source = media.decoder()?.skip_duration(start_at);
    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(sink)
}

//! Clients for the two hosted-backend collaborators.
//!
//! The library service hands the application its track list (the application
//! calls [`fetch_library`] and passes the result to `Player::set_playlist`);
//! the play-count service receives the engine's fire-and-forget load reports.
//! Both authenticate with the caller's session credential as a bearer token.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::track::Track;

fn client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder().timeout(timeout).build()?)
}

/// Fetch the caller's track library, newest-first as the service orders it.
///
/// Invoked by the embedding application, not by the engine.
pub fn fetch_library(base_url: &str, session: &str, timeout: Duration) -> Result<Vec<Track>> {
    let url = format!("{}/tracks", base_url.trim_end_matches('/'));
    let response = client(timeout)?.get(&url).bearer_auth(session).send()?;
    if !response.status().is_success() {
        return Err(Error::Service {
            status: response.status().as_u16(),
            url,
        });
    }
    Ok(response.json()?)
}

/// Record one play of `track_id` against the caller's account.
pub fn report_play(base_url: &str, track_id: &str, session: &str, timeout: Duration) -> Result<()> {
    let url = format!("{}/tracks/{}/plays", base_url.trim_end_matches('/'), track_id);
    let response = client(timeout)?
        .post(&url)
        .bearer_auth(session)
        .json(&serde_json::json!({ "trackId": track_id }))
        .send()?;
    if !response.status().is_success() {
        return Err(Error::Service {
            status: response.status().as_u16(),
            url,
        });
    }
    Ok(())
}

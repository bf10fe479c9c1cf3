//! Error types for the playback engine.
//!
//! These stay internal to the crate's plumbing: the engine converts every
//! failure at its dispatch boundary into a logged, state-reflected
//! degradation, so nothing here ever crosses the public `Player` surface.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Media file could not be read from disk.
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failure while talking to a collaborator or fetching media.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Fetched bytes could not be decoded as audio.
    #[error("audio decode error: {0}")]
    Decode(String),

    /// No usable audio output path for the requested operation.
    #[error("audio output error: {0}")]
    Output(String),

    /// A remote service answered with a non-success status.
    #[error("service returned {status} from {url}")]
    Service { status: u16, url: String },
}

pub type Result<T> = std::result::Result<T, Error>;

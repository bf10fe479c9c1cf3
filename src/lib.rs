//! waveroom: the playback engine behind the site's music feature.
//!
//! A [`Player`] owns one audio output device and one engine thread. Every
//! public operation and every device-level event is serialized onto that
//! thread, so observers never see interleaved partial state. Observers
//! register through [`Player::subscribe`] and receive immutable
//! [`PlaybackState`] snapshots; [`Player::state`] is a synchronous point read.
//!
//! Nothing in the engine panics or returns an error across the public
//! boundary: failures degrade to a safe, inert state and are logged.

pub mod config;
pub mod error;
pub mod player;
pub mod remote;
pub mod state;
pub mod track;

pub use config::Settings;
pub use error::{Error, Result};
pub use player::Player;
pub use state::{PlaybackState, RepeatMode, StateStore, Subscription};
pub use track::Track;

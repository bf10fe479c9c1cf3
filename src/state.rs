//! Observable playback state.
//!
//! This module defines the `PlaybackState` snapshot, the store that owns the
//! single authoritative copy of it and the subscription fan-out used by UI
//! widgets and other observers.

mod model;
mod store;

pub use model::{PlaybackState, RepeatMode};
pub use store::{StateStore, Subscription};

//! Configuration loader and schema types.
//!
//! This module exposes the engine settings schema and helpers to load
//! configuration from disk and environment.

mod load;
mod schema;

pub use schema::*;

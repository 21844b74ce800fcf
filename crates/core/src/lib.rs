//! Domain types shared by every fotoai crate.
//!
//! - [`category`] / [`background`] -- request vocabulary.
//! - [`settings`] / [`resolve`] -- settings snapshot and configuration resolution.
//! - [`compose`] -- pure foreground-over-background compositing.
//! - [`ports`] -- traits implemented by the db, storage and provider crates.

pub mod artifact;
pub mod background;
pub mod category;
pub mod compose;
pub mod error;
pub mod ports;
pub mod resolve;
pub mod settings;
pub mod types;

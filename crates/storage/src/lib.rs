//! Object storage client.
//!
//! Talks to a Supabase-compatible storage REST API: signed URLs for uploaded
//! sources, artifact uploads into the processed bucket, and the listing and
//! removal calls used by the orphan sweep.

pub mod client;
pub mod config;

pub use client::{StorageClient, StorageEntry, StorageError};
pub use config::StorageConfig;

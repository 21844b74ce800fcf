//! HTTP surface of the fotoai enhancement service.
//!
//! The binary in `main.rs` wires the Postgres, storage and provider adapters
//! into an [`fotoai_pipeline::EnhancementPipeline`] and serves it through
//! [`router::build_app_router`]. Integration tests build the same router with
//! in-memory collaborators.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;

//! Clients for the external AI image providers.
//!
//! - [`fal`] -- enhancement, background removal and background generation
//!   over fal.ai-style synchronous HTTP endpoints.
//! - [`envelope`] -- normalisation of the different response shapes.
//! - [`fetch`] -- downloads of provider-hosted artifacts.

pub mod config;
pub mod envelope;
pub mod fal;
pub mod fetch;

pub use config::ProviderConfig;
pub use fal::FalClient;
pub use fetch::HttpFetcher;

//! Deployment-level switches of the pipeline.

use std::str::FromStr;
use std::time::Duration;

/// Signed source URLs live this long unless overridden.
pub const DEFAULT_SOURCE_URL_TTL_SECS: u64 = 300;

/// What to do when the enhancement provider call itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Surface `ProviderCallFailed` to the caller.
    #[default]
    Abort,
    /// Answer with the original upload instead. Nothing is stored or charged.
    FallbackToOriginal,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(Self::Abort),
            "fallback" => Ok(Self::FallbackToOriginal),
            other => Err(format!("unknown failure policy '{other}' (expected abort|fallback)")),
        }
    }
}

/// Where foreground and background layers are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositeMode {
    /// Return both layer URLs; the caller composites.
    #[default]
    Client,
    /// Composite in-process and store the result as the final artifact.
    Server,
}

impl CompositeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

impl FromStr for CompositeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            other => Err(format!("unknown composite mode '{other}' (expected client|server)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub failure_policy: FailurePolicy,
    pub composite_mode: CompositeMode,
    pub source_url_ttl: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            composite_mode: CompositeMode::default(),
            source_url_ttl: Duration::from_secs(DEFAULT_SOURCE_URL_TTL_SECS),
        }
    }
}

impl PipelineOptions {
    /// Load pipeline options from environment variables.
    ///
    /// | Env Var                   | Default  |
    /// |---------------------------|----------|
    /// | `PROVIDER_FAILURE_POLICY` | `abort`  |
    /// | `COMPOSITE_MODE`          | `client` |
    /// | `SOURCE_URL_TTL_SECS`     | `300`    |
    ///
    /// # Panics
    ///
    /// Panics on unrecognised values.
    pub fn from_env() -> Self {
        let failure_policy: FailurePolicy = std::env::var("PROVIDER_FAILURE_POLICY")
            .map(|v| v.parse().unwrap_or_else(|e: String| panic!("PROVIDER_FAILURE_POLICY: {e}")))
            .unwrap_or_default();

        let composite_mode: CompositeMode = std::env::var("COMPOSITE_MODE")
            .map(|v| v.parse().unwrap_or_else(|e: String| panic!("COMPOSITE_MODE: {e}")))
            .unwrap_or_default();

        let ttl_secs: u64 = std::env::var("SOURCE_URL_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_SOURCE_URL_TTL_SECS.to_string())
            .parse()
            .expect("SOURCE_URL_TTL_SECS must be a valid u64");

        Self {
            failure_policy,
            composite_mode,
            source_url_ttl: Duration::from_secs(ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_values() {
        assert_eq!("abort".parse::<FailurePolicy>(), Ok(FailurePolicy::Abort));
        assert_eq!("fallback".parse::<FailurePolicy>(), Ok(FailurePolicy::FallbackToOriginal));
        assert!("retry".parse::<FailurePolicy>().is_err());

        assert_eq!("server".parse::<CompositeMode>(), Ok(CompositeMode::Server));
        assert!("both".parse::<CompositeMode>().is_err());
    }

    #[test]
    fn defaults_abort_client_side_five_minutes() {
        let options = PipelineOptions::default();
        assert_eq!(options.failure_policy, FailurePolicy::Abort);
        assert_eq!(options.composite_mode, CompositeMode::Client);
        assert_eq!(options.source_url_ttl, Duration::from_secs(300));
    }
}

pub const DEFAULT_ENHANCE_ENDPOINT: &str = "https://fal.run/fal-ai/flux-pro/kontext/max";
pub const DEFAULT_REMBG_ENDPOINT: &str = "https://fal.run/fal-ai/rembg";
/// Provider calls are synchronous, so this bounds the whole enhancement step.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// AI provider endpoints and credentials.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub enhance_endpoint: String,
    pub rembg_endpoint: String,
    pub background_endpoint: String,
    pub timeout_secs: u64,
    /// Recorded in processing results as `ai_model_used`.
    pub model_name: String,
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// | Env Var                   | Required | Default                          |
    /// |---------------------------|----------|----------------------------------|
    /// | `FAL_API_KEY`             | **yes**  | --                               |
    /// | `FAL_ENHANCE_ENDPOINT`    | no       | flux-pro kontext max             |
    /// | `FAL_REMBG_ENDPOINT`      | no       | rembg                            |
    /// | `FAL_BACKGROUND_ENDPOINT` | no       | same as `FAL_ENHANCE_ENDPOINT`   |
    /// | `PROVIDER_TIMEOUT_SECS`   | no       | `120`                            |
    /// | `ENHANCEMENT_MODEL_NAME`  | no       | path of the enhance endpoint     |
    ///
    /// # Panics
    ///
    /// Panics if `FAL_API_KEY` is missing or empty, or the timeout does not parse.
    pub fn from_env() -> Self {
        let api_key = std::env::var("FAL_API_KEY").expect("FAL_API_KEY must be set");
        assert!(!api_key.is_empty(), "FAL_API_KEY must not be empty");

        let enhance_endpoint = std::env::var("FAL_ENHANCE_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENHANCE_ENDPOINT.into());
        let rembg_endpoint =
            std::env::var("FAL_REMBG_ENDPOINT").unwrap_or_else(|_| DEFAULT_REMBG_ENDPOINT.into());
        let background_endpoint =
            std::env::var("FAL_BACKGROUND_ENDPOINT").unwrap_or_else(|_| enhance_endpoint.clone());

        let timeout_secs: u64 = std::env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("PROVIDER_TIMEOUT_SECS must be a valid u64");

        let model_name = std::env::var("ENHANCEMENT_MODEL_NAME")
            .unwrap_or_else(|_| model_name_from_endpoint(&enhance_endpoint));

        Self {
            api_key,
            enhance_endpoint,
            rembg_endpoint,
            background_endpoint,
            timeout_secs,
            model_name,
        }
    }
}

/// `https://fal.run/fal-ai/rembg` -> `fal-ai/rembg`.
pub fn model_name_from_endpoint(endpoint: &str) -> String {
    match reqwest::Url::parse(endpoint) {
        Ok(url) => url.path().trim_matches('/').to_string(),
        Err(_) => endpoint.to_string(),
    }
}

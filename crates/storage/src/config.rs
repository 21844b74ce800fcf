/// Default bucket holding user uploads.
pub const DEFAULT_UPLOAD_BUCKET: &str = "uploaded-images";
/// Default bucket holding finished artifacts.
pub const DEFAULT_PROCESSED_BUCKET: &str = "processed-images";
/// Default HTTP timeout for storage calls.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the storage REST API.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Service-role key; sent as both `apikey` and bearer token.
    pub service_key: String,
    pub upload_bucket: String,
    pub processed_bucket: String,
    pub timeout_secs: u64,
}

impl StorageConfig {
    /// Load storage configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default            |
    /// |----------------------------|----------|--------------------|
    /// | `STORAGE_URL`              | **yes**  | --                 |
    /// | `STORAGE_SERVICE_KEY`      | **yes**  | --                 |
    /// | `STORAGE_UPLOAD_BUCKET`    | no       | `uploaded-images`  |
    /// | `STORAGE_PROCESSED_BUCKET` | no       | `processed-images` |
    /// | `STORAGE_TIMEOUT_SECS`     | no       | `30`               |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or a number does not parse.
    pub fn from_env() -> Self {
        let base_url = std::env::var("STORAGE_URL").expect("STORAGE_URL must be set");
        let service_key =
            std::env::var("STORAGE_SERVICE_KEY").expect("STORAGE_SERVICE_KEY must be set");
        assert!(!service_key.is_empty(), "STORAGE_SERVICE_KEY must not be empty");

        let upload_bucket = std::env::var("STORAGE_UPLOAD_BUCKET")
            .unwrap_or_else(|_| DEFAULT_UPLOAD_BUCKET.into());
        let processed_bucket = std::env::var("STORAGE_PROCESSED_BUCKET")
            .unwrap_or_else(|_| DEFAULT_PROCESSED_BUCKET.into());

        let timeout_secs: u64 = std::env::var("STORAGE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("STORAGE_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            upload_bucket,
            processed_bucket,
            timeout_secs,
        }
    }
}

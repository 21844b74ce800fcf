//! In-memory doubles for every collaborator port of the enhancement
//! pipeline, plus a [`Harness`] holding one fully-wired set of them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use fotoai_core::artifact::{ArtifactRef, ProviderError};
use fotoai_core::category::ProcessingType;
use fotoai_core::error::CoreError;
use fotoai_core::ports::{
    ArtifactFetcher, BackgroundGenerator, BackgroundRemover, CreditLedger, EnhancementProvider,
    IdentityVerifier, NewProcessingResult, ObjectStore, ProcessingResultRecord, ResultStore,
    SettingsSource, StoredObject,
};
use fotoai_core::resolve::ResolvedConfig;
use fotoai_core::settings::{
    BackgroundPreset, BackgroundSettings, CategorySettings, SettingsSnapshot,
};
use fotoai_core::types::UserId;

pub const TEST_TOKEN: &str = "test-token";
pub const ENHANCED_URL: &str = "https://provider.test/enhanced.png";
pub const FOREGROUND_URL: &str = "https://provider.test/foreground.png";
pub const BACKGROUND_URL: &str = "https://provider.test/background.png";
pub const NEUTRAL_FRAGMENT: &str = "On a seamless neutral studio backdrop.";
pub const NEUTRAL_SCENE: &str = "Empty photo studio with a soft grey backdrop";
pub const PARK_FRAGMENT: &str = "Outdoors in a sunny green park.";
pub const PARK_SCENE: &str = "Green park on a sunny afternoon";
pub const BACKGROUND_STRENGTH: f64 = 0.85;
/// PNG signature; enough for format sniffing.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settings with every category configured and both background presets.
pub fn sample_snapshot() -> SettingsSnapshot {
    let prompts = [
        (ProcessingType::Food, "Make the dish look fresh and appetizing.", 0.30),
        (ProcessingType::Vehicles, "Polish the paint and fix reflections.", 0.25),
        (ProcessingType::RealEstate, "Brighten the room and straighten lines.", 0.35),
        (ProcessingType::Products, "Clean catalogue product shot.", 0.40),
    ];
    let categories = prompts
        .into_iter()
        .map(|(category, prompt, strength)| {
            (
                category,
                CategorySettings {
                    prompt: Some(prompt.to_string()),
                    strength,
                    negative_prompt: Some("blurry, distorted".to_string()),
                    ..CategorySettings::default()
                },
            )
        })
        .collect();

    SettingsSnapshot {
        version: 3,
        maintenance_mode: false,
        maintenance_message: None,
        categories,
        background: BackgroundSettings {
            neutral: BackgroundPreset {
                fragment: NEUTRAL_FRAGMENT.to_string(),
                scene_prompt: NEUTRAL_SCENE.to_string(),
            },
            scene: BackgroundPreset {
                fragment: PARK_FRAGMENT.to_string(),
                scene_prompt: PARK_SCENE.to_string(),
            },
            strength_override: BACKGROUND_STRENGTH,
        },
    }
}

// ---------------------------------------------------------------------------
// Identity, credits, settings, results
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, UserId>,
    calls: AtomicUsize,
}

impl StaticIdentity {
    pub fn with_user(mut self, token: &str, user_id: UserId) -> Self {
        self.tokens.insert(token.to_string(), user_id);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn verify(&self, token: &str) -> Result<UserId, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| CoreError::Unauthorized("unknown token".to_string()))
    }
}

/// Ledger whose conditional decrement is atomic under one lock.
#[derive(Default)]
pub struct MemoryLedger {
    balances: Mutex<HashMap<UserId, i32>>,
    decrements: AtomicUsize,
    failing: bool,
    failing_decrements: bool,
}

impl MemoryLedger {
    pub fn with_balance(self, user_id: UserId, balance: i32) -> Self {
        lock(&self.balances).insert(user_id, balance);
        self
    }

    /// Every call fails as if the database were down.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Balance reads succeed but the decrement fails, as if the database
    /// dropped between admission and settlement.
    pub fn failing_decrements(mut self) -> Self {
        self.failing_decrements = true;
        self
    }

    pub fn balance(&self, user_id: UserId) -> Option<i32> {
        lock(&self.balances).get(&user_id).copied()
    }

    pub fn set_balance(&self, user_id: UserId, balance: i32) {
        lock(&self.balances).insert(user_id, balance);
    }

    /// Successful decrements so far.
    pub fn decrements(&self) -> usize {
        self.decrements.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreditLedger for MemoryLedger {
    async fn remaining(&self, user_id: UserId) -> Result<Option<i32>, CoreError> {
        if self.failing {
            return Err(CoreError::Internal("ledger offline".to_string()));
        }
        Ok(self.balance(user_id))
    }

    async fn try_decrement(&self, user_id: UserId, amount: i32) -> Result<Option<i32>, CoreError> {
        if self.failing || self.failing_decrements {
            return Err(CoreError::Internal("ledger offline".to_string()));
        }
        let mut balances = lock(&self.balances);
        match balances.get_mut(&user_id) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                self.decrements.fetch_add(1, Ordering::SeqCst);
                Ok(Some(*balance))
            }
            _ => Ok(None),
        }
    }
}

pub struct FixedSettings {
    snapshot: Mutex<Option<SettingsSnapshot>>,
}

impl FixedSettings {
    pub fn new(snapshot: SettingsSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }

    /// No settings record exists.
    pub fn missing() -> Self {
        Self {
            snapshot: Mutex::new(None),
        }
    }

    pub fn replace(&self, snapshot: SettingsSnapshot) {
        *lock(&self.snapshot) = Some(snapshot);
    }
}

#[async_trait]
impl SettingsSource for FixedSettings {
    async fn snapshot(&self) -> Result<SettingsSnapshot, CoreError> {
        lock(&self.snapshot)
            .clone()
            .ok_or_else(|| CoreError::NotFound("platform settings record".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingResults {
    rows: Mutex<Vec<NewProcessingResult>>,
    next_id: AtomicI64,
    failing: bool,
}

impl RecordingResults {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<NewProcessingResult> {
        lock(&self.rows).clone()
    }
}

#[async_trait]
impl ResultStore for RecordingResults {
    async fn insert(&self, result: &NewProcessingResult) -> Result<ProcessingResultRecord, CoreError> {
        if self.failing {
            return Err(CoreError::Internal("insert rejected".to_string()));
        }
        lock(&self.rows).push(result.clone());
        Ok(ProcessingResultRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            created_at: now(),
        })
    }
}

fn now() -> fotoai_core::types::Timestamp {
    fotoai_core::types::Timestamp::from(std::time::SystemTime::now())
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStorage {
    missing_sources: HashSet<String>,
    signed: Mutex<Vec<String>>,
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    failing_writes: bool,
    unreachable: bool,
}

impl MemoryStorage {
    /// Signing `path` fails as if the upload did not exist.
    pub fn without_source(mut self, path: &str) -> Self {
        self.missing_sources.insert(path.to_string());
        self
    }

    pub fn failing_writes() -> Self {
        Self {
            failing_writes: true,
            ..Self::default()
        }
    }

    /// Health checks fail as if the storage service were down.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Paths a signed URL was requested for, in order.
    pub fn signed_paths(&self) -> Vec<String> {
        lock(&self.signed).clone()
    }

    pub fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        lock(&self.objects).get(path).cloned()
    }

    pub fn object_count(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn signed_url_for(path: &str) -> String {
        format!("https://storage.test/signed/{path}")
    }

    pub fn public_url_for(path: &str) -> String {
        format!("https://storage.test/public/{path}")
    }
}

#[async_trait]
impl ObjectStore for MemoryStorage {
    async fn signed_source_url(&self, path: &str, _ttl: Duration) -> Result<String, CoreError> {
        lock(&self.signed).push(path.to_string());
        if self.missing_sources.contains(path) {
            return Err(CoreError::NotFound(format!("object {path}")));
        }
        Ok(Self::signed_url_for(path))
    }

    async fn put_artifact(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, CoreError> {
        if self.failing_writes {
            return Err(CoreError::Upstream("bucket unavailable".to_string()));
        }
        let mut objects = lock(&self.objects);
        if objects.contains_key(path) {
            return Err(CoreError::Upstream(format!("409 duplicate {path}")));
        }
        objects.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(StoredObject {
            path: path.to_string(),
            public_url: Self::public_url_for(path),
        })
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        if self.unreachable {
            return Err(CoreError::Upstream("storage unreachable".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AI providers
// ---------------------------------------------------------------------------

pub struct ScriptedEnhancer {
    result: Result<ArtifactRef, ProviderError>,
    delay: Duration,
    calls: AtomicUsize,
    last: Mutex<Option<(String, ResolvedConfig)>>,
}

impl ScriptedEnhancer {
    pub fn returning(artifact: ArtifactRef) -> Self {
        Self::scripted(Ok(artifact))
    }

    pub fn failing(err: ProviderError) -> Self {
        Self::scripted(Err(err))
    }

    fn scripted(result: Result<ArtifactRef, ProviderError>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Source URL and resolved configuration of the latest call.
    pub fn last_call(&self) -> Option<(String, ResolvedConfig)> {
        lock(&self.last).clone()
    }
}

#[async_trait]
impl EnhancementProvider for ScriptedEnhancer {
    async fn enhance(
        &self,
        image_url: &str,
        config: &ResolvedConfig,
    ) -> Result<ArtifactRef, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last) = Some((image_url.to_string(), config.clone()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }

    fn model_name(&self) -> &str {
        "test/enhancer"
    }
}

/// Background remover or generator with a fixed answer and latency.
pub struct ScriptedLayer {
    result: Result<String, ProviderError>,
    delay: Duration,
    inputs: Mutex<Vec<String>>,
}

impl ScriptedLayer {
    pub fn returning(url: &str) -> Self {
        Self::scripted(Ok(url.to_string()))
    }

    pub fn failing(err: ProviderError) -> Self {
        Self::scripted(Err(err))
    }

    fn scripted(result: Result<String, ProviderError>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        lock(&self.inputs).len()
    }

    /// Image URLs or prompts received, in order.
    pub fn inputs(&self) -> Vec<String> {
        lock(&self.inputs).clone()
    }

    async fn answer(&self, input: &str) -> Result<String, ProviderError> {
        lock(&self.inputs).push(input.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

#[async_trait]
impl BackgroundRemover for ScriptedLayer {
    async fn remove_background(&self, image_url: &str) -> Result<String, ProviderError> {
        self.answer(image_url).await
    }
}

#[async_trait]
impl BackgroundGenerator for ScriptedLayer {
    async fn generate_background(&self, prompt: &str) -> Result<String, ProviderError> {
        self.answer(prompt).await
    }
}

#[derive(Default)]
pub struct MemoryFetcher {
    objects: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl MemoryFetcher {
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.objects.insert(url.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects.get(url).cloned().ok_or_else(|| ProviderError::Call {
            status: Some(404),
            diagnostic: format!("no object at {url}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// One user with credits, every provider answering successfully.
///
/// Swap any field before wiring the pipeline to script a failure.
pub struct Harness {
    pub user_id: UserId,
    pub identity: Arc<StaticIdentity>,
    pub credits: Arc<MemoryLedger>,
    pub settings: Arc<FixedSettings>,
    pub results: Arc<RecordingResults>,
    pub storage: Arc<MemoryStorage>,
    pub enhancer: Arc<ScriptedEnhancer>,
    pub remover: Arc<ScriptedLayer>,
    pub generator: Arc<ScriptedLayer>,
    pub fetcher: Arc<MemoryFetcher>,
}

pub const STARTING_CREDITS: i32 = 5;

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        let user_id = uuid::Uuid::new_v4();
        Self {
            user_id,
            identity: Arc::new(StaticIdentity::default().with_user(TEST_TOKEN, user_id)),
            credits: Arc::new(MemoryLedger::default().with_balance(user_id, STARTING_CREDITS)),
            settings: Arc::new(FixedSettings::new(sample_snapshot())),
            results: Arc::new(RecordingResults::default()),
            storage: Arc::new(MemoryStorage::default()),
            enhancer: Arc::new(ScriptedEnhancer::returning(ArtifactRef::Url(
                ENHANCED_URL.to_string(),
            ))),
            remover: Arc::new(ScriptedLayer::returning(FOREGROUND_URL)),
            generator: Arc::new(ScriptedLayer::returning(BACKGROUND_URL)),
            fetcher: Arc::new(MemoryFetcher::default().with(ENHANCED_URL, PNG_BYTES.to_vec())),
        }
    }

    /// Total provider calls of any kind.
    pub fn provider_calls(&self) -> usize {
        self.enhancer.calls() + self.remover.calls() + self.generator.calls()
    }
}

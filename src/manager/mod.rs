/*!
 * Translation orchestration across providers.
 *
 * The `TranslatorManager` owns every configured provider together with its
 * health record. For each request it orders the providers, skips the ones that
 * are unhealthy or at their rate limit, retries transient failures with
 * exponential backoff and falls back to the next provider when one gives up.
 *
 * The manager is a single-writer structure: translation and maintenance
 * methods take `&mut self`, so concurrent callers must serialize access
 * (for example behind a `tokio::sync::Mutex`).
 */

use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use log::{debug, error, info, warn};

use crate::app_config::{CircuitBreakerConfig, Config, GeneralConfig, RetryConfig, TranslatorConfig};
use crate::errors::{ManagerError, TranslationError};
use crate::models::{TimedSegment, TranslationResult};
use crate::providers::{KNOWN_PROVIDERS, TranslationProvider, create_provider, ollama};
use crate::translation::SegmentTranslator;

pub mod health;

pub use self::health::{ProviderHealth, TranslatorStatus};

/// Statistics snapshot of one provider
#[derive(Debug, Clone, Serialize)]
pub struct TranslatorStats {
    /// Status including the derived rate-limited state
    pub status: TranslatorStatus,
    /// Lifetime success rate
    pub success_rate: f64,
    /// Success rate over recent attempts
    pub rolling_success_rate: f64,
    /// Successful attempts
    pub success_count: u64,
    /// Failed attempts
    pub failure_count: u64,
    /// All attempts
    pub total_requests: u64,
    /// Consecutive failures
    pub error_count: u32,
    /// Average response time in seconds
    pub avg_response_time: f64,
    /// Requests in the current rate window
    pub requests_in_current_minute: u32,
    /// Most recent failure message
    pub last_error: Option<String>,
    /// Health predicate
    pub is_healthy: bool,
    /// Whether the per-minute cap is reached
    pub is_rate_limited: bool,
    /// Whether a provider instance exists
    pub initialized: bool,
    /// Configuration problems, if any
    pub config_errors: Vec<String>,
    /// Settings, with the API key and signing secret masked
    pub config: TranslatorConfig,
}

/// Provider registry with health tracking, retry and fallback
#[derive(Debug)]
pub struct TranslatorManager {
    /// Default and fallback provider names
    general: GeneralConfig,
    /// Backoff settings
    retry: RetryConfig,
    /// Circuit-breaker settings
    breaker: CircuitBreakerConfig,
    /// Segment translation strategy shared by all providers
    translator: SegmentTranslator,
    /// Provider instances by name
    providers: BTreeMap<String, Arc<dyn TranslationProvider>>,
    /// Health records by name
    health: BTreeMap<String, ProviderHealth>,
    /// Providers supplied by the caller instead of the factory
    injected: BTreeSet<String>,
}

/// Check provider settings, including credentials for providers that need them
pub fn validate_translator(name: &str, settings: &TranslatorConfig) -> Vec<String> {
    let mut errors = settings.validate();

    match name {
        "openai" if settings.api_key.trim().is_empty() => {
            errors.push("openai requires an api_key".to_string());
        }
        "baidu" if settings.app_id.trim().is_empty() || settings.secret_key.trim().is_empty() => {
            errors.push("baidu requires an app_id and a secret_key".to_string());
        }
        "ollama" => {
            if let Err(e) = ollama::parse_endpoint(&settings.endpoint) {
                errors.push(e.to_string());
            }
        }
        _ => {}
    }

    if !KNOWN_PROVIDERS.contains(&name) {
        errors.push(format!("unknown translator '{}'", name));
    }

    errors
}

/// Backoff before retry number `attempt + 1`
pub fn retry_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let backoff = retry.base_delay.max(0.0) * retry.backoff_factor.max(1.0).powi(exponent);
    let mut delay = backoff.min(retry.max_delay.max(0.0));

    if retry.jitter {
        delay *= rand::rng().random_range(0.5..=1.0);
    }

    Duration::try_from_secs_f64(delay).unwrap_or(Duration::ZERO)
}

fn configured_names(config: &Config) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = config.translators.keys().cloned().collect();
    for name in [&config.general.default_translator, &config.general.fallback_translator] {
        if !name.trim().is_empty() {
            names.insert(name.clone());
        }
    }
    names
}

fn masked(settings: &TranslatorConfig) -> TranslatorConfig {
    let mut settings = settings.clone();
    if !settings.api_key.is_empty() {
        settings.api_key = "***".to_string();
    }
    if !settings.secret_key.is_empty() {
        settings.secret_key = "***".to_string();
    }
    settings
}

impl TranslatorManager {
    fn empty(config: &Config) -> Self {
        Self {
            general: config.general.clone(),
            retry: config.translator_manager.retry.clone(),
            breaker: config.translator_manager.circuit_breaker.clone(),
            translator: SegmentTranslator::new(config.translation.clone()),
            providers: BTreeMap::new(),
            health: BTreeMap::new(),
            injected: BTreeSet::new(),
        }
    }

    /// Build every configured provider; invalid ones are kept in `ConfigError`
    pub fn from_config(config: &Config) -> Self {
        let mut manager = Self::empty(config);
        for name in configured_names(config) {
            manager.register_from_config(&name, config);
        }
        info!(
            "Translator manager ready with {} of {} translators available",
            manager.available_translators().len(),
            manager.health.len()
        );
        manager
    }

    /// Use already constructed providers, registered under their own names
    pub fn with_providers(config: &Config, providers: Vec<Arc<dyn TranslationProvider>>) -> Self {
        let mut manager = Self::empty(config);
        for provider in providers {
            let name = provider.name().to_string();
            manager.register_injected(&name, provider, config);
        }
        manager
    }

    fn register_from_config(&mut self, name: &str, config: &Config) {
        let settings = config.translator_config(name);
        let mut errors = validate_translator(name, &settings);

        self.providers.remove(name);
        if errors.is_empty() {
            match create_provider(name, config) {
                Ok(provider) => {
                    self.providers.insert(name.to_string(), provider);
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        if !errors.is_empty() {
            error!("Translator '{}' configuration error: {}", name, errors.join("; "));
        }
        self.health.insert(name.to_string(), ProviderHealth::new(settings, errors));
    }

    fn register_injected(&mut self, name: &str, provider: Arc<dyn TranslationProvider>, config: &Config) {
        let settings = config.translator_config(name);
        let errors = settings.validate();
        if !errors.is_empty() {
            error!("Translator '{}' configuration error: {}", name, errors.join("; "));
        }

        self.injected.insert(name.to_string());
        self.providers.insert(name.to_string(), provider);
        self.health.insert(name.to_string(), ProviderHealth::new(settings, errors));
    }

    /// Re-read settings, re-validate every provider and reset statistics
    pub fn reload_config(&mut self, config: &Config) {
        self.general = config.general.clone();
        self.retry = config.translator_manager.retry.clone();
        self.breaker = config.translator_manager.circuit_breaker.clone();
        self.translator = SegmentTranslator::new(config.translation.clone());

        let mut names = configured_names(config);
        names.extend(self.injected.iter().cloned());

        let previous: BTreeMap<String, TranslatorStatus> = self
            .health
            .iter()
            .map(|(name, health)| (name.clone(), health.status))
            .collect();

        self.health.retain(|name, _| names.contains(name));
        self.providers.retain(|name, _| names.contains(name));

        for name in &names {
            if self.injected.contains(name) {
                let settings = config.translator_config(name);
                let errors = settings.validate();
                if !errors.is_empty() {
                    error!("Translator '{}' configuration error: {}", name, errors.join("; "));
                }
                self.health.insert(name.clone(), ProviderHealth::new(settings, errors));
            } else {
                self.register_from_config(name, config);
            }

            let now_status = self.health.get(name).map(|health| health.status);
            if previous.get(name) == Some(&TranslatorStatus::ConfigError)
                && now_status != Some(TranslatorStatus::ConfigError)
            {
                info!("Translator '{}' configuration is valid again", name);
            }
        }

        info!("Translator configuration reloaded, statistics reset");
    }

    /// Provider names in the order they are tried for a request.
    ///
    /// An unhealthy preferred provider loses its lead and is ordered with the rest.
    pub fn translator_priority(&self, preferred: Option<&str>) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();

        let preferred = preferred.filter(|name| self.health.get(*name).is_some_and(ProviderHealth::is_healthy));
        let leading = [
            preferred,
            Some(self.general.default_translator.as_str()),
            Some(self.general.fallback_translator.as_str()),
        ];
        for name in leading.into_iter().flatten() {
            if self.health.contains_key(name) && !order.iter().any(|known| known == name) {
                order.push(name.to_string());
            }
        }

        let mut rest: Vec<(&String, &ProviderHealth)> = self
            .health
            .iter()
            .filter(|(name, _)| !order.contains(*name))
            .collect();
        rest.sort_by(|(_, a), (_, b)| {
            a.settings
                .priority
                .cmp(&b.settings.priority)
                .then_with(|| b.success_rate().partial_cmp(&a.success_rate()).unwrap_or(Ordering::Equal))
        });

        order.extend(rest.into_iter().map(|(name, _)| name.clone()));
        order
    }

    /// Translate `segments`, retrying and falling back across providers.
    ///
    /// Only a failure of every eligible provider is returned as an error.
    pub async fn translate_with_retry(
        &mut self,
        segments: &[TimedSegment],
        target_language: &str,
        source_language: &str,
        preferred_translator: Option<&str>,
    ) -> Result<TranslationResult, ManagerError> {
        if segments.is_empty() {
            return Ok(TranslationResult::empty(source_language, target_language));
        }

        let mut last_error: Option<TranslationError> = None;

        for name in self.translator_priority(preferred_translator) {
            let Some(provider) = self.providers.get(&name).cloned() else {
                debug!("Translator '{}' is not initialized, skipping", name);
                continue;
            };

            let now = Instant::now();
            let Some(health) = self.health.get_mut(&name) else {
                continue;
            };

            if health.is_rate_limited(now) {
                debug!("Translator '{}' is rate limited, skipping", name);
                continue;
            }
            if !health.admit(now, &self.breaker) {
                debug!("Translator '{}' is {} and not healthy, skipping", name, health.status);
                continue;
            }
            if health.is_half_open() {
                info!("Translator '{}' gets a trial call after its recovery timeout", name);
            }

            match self
                .translate_with_provider(&name, provider.as_ref(), segments, target_language, source_language)
                .await
            {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!("Translator '{}' failed: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last_error) => {
                error!("All translators failed, last error: {}", last_error);
                Err(ManagerError::AllTranslatorsFailed { last_error })
            }
            None => {
                error!("No eligible translator available");
                Err(ManagerError::NoEligibleTranslator)
            }
        }
    }

    /// One provider attempt including its retries
    async fn translate_with_provider(
        &mut self,
        name: &str,
        provider: &dyn TranslationProvider,
        segments: &[TimedSegment],
        target_language: &str,
        source_language: &str,
    ) -> Result<TranslationResult, TranslationError> {
        let settings = self
            .health
            .get(name)
            .map(|health| health.settings.clone())
            .unwrap_or_default();
        let retries = u32::try_from(settings.retry_count)
            .unwrap_or(0)
            .min(self.retry.max_retries);
        let translator = self.translator.clone().with_call_timeout(settings.timeout_duration());

        let mut attempt = 0;
        loop {
            if let Some(health) = self.health.get_mut(name) {
                health.note_request(Instant::now());
            }

            let started = Instant::now();
            match translator
                .translate_segments(provider, segments, target_language, source_language)
                .await
            {
                Ok(result) => {
                    if let Some(health) = self.health.get_mut(name) {
                        if health.record_success(started.elapsed()) {
                            info!("Translator '{}' recovered and is available again", name);
                        }
                    }
                    return Ok(result);
                }
                Err(e) => {
                    let rate_limited = self
                        .health
                        .get(name)
                        .is_some_and(|health| health.is_rate_limited(Instant::now()));

                    if e.is_retryable() && attempt < retries && !rate_limited {
                        let delay = retry_delay(&self.retry, attempt);
                        debug!(
                            "Translator '{}' attempt {} failed: {}, retrying in {:.1}s",
                            name,
                            attempt + 1,
                            e,
                            delay.as_secs_f64()
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if let Some(health) = self.health.get_mut(name) {
                        match health.record_failure(&e.to_string(), Instant::now(), &self.breaker) {
                            Some(TranslatorStatus::Unavailable) => warn!(
                                "Translator '{}' marked unavailable after {} consecutive failures",
                                name, health.error_count
                            ),
                            Some(TranslatorStatus::Degraded) => warn!("Translator '{}' degraded", name),
                            _ => {}
                        }
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Best healthy, non rate-limited provider outside `exclude`
    pub fn best_translator(&self, exclude: &[&str]) -> Option<String> {
        let now = Instant::now();
        let mut candidates: Vec<(&String, &ProviderHealth)> = self
            .health
            .iter()
            .filter(|(name, health)| {
                !exclude.contains(&name.as_str())
                    && self.providers.contains_key(*name)
                    && health.is_healthy()
                    && !health.is_rate_limited(now)
            })
            .collect();

        candidates.sort_by(|(_, a), (_, b)| {
            a.settings
                .priority
                .cmp(&b.settings.priority)
                .then_with(|| b.success_rate().partial_cmp(&a.success_rate()).unwrap_or(Ordering::Equal))
                .then_with(|| {
                    a.avg_response_time
                        .partial_cmp(&b.avg_response_time)
                        .unwrap_or(Ordering::Equal)
                })
        });

        candidates.first().map(|(name, _)| (*name).clone())
    }

    /// Names of healthy, initialized providers
    pub fn available_translators(&self) -> Vec<String> {
        self.health
            .iter()
            .filter(|(name, health)| self.providers.contains_key(*name) && health.is_healthy())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Health record of one provider
    pub fn health(&self, name: &str) -> Option<&ProviderHealth> {
        self.health.get(name)
    }

    /// Statistics of every provider
    pub fn translator_stats(&self) -> BTreeMap<String, TranslatorStats> {
        let now = Instant::now();
        self.health
            .iter()
            .map(|(name, health)| {
                let stats = TranslatorStats {
                    status: health.effective_status(now),
                    success_rate: health.success_rate(),
                    rolling_success_rate: health.rolling_success_rate(),
                    success_count: health.success_count,
                    failure_count: health.failure_count,
                    total_requests: health.total_requests,
                    error_count: health.error_count,
                    avg_response_time: health.avg_response_time,
                    requests_in_current_minute: health.requests_in_current_minute,
                    last_error: health.last_error.clone(),
                    is_healthy: health.is_healthy(),
                    is_rate_limited: health.is_rate_limited(now),
                    initialized: self.providers.contains_key(name),
                    config_errors: health.config_errors.clone(),
                    config: masked(&health.settings),
                };
                (name.clone(), stats)
            })
            .collect()
    }

    /// Reset statistics of one provider, or of all when `name` is `None`
    pub fn reset_translator_stats(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                if let Some(health) = self.health.get_mut(name) {
                    health.reset();
                    info!("Statistics of translator '{}' reset", name);
                }
            }
            None => {
                self.health.values_mut().for_each(ProviderHealth::reset);
                info!("Statistics of all translators reset");
            }
        }
    }

    /// Retry settings in use
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }
}

/*!
 * Per-provider health tracking.
 *
 * A `ProviderHealth` record holds the counters, the rolling outcome window and
 * the circuit-breaker state of one provider. Records are only mutated by the
 * `TranslatorManager` that owns them.
 */

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use crate::app_config::{CircuitBreakerConfig, TranslatorConfig};

/// Number of recent outcomes used for the rolling success rate
pub const ROLLING_WINDOW: usize = 20;

/// Rolling success rate below which a provider is excluded
const HEALTHY_RATE: f64 = 0.5;

/// Rolling success rate below which an available provider is degraded
const DEGRADED_RATE: f64 = 0.7;

/// Rolling success rate at which a degraded provider recovers
const RECOVERED_RATE: f64 = 0.8;

/// Smoothing factor of the response time moving average
const RESPONSE_TIME_ALPHA: f64 = 0.1;

/// Length of the rate-limiting window
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Provider status as seen by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslatorStatus {
    /// Healthy and selectable
    Available,
    /// Selectable, but failing often
    Degraded,
    /// Disabled or tripped by the circuit breaker
    Unavailable,
    /// At its per-minute request cap (derived, never stored)
    RateLimited,
    /// Invalid configuration; excluded until the configuration is fixed
    ConfigError,
}

impl fmt::Display for TranslatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "available",
            Self::Degraded => "degraded",
            Self::Unavailable => "unavailable",
            Self::RateLimited => "rate_limited",
            Self::ConfigError => "config_error",
        };
        f.write_str(label)
    }
}

/// Health record of one provider
#[derive(Debug, Clone)]
pub struct ProviderHealth {
    /// Stored status
    pub status: TranslatorStatus,

    /// Successful attempts over the provider's lifetime
    pub success_count: u64,

    /// Failed attempts over the provider's lifetime
    pub failure_count: u64,

    /// All attempts over the provider's lifetime
    pub total_requests: u64,

    /// Consecutive failed attempts
    pub error_count: u32,

    /// Message of the most recent failure
    pub last_error: Option<String>,

    /// Time of the most recent failure
    pub last_error_time: Option<Instant>,

    /// Exponential moving average of successful response times, in seconds
    pub avg_response_time: f64,

    /// Requests issued in the current rate window
    pub requests_in_current_minute: u32,

    /// Time of the most recent request
    pub last_request_time: Option<Instant>,

    /// Provider settings this record was built from
    pub settings: TranslatorConfig,

    /// Problems found when validating `settings`
    pub config_errors: Vec<String>,

    /// Recent outcomes, oldest first
    recent: VecDeque<bool>,

    /// Whether the current attempt is a recovery trial
    half_open: bool,

    /// Failed recovery trials since the breaker tripped
    half_open_failures: u32,
}

impl ProviderHealth {
    /// Create a record; any configuration problem puts it in `ConfigError`
    pub fn new(settings: TranslatorConfig, config_errors: Vec<String>) -> Self {
        let status = initial_status(&settings, &config_errors);
        Self {
            status,
            success_count: 0,
            failure_count: 0,
            total_requests: 0,
            error_count: 0,
            last_error: None,
            last_error_time: None,
            avg_response_time: 0.0,
            requests_in_current_minute: 0,
            last_request_time: None,
            settings,
            config_errors,
            recent: VecDeque::with_capacity(ROLLING_WINDOW),
            half_open: false,
            half_open_failures: 0,
        }
    }

    /// Whether the provider is enabled in its settings
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Success rate over the lifetime of the provider (0 before any request)
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_requests as f64
        }
    }

    /// Success rate over the last `ROLLING_WINDOW` attempts (1 before any request)
    pub fn rolling_success_rate(&self) -> f64 {
        if self.recent.is_empty() {
            return 1.0;
        }
        self.recent.iter().filter(|ok| **ok).count() as f64 / self.recent.len() as f64
    }

    /// Enabled, available or degraded, and not failing most of the time
    pub fn is_healthy(&self) -> bool {
        self.is_enabled()
            && matches!(self.status, TranslatorStatus::Available | TranslatorStatus::Degraded)
            && (self.total_requests == 0 || self.rolling_success_rate() >= HEALTHY_RATE)
    }

    /// Whether the per-minute request cap is reached at `now`
    pub fn is_rate_limited(&self, now: Instant) -> bool {
        match self.last_request_time {
            Some(last) if now.duration_since(last) <= RATE_WINDOW => {
                i64::from(self.requests_in_current_minute) >= self.settings.max_requests_per_minute
            }
            _ => false,
        }
    }

    /// Status reported to callers, including the derived rate-limited state
    pub fn effective_status(&self, now: Instant) -> TranslatorStatus {
        if self.is_healthy() && self.is_rate_limited(now) {
            TranslatorStatus::RateLimited
        } else {
            self.status
        }
    }

    /// Whether an excluded provider may get a recovery trial at `now`
    pub fn can_attempt_recovery(&self, now: Instant, breaker: &CircuitBreakerConfig) -> bool {
        if !self.is_enabled() || self.status == TranslatorStatus::ConfigError {
            return false;
        }
        if self.half_open_failures >= breaker.half_open_max_calls {
            return false;
        }
        let recovery = Duration::try_from_secs_f64(breaker.recovery_timeout.max(0.0)).unwrap_or(Duration::MAX);
        self.last_error_time
            .is_some_and(|last| now.duration_since(last) >= recovery)
    }

    /// Decide whether the provider may be tried now, entering half-open if needed
    pub fn admit(&mut self, now: Instant, breaker: &CircuitBreakerConfig) -> bool {
        if self.is_healthy() {
            return true;
        }
        if self.can_attempt_recovery(now, breaker) {
            self.half_open = true;
            return true;
        }
        false
    }

    /// Whether the current attempt is a recovery trial
    pub fn is_half_open(&self) -> bool {
        self.half_open
    }

    /// Count an outgoing request for rate limiting
    pub fn note_request(&mut self, now: Instant) {
        let window_expired = self
            .last_request_time
            .is_none_or(|last| now.duration_since(last) > RATE_WINDOW);
        if window_expired {
            self.requests_in_current_minute = 0;
        }
        self.requests_in_current_minute += 1;
        self.last_request_time = Some(now);
    }

    /// Record a successful attempt that took `elapsed`.
    ///
    /// Returns true when the provider recovered to `Available`.
    pub fn record_success(&mut self, elapsed: Duration) -> bool {
        self.success_count += 1;
        self.total_requests += 1;
        self.error_count = 0;
        self.update_response_time(elapsed.as_secs_f64());

        if self.half_open {
            // A successful trial clears the failure history
            self.half_open = false;
            self.half_open_failures = 0;
            self.recent.clear();
            self.push_outcome(true);
            self.status = TranslatorStatus::Available;
            return true;
        }

        self.push_outcome(true);
        if self.status == TranslatorStatus::Degraded && self.rolling_success_rate() >= RECOVERED_RATE {
            self.status = TranslatorStatus::Available;
            return true;
        }
        false
    }

    /// Record a failed attempt; returns the new status when it changed
    pub fn record_failure(
        &mut self,
        error: &str,
        now: Instant,
        breaker: &CircuitBreakerConfig,
    ) -> Option<TranslatorStatus> {
        let before = self.status;

        self.failure_count += 1;
        self.total_requests += 1;
        self.error_count += 1;
        self.last_error = Some(error.to_string());
        self.last_error_time = Some(now);
        self.push_outcome(false);

        if self.half_open {
            self.half_open = false;
            self.half_open_failures += 1;
        }

        if self.error_count >= breaker.failure_threshold {
            self.status = TranslatorStatus::Unavailable;
        } else if self.status == TranslatorStatus::Available && self.rolling_success_rate() < DEGRADED_RATE {
            self.status = TranslatorStatus::Degraded;
        }

        (self.status != before).then_some(self.status)
    }

    /// Forget counters and history, keeping settings and configuration errors
    pub fn reset(&mut self) {
        *self = Self::new(self.settings.clone(), self.config_errors.clone());
    }

    fn push_outcome(&mut self, success: bool) {
        if self.recent.len() == ROLLING_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(success);
    }

    fn update_response_time(&mut self, sample: f64) {
        if self.avg_response_time == 0.0 {
            self.avg_response_time = sample;
        } else {
            self.avg_response_time =
                RESPONSE_TIME_ALPHA * sample + (1.0 - RESPONSE_TIME_ALPHA) * self.avg_response_time;
        }
    }
}

fn initial_status(settings: &TranslatorConfig, config_errors: &[String]) -> TranslatorStatus {
    if !config_errors.is_empty() {
        TranslatorStatus::ConfigError
    } else if settings.enabled {
        TranslatorStatus::Available
    } else {
        TranslatorStatus::Unavailable
    }
}

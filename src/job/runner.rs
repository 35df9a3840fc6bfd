//! Breaker-protected job execution.
//!
//! Every call runs the same sequence: lifecycle start, pre-flight
//! validation, breaker gate, backend call, breaker accounting, fallback,
//! lifecycle completion. Validation failures abort before the backend and
//! are never recorded against the breaker; transient and breaker-open
//! failures are absorbed into the fallback path.
//!
//! The default fallback masks failures behind a fixed success-shaped
//! value. This fail-open stance keeps *a* response available during
//! backend outages at the cost of accuracy; switch to
//! [`FallbackPolicy::Surface`] to get the failures as errors instead.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::breaker::{CallPermit, CircuitBreakerRegistry};

use super::{JobError, JobKey, JobValidator, LayerJob};

/// Command group all layer-job breakers are filed under.
pub const DEFAULT_COMMAND_GROUP: &str = "transport";

/// Fixed value returned by the default fallback policy.
pub const DEFAULT_FALLBACK_VALUE: &str = "success";

/// What `execute` returns when the backend call failed or was
/// short-circuited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Return the fixed value. The real outcome is visible only through
    /// the job's lifecycle notifications.
    Fixed(String),
    /// Surface the failure to the caller as an error.
    Surface,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_FALLBACK_VALUE.to_string())
    }
}

/// Runner configuration.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Command group for breaker identities; empty means
    /// [`DEFAULT_COMMAND_GROUP`].
    pub command_group: String,
    pub fallback: FallbackPolicy,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self {
            command_group: DEFAULT_COMMAND_GROUP.to_string(),
            fallback: FallbackPolicy::default(),
        }
    }

    pub fn with_command_group(mut self, group: impl Into<String>) -> Self {
        self.command_group = group.into();
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Execution errors, in breaker-accounting order of severity.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Pre-flight validation failed. Caller-correctable, not retryable as
    /// is, and never counted against the breaker.
    #[error("validation failed for ({0})")]
    Validation(JobKey),
    /// The backend call ran and failed. Counted against the breaker.
    #[error("backend call failed for ({key}): {source}")]
    Transient {
        key: JobKey,
        #[source]
        source: JobError,
    },
    /// The breaker was open; the backend was never invoked.
    #[error("circuit open for ({0}), call short-circuited")]
    BreakerOpen(JobKey),
}

/// Composes a validator, the breaker registry and an opaque job into
/// validated, breaker-protected, lifecycle-notified execution.
pub struct ResilientJobRunner {
    validator: Arc<dyn JobValidator>,
    breakers: Arc<CircuitBreakerRegistry>,
    config: RunnerConfig,
}

impl ResilientJobRunner {
    /// Create a runner with the default command group and fallback policy.
    pub fn new(validator: Arc<dyn JobValidator>, breakers: Arc<CircuitBreakerRegistry>) -> Self {
        Self::with_config(validator, breakers, RunnerConfig::new())
    }

    pub fn with_config(
        validator: Arc<dyn JobValidator>,
        breakers: Arc<CircuitBreakerRegistry>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            validator,
            breakers,
            config,
        }
    }

    fn command_group(&self) -> &str {
        if self.config.command_group.is_empty() {
            DEFAULT_COMMAND_GROUP
        } else {
            &self.config.command_group
        }
    }

    /// Execute a job through validation, breaker gate and fallback.
    pub fn execute(&self, job: &dyn LayerJob) -> Result<String, ExecuteError> {
        let key = job.key();
        job.notify_start();
        debug!(job_id = %key, "job started");

        if !self.validator.validate(job) {
            warn!(job_id = %key, "job validation failed");
            job.notify_completed(false);
            job.notify_error();
            return Err(ExecuteError::Validation(key));
        }

        let breaker_key = key.breaker_key(self.command_group());
        let outcome = match self.breakers.permit(&breaker_key) {
            CallPermit::Rejected => Err(ExecuteError::BreakerOpen(key.clone())),
            CallPermit::Allowed | CallPermit::Probe => match job.run() {
                Ok(value) => {
                    self.breakers.record_success(&breaker_key);
                    Ok(value)
                }
                Err(err) => {
                    self.breakers.record_failure(&breaker_key);
                    Err(ExecuteError::Transient {
                        key: key.clone(),
                        source: err,
                    })
                }
            },
        };

        match outcome {
            Ok(value) => {
                job.notify_completed(true);
                debug!(job_id = %key, "job completed");
                Ok(value)
            }
            Err(err) => {
                job.notify_completed(false);
                job.notify_error();
                self.fall_back(&key, err)
            }
        }
    }

    fn fall_back(&self, key: &JobKey, err: ExecuteError) -> Result<String, ExecuteError> {
        match &self.config.fallback {
            FallbackPolicy::Fixed(value) => {
                // The caller sees a success-shaped value; only the
                // lifecycle notifications carry the real outcome.
                warn!(job_id = %key, error = %err, "masking failure with fallback value");
                Ok(value.clone())
            }
            FallbackPolicy::Surface => {
                warn!(job_id = %key, error = %err, "job failed");
                Err(err)
            }
        }
    }

    /// Mark the job terminated and forward cancellation.
    ///
    /// Safe to call from a different thread than the one running the job.
    /// Cancellation is cooperative and does not change breaker state.
    pub fn terminate(&self, job: &dyn LayerJob) {
        info!(job_id = %job.key(), "terminating job");
        job.terminate();
    }
}

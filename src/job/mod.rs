//! Layer jobs: identity, lifecycle contract, validation and resilient
//! execution.
//!
//! A job is an opaque unit of work against a remote WFS/WMS backend. The
//! pipeline never looks inside it; it only drives the [`LayerJob`]
//! lifecycle: `notify_start`, pre-flight validation, the breaker-gated
//! `run`, and `notify_completed`/`notify_error`. Callers that only look at
//! the value returned by [`ResilientJobRunner::execute`] cannot tell a
//! masked failure from a success under the default fallback policy - the
//! lifecycle notifications carry the real outcome.

mod runner;
mod validator;

pub use runner::{
    ExecuteError, FallbackPolicy, ResilientJobRunner, RunnerConfig, DEFAULT_COMMAND_GROUP,
    DEFAULT_FALLBACK_VALUE,
};
pub use validator::{AllowAllValidator, JobValidator, LayerJobValidator};

use std::fmt;
use thiserror::Error;

use crate::breaker::BreakerKey;

/// Well-known job type names.
pub mod job_types {
    pub const NORMAL: &str = "normal";
    pub const HIGHLIGHT: &str = "highlight";
    pub const MAP_CLICK: &str = "mapClick";
    pub const TILE: &str = "tile";
}

/// Composite job identity: layer id plus job type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    layer_id: String,
    job_type: String,
}

impl JobKey {
    pub fn new(layer_id: impl Into<String>, job_type: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            job_type: job_type.into(),
        }
    }

    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    /// Breaker identity for this job under the given command group.
    pub fn breaker_key(&self, group: &str) -> BreakerKey {
        BreakerKey::new(
            group,
            format!("LayerJob_{}_{}", self.layer_id, self.job_type),
        )
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.layer_id, self.job_type)
    }
}

/// Error from the wrapped backend call.
#[derive(Debug, Error)]
pub enum JobError {
    /// The remote call failed or returned an error result.
    #[error("backend call failed: {0}")]
    Backend(String),
    /// The job observed its termination flag and stopped early.
    #[error("job terminated before completion")]
    Terminated,
}

/// An opaque unit of work against a remote layer backend.
///
/// Implementations must be shareable across worker threads. `run` blocks
/// for the duration of the backend round trip; cancellation via
/// `terminate` is cooperative - the job must poll its own termination
/// flag, the runner never interrupts in-flight I/O.
pub trait LayerJob: Send + Sync {
    /// Id of the layer this job works on.
    fn layer_id(&self) -> &str;

    /// Job type name, e.g. `"normal"` or `"mapClick"`.
    fn job_type(&self) -> &str;

    /// Composite identity used for logging and breaker partitioning.
    fn key(&self) -> JobKey {
        JobKey::new(self.layer_id(), self.job_type())
    }

    /// Execute the remote call.
    fn run(&self) -> Result<String, JobError>;

    /// Mark the job terminated. Safe to call from another thread.
    fn terminate(&self);

    fn notify_start(&self);

    fn notify_completed(&self, success: bool);

    fn notify_error(&self);
}

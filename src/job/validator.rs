//! Pre-flight validation of layer jobs.
//!
//! A `false` verdict means "do not execute": the job is structurally
//! unsound or the layer forbids it. That is a caller error, not a backend
//! failure, and it must never count against the circuit breaker.

use std::sync::Arc;
use tracing::debug;

use crate::config::LayerConfigStore;

use super::{job_types, LayerJob};

/// Polymorphic pre-flight check over a job.
pub trait JobValidator: Send + Sync {
    fn validate(&self, job: &dyn LayerJob) -> bool;
}

/// Validator that admits every job.
///
/// For tests and embedders that validate upstream of the runner.
#[derive(Debug, Clone, Default)]
pub struct AllowAllValidator;

impl JobValidator for AllowAllValidator {
    fn validate(&self, _job: &dyn LayerJob) -> bool {
        true
    }
}

/// Configuration-backed validator for layer jobs.
///
/// Structural checks first (non-empty layer id, configuration present,
/// remote endpoint configured), then a per-type capability gate: highlight
/// jobs need `getHighlightImage`, map-click jobs need `getFeatureInfo`,
/// tile jobs need `getMapTiles`. Job types without a gate pass on the
/// structural checks alone.
pub struct LayerJobValidator {
    store: Arc<LayerConfigStore>,
}

impl LayerJobValidator {
    pub fn new(store: Arc<LayerConfigStore>) -> Self {
        Self { store }
    }
}

impl JobValidator for LayerJobValidator {
    fn validate(&self, job: &dyn LayerJob) -> bool {
        if job.layer_id().is_empty() {
            debug!("job rejected: empty layer id");
            return false;
        }

        let config = match self.store.load(job.layer_id()) {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!(job_id = %job.key(), "job rejected: configuration unavailable upstream");
                return false;
            }
            Err(err) => {
                debug!(job_id = %job.key(), error = %err, "job rejected: no usable configuration");
                return false;
            }
        };

        if config.url.as_deref().map_or(true, str::is_empty) {
            debug!(job_id = %job.key(), "job rejected: no remote endpoint configured");
            return false;
        }

        let permitted = match job.job_type() {
            job_types::HIGHLIGHT => config.get_highlight_image,
            job_types::MAP_CLICK => config.get_feature_info,
            job_types::TILE => config.get_map_tiles,
            _ => true,
        };
        if !permitted {
            debug!(
                job_id = %job.key(),
                job_type = job.job_type(),
                "job rejected: capability disabled for layer"
            );
        }
        permitted
    }
}

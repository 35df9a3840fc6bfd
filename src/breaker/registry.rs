//! Process-wide registry of per-key circuit breakers.

use dashmap::DashMap;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::state::{BreakerConfig, BreakerEntry, BreakerState, CallPermit};

/// Breaker identity: command group plus command name.
///
/// Layer jobs use the group `"transport"` and a command of the form
/// `LayerJob_{layerId}_{jobType}`, so each layer/job-type pair trips
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BreakerKey {
    group: String,
    command: String,
}

impl BreakerKey {
    /// Create a breaker key from group and command names.
    pub fn new(group: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            command: command.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl fmt::Display for BreakerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.command)
    }
}

/// Shared mutable map of breaker key to breaker state.
///
/// Entries are created lazily on first use and persist for the process
/// lifetime; breaker state is local to one process, so independent
/// instances behind a load balancer trip independently (documented
/// limitation). All transitions for a key happen under that key's mutex,
/// so two simultaneous failures never lose a count and at most one caller
/// observes the open-to-half-open transition.
pub struct CircuitBreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<BreakerKey, Mutex<BreakerEntry>>,
}

impl CircuitBreakerRegistry {
    /// Create a registry with the given breaker configuration.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Create a registry with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(BreakerConfig::default())
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    fn with_entry<T>(&self, key: &BreakerKey, f: impl FnOnce(&mut BreakerEntry) -> T) -> T {
        let entry = self
            .breakers
            .entry(key.clone())
            .or_insert_with(|| Mutex::new(BreakerEntry::new()));
        let mut state = entry.lock().unwrap();
        f(&mut state)
    }

    /// Ask for permission to call the backend for this key.
    pub fn permit(&self, key: &BreakerKey) -> CallPermit {
        let permit = self.with_entry(key, |entry| entry.permit(&self.config));
        match permit {
            CallPermit::Probe => info!(breaker = %key, "circuit half-open, admitting probe call"),
            CallPermit::Rejected => debug!(breaker = %key, "circuit open, short-circuiting call"),
            CallPermit::Allowed => {}
        }
        permit
    }

    /// Record a successful backend call for this key.
    pub fn record_success(&self, key: &BreakerKey) {
        let closed = self.with_entry(key, |entry| entry.record_success(&self.config));
        if closed {
            info!(breaker = %key, "circuit closed after successful probe");
        }
    }

    /// Record a failed backend call for this key.
    pub fn record_failure(&self, key: &BreakerKey) {
        let tripped = self.with_entry(key, |entry| entry.record_failure(&self.config));
        if tripped {
            warn!(
                breaker = %key,
                cooldown_ms = self.config.cooldown.as_millis(),
                "circuit opened"
            );
        }
    }

    /// Current state of the breaker for this key (creating it if needed).
    pub fn state(&self, key: &BreakerKey) -> BreakerState {
        self.with_entry(key, |entry| entry.state())
    }

    /// Per-key states for observability.
    pub fn snapshot(&self) -> Vec<(BreakerKey, BreakerState)> {
        self.breakers
            .iter()
            .map(|entry| {
                let state = entry.value().lock().unwrap().state();
                (entry.key().clone(), state)
            })
            .collect()
    }

    /// Number of breakers created so far.
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn fast_config() -> BreakerConfig {
        BreakerConfig {
            failure_threshold: 5,
            window: Duration::from_secs(10),
            cooldown: Duration::from_millis(30),
        }
    }

    #[test]
    fn test_breaker_key_display() {
        let key = BreakerKey::new("grp", "LayerJob_42_GetMap");
        assert_eq!(format!("{}", key), "grp:LayerJob_42_GetMap");
        assert_eq!(key.group(), "grp");
        assert_eq!(key.command(), "LayerJob_42_GetMap");
    }

    #[test]
    fn test_entries_created_lazily() {
        let registry = CircuitBreakerRegistry::with_defaults();
        assert!(registry.is_empty());

        let key = BreakerKey::new("transport", "LayerJob_1_normal");
        assert_eq!(registry.permit(&key), CallPermit::Allowed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_keys_trip_independently() {
        let registry = CircuitBreakerRegistry::new(fast_config());
        let failing = BreakerKey::new("transport", "LayerJob_1_normal");
        let healthy = BreakerKey::new("transport", "LayerJob_2_normal");

        for _ in 0..5 {
            registry.record_failure(&failing);
        }

        assert_eq!(registry.state(&failing), BreakerState::Open);
        assert_eq!(registry.permit(&failing), CallPermit::Rejected);
        assert_eq!(registry.permit(&healthy), CallPermit::Allowed);
    }

    #[test]
    fn test_single_probe_across_threads() {
        let registry = Arc::new(CircuitBreakerRegistry::new(fast_config()));
        let key = BreakerKey::new("transport", "LayerJob_1_normal");
        for _ in 0..5 {
            registry.record_failure(&key);
        }
        thread::sleep(Duration::from_millis(35));

        let mut handles = vec![];
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let key = key.clone();
            handles.push(thread::spawn(move || registry.permit(&key)));
        }
        let permits: Vec<CallPermit> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let probes = permits.iter().filter(|p| **p == CallPermit::Probe).count();
        let rejected = permits
            .iter()
            .filter(|p| **p == CallPermit::Rejected)
            .count();
        assert_eq!(probes, 1, "exactly one probe must be admitted");
        assert_eq!(rejected, 7);
    }

    #[test]
    fn test_concurrent_failures_do_not_lose_counts() {
        let registry = Arc::new(CircuitBreakerRegistry::new(BreakerConfig {
            failure_threshold: 200,
            window: Duration::from_secs(60),
            cooldown: Duration::from_millis(30),
        }));
        let key = BreakerKey::new("transport", "LayerJob_1_normal");

        let mut handles = vec![];
        for _ in 0..4 {
            let registry = Arc::clone(&registry);
            let key = key.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    registry.record_failure(&key);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // 200 failures recorded, threshold 200: the breaker must have
        // tripped, which it only does if no increment was lost.
        assert_eq!(registry.state(&key), BreakerState::Open);
    }

    #[test]
    fn test_snapshot_reports_states() {
        let registry = CircuitBreakerRegistry::new(fast_config());
        let open = BreakerKey::new("transport", "LayerJob_1_normal");
        let closed = BreakerKey::new("transport", "LayerJob_2_normal");

        for _ in 0..5 {
            registry.record_failure(&open);
        }
        registry.record_success(&closed);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        let state_of = |k: &BreakerKey| {
            snapshot
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, state)| *state)
        };
        assert_eq!(state_of(&open), Some(BreakerState::Open));
        assert_eq!(state_of(&closed), Some(BreakerState::Closed));
    }
}

//! Per-key circuit breaker state machine.

use std::time::{Duration, Instant};

/// Configuration shared by all breakers in a registry.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Failures within the window that trip the breaker (default: 5).
    pub failure_threshold: u32,
    /// Width of the failure-counting window (default: 10s).
    pub window: Duration,
    /// Time the breaker stays open before admitting a probe (default: 5s).
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            window: Duration::from_secs(10),
            cooldown: Duration::from_secs(5),
        }
    }
}

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation, calls pass through.
    Closed,
    /// Backend assumed down, calls are short-circuited.
    Open,
    /// Cooldown elapsed, a single probe call is testing recovery.
    HalfOpen,
}

/// Outcome of asking a breaker for permission to call the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPermit {
    /// Closed: the call passes through.
    Allowed,
    /// This call is the single half-open probe.
    Probe,
    /// Open, or a probe is already in flight: short-circuit.
    Rejected,
}

/// Mutable state for one breaker key.
///
/// Not synchronized itself; the registry wraps each entry in a mutex so
/// counter updates and state transitions are atomic per key.
#[derive(Debug)]
pub(crate) struct BreakerEntry {
    state: BreakerState,
    window_start: Instant,
    failures: u32,
    successes: u32,
    /// When the breaker last opened; the cooldown is measured from here.
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl BreakerEntry {
    pub(crate) fn new() -> Self {
        Self {
            state: BreakerState::Closed,
            window_start: Instant::now(),
            failures: 0,
            successes: 0,
            opened_at: None,
            probe_in_flight: false,
        }
    }

    pub(crate) fn state(&self) -> BreakerState {
        self.state
    }

    pub(crate) fn failure_count(&self) -> u32 {
        self.failures
    }

    /// Ask for permission to call the backend.
    ///
    /// Open breakers whose cooldown has elapsed transition to half-open
    /// here, and the transition is observed by exactly one caller: that
    /// caller gets `Probe`, everyone else `Rejected` until the probe
    /// resolves.
    pub(crate) fn permit(&mut self, config: &BreakerConfig) -> CallPermit {
        match self.state {
            BreakerState::Closed => CallPermit::Allowed,
            BreakerState::Open => {
                let elapsed = self.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= config.cooldown {
                    self.state = BreakerState::HalfOpen;
                    self.probe_in_flight = true;
                    CallPermit::Probe
                } else {
                    CallPermit::Rejected
                }
            }
            BreakerState::HalfOpen => {
                if self.probe_in_flight {
                    CallPermit::Rejected
                } else {
                    self.probe_in_flight = true;
                    CallPermit::Probe
                }
            }
        }
    }

    /// Record a successful backend call.
    ///
    /// Returns `true` when this success closed a half-open breaker.
    pub(crate) fn record_success(&mut self, config: &BreakerConfig) -> bool {
        match self.state {
            BreakerState::HalfOpen => {
                self.reset();
                true
            }
            BreakerState::Closed => {
                self.roll_window(config);
                self.successes += 1;
                false
            }
            // Late result from a call admitted before the trip.
            BreakerState::Open => false,
        }
    }

    /// Record a failed backend call.
    ///
    /// Returns `true` when this failure tripped the breaker open.
    pub(crate) fn record_failure(&mut self, config: &BreakerConfig) -> bool {
        match self.state {
            BreakerState::HalfOpen => {
                // Failed probe: reopen and restart the cooldown.
                self.trip();
                true
            }
            BreakerState::Closed => {
                self.roll_window(config);
                self.failures += 1;
                if self.failures >= config.failure_threshold {
                    self.trip();
                    true
                } else {
                    false
                }
            }
            BreakerState::Open => false,
        }
    }

    /// Start a fresh counting window once the current one has expired.
    fn roll_window(&mut self, config: &BreakerConfig) {
        if self.window_start.elapsed() >= config.window {
            self.window_start = Instant::now();
            self.failures = 0;
            self.successes = 0;
        }
    }

    fn trip(&mut self) {
        self.state = BreakerState::Open;
        self.opened_at = Some(Instant::now());
        self.probe_in_flight = false;
    }

    fn reset(&mut self) {
        self.state = BreakerState::Closed;
        self.opened_at = None;
        self.probe_in_flight = false;
        self.failures = 0;
        self.successes = 0;
        self.window_start = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn test_config() -> BreakerConfig {
        BreakerConfig {
            failure_threshold: 3,
            window: Duration::from_secs(10),
            cooldown: Duration::from_millis(30),
        }
    }

    #[test]
    fn test_initial_state_allows_calls() {
        let mut entry = BreakerEntry::new();
        assert_eq!(entry.state(), BreakerState::Closed);
        assert_eq!(entry.permit(&test_config()), CallPermit::Allowed);
    }

    #[test]
    fn test_trips_at_threshold() {
        let config = test_config();
        let mut entry = BreakerEntry::new();

        assert!(!entry.record_failure(&config));
        assert!(!entry.record_failure(&config));
        assert_eq!(entry.state(), BreakerState::Closed);

        assert!(entry.record_failure(&config));
        assert_eq!(entry.state(), BreakerState::Open);
        assert_eq!(entry.permit(&config), CallPermit::Rejected);
    }

    #[test]
    fn test_probe_after_cooldown() {
        let config = test_config();
        let mut entry = BreakerEntry::new();
        for _ in 0..3 {
            entry.record_failure(&config);
        }
        assert_eq!(entry.permit(&config), CallPermit::Rejected);

        thread::sleep(config.cooldown);
        assert_eq!(entry.permit(&config), CallPermit::Probe);
        assert_eq!(entry.state(), BreakerState::HalfOpen);
        // Only one probe at a time.
        assert_eq!(entry.permit(&config), CallPermit::Rejected);
    }

    #[test]
    fn test_successful_probe_closes_and_resets_counters() {
        let config = test_config();
        let mut entry = BreakerEntry::new();
        for _ in 0..3 {
            entry.record_failure(&config);
        }
        thread::sleep(config.cooldown);
        assert_eq!(entry.permit(&config), CallPermit::Probe);

        assert!(entry.record_success(&config));
        assert_eq!(entry.state(), BreakerState::Closed);
        assert_eq!(entry.failure_count(), 0);

        // A full threshold is needed again after the reset.
        entry.record_failure(&config);
        entry.record_failure(&config);
        assert_eq!(entry.state(), BreakerState::Closed);
    }

    #[test]
    fn test_failed_probe_reopens_and_restarts_cooldown() {
        let config = test_config();
        let mut entry = BreakerEntry::new();
        for _ in 0..3 {
            entry.record_failure(&config);
        }
        thread::sleep(config.cooldown);
        assert_eq!(entry.permit(&config), CallPermit::Probe);

        assert!(entry.record_failure(&config));
        assert_eq!(entry.state(), BreakerState::Open);
        assert_eq!(entry.permit(&config), CallPermit::Rejected);

        thread::sleep(config.cooldown);
        assert_eq!(entry.permit(&config), CallPermit::Probe);
    }

    #[test]
    fn test_window_expiry_resets_counts() {
        let config = BreakerConfig {
            failure_threshold: 3,
            window: Duration::from_millis(20),
            cooldown: Duration::from_millis(30),
        };
        let mut entry = BreakerEntry::new();

        entry.record_failure(&config);
        entry.record_failure(&config);
        thread::sleep(Duration::from_millis(25));

        // Old failures aged out; this one starts a new window.
        assert!(!entry.record_failure(&config));
        assert_eq!(entry.state(), BreakerState::Closed);
        assert_eq!(entry.failure_count(), 1);
    }

    #[test]
    fn test_successes_do_not_mask_failures() {
        let config = test_config();
        let mut entry = BreakerEntry::new();

        entry.record_success(&config);
        entry.record_failure(&config);
        entry.record_success(&config);
        entry.record_failure(&config);
        entry.record_failure(&config);

        assert_eq!(entry.state(), BreakerState::Open);
    }

    #[test]
    fn test_default_config() {
        let config = BreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.window, Duration::from_secs(10));
        assert_eq!(config.cooldown, Duration::from_secs(5));
    }
}

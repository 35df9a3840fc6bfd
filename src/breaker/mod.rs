//! Circuit breakers partitioned by layer-job key.
//!
//! Repeated failures against one backend must not cascade into resource
//! exhaustion for the whole service: once a layer/job-type pair keeps
//! failing, its calls are short-circuited instead of tying up workers on a
//! dead backend.
//!
//! # State Machine
//!
//! ```text
//! Closed --[failure_threshold failures within window]--> Open
//! Open --[cooldown elapsed, next call]--> HalfOpen (that call is the probe)
//! HalfOpen --[probe succeeds]--> Closed (counters reset)
//! HalfOpen --[probe fails]--> Open (cooldown restarts)
//! ```
//!
//! Calls arriving while a probe is in flight are treated as Open and
//! short-circuited until the probe resolves.

mod registry;
mod state;

pub use registry::{BreakerKey, CircuitBreakerRegistry};
pub use state::{BreakerConfig, BreakerState, CallPermit};

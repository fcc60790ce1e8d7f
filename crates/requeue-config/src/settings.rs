//! Scheduler settings parsing.
//!
//! ```kdl
//! requeue {
//!     dag-resolution #true
//!     cascade-upstream #true
//!     max-upstream-depth 8
//!     lock-retry max-attempts=5 base-delay-ms=5 max-delay-ms=100
//! }
//! ```
//!
//! Every setting is optional; missing ones keep their defaults.

use crate::nodes::{bool_value, first_arg, u64_value};
use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a requeue operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequeueSettings {
    /// Combine stage-based and needs-based dependents. When false only the
    /// legacy stage-based candidates are considered.
    pub use_dag_resolution: bool,
    /// Retry policy for optimistic-lock conflicts on a single job.
    pub lock_retry: RetryPolicy,
    /// Requeue the upstream bridge's dependents after resetting it.
    pub cascade_upstream: bool,
    /// How many upstream pipelines a cascade may climb.
    pub max_upstream_depth: u32,
}

impl Default for RequeueSettings {
    fn default() -> Self {
        Self {
            use_dag_resolution: true,
            lock_retry: RetryPolicy::default(),
            cascade_upstream: true,
            max_upstream_depth: 8,
        }
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retrying after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

/// Parse scheduler settings from KDL text. The settings live in a
/// `requeue { ... }` block; other top-level nodes are ignored.
pub fn parse_settings(kdl: &str) -> ConfigResult<RequeueSettings> {
    let doc: KdlDocument = kdl.parse()?;
    let mut settings = RequeueSettings::default();

    let Some(block) = doc.nodes().iter().find(|n| n.name().value() == "requeue") else {
        return Ok(settings);
    };
    let Some(children) = block.children() else {
        return Ok(settings);
    };

    for child in children.nodes() {
        match child.name().value() {
            "dag-resolution" => {
                settings.use_dag_resolution = bool_value(required_arg(child)?, "dag-resolution")?;
            }
            "cascade-upstream" => {
                settings.cascade_upstream = bool_value(required_arg(child)?, "cascade-upstream")?;
            }
            "max-upstream-depth" => {
                let depth = u64_value(required_arg(child)?, "max-upstream-depth")?;
                settings.max_upstream_depth =
                    u32::try_from(depth).map_err(|_| ConfigError::InvalidValue {
                        field: "max-upstream-depth".to_string(),
                        message: format!("too large: {}", depth),
                    })?;
            }
            "lock-retry" => {
                settings.lock_retry = parse_retry(child)?;
            }
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(settings)
}

fn required_arg(node: &KdlNode) -> ConfigResult<&kdl::KdlValue> {
    first_arg(node).ok_or_else(|| ConfigError::MissingField(node.name().value().to_string()))
}

fn parse_retry(node: &KdlNode) -> ConfigResult<RetryPolicy> {
    let mut policy = RetryPolicy::default();

    if let Some(value) = node.get("max-attempts") {
        let attempts = u64_value(value, "max-attempts")?;
        if attempts == 0 || attempts > u64::from(u32::MAX) {
            return Err(ConfigError::InvalidValue {
                field: "max-attempts".to_string(),
                message: format!("must be between 1 and {}, got {}", u32::MAX, attempts),
            });
        }
        policy.max_attempts = attempts as u32;
    }
    if let Some(value) = node.get("base-delay-ms") {
        policy.base_delay = Duration::from_millis(u64_value(value, "base-delay-ms")?);
    }
    if let Some(value) = node.get("max-delay-ms") {
        policy.max_delay = Duration::from_millis(u64_value(value, "max-delay-ms")?);
    }

    if policy.max_delay < policy.base_delay {
        return Err(ConfigError::InvalidValue {
            field: "max-delay-ms".to_string(),
            message: "must not be smaller than base-delay-ms".to_string(),
        });
    }

    Ok(policy)
}

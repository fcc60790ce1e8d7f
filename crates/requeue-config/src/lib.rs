//! KDL configuration parsing for the requeue scheduler.
//!
//! This crate handles parsing of:
//! - Pipeline fixtures (jobs, stages, needs, source bridges)
//! - Scheduler settings

pub mod error;
pub mod fixture;
mod nodes;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use fixture::{Fixture, parse_fixture, parse_pipeline};
pub use settings::{RequeueSettings, RetryPolicy, parse_settings};

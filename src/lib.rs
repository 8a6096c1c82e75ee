//! passive - Passive identity presence checker.
//!
//! This library checks whether an identity is registered across a set of
//! public services, each of which signals existence differently:
//! - HTTP status and JSON fields (GitHub, GitLab)
//! - An inverted "name available" flag (Reddit)
//! - Response size heuristics (TikTok, YouTube)
//!
//! Every provider answers with a tri-state [`Presence`], and the
//! [`Aggregator`] merges them into one ordered [`AggregateReport`].
//!
//! # Example
//!
//! ```no_run
//! use passive::{Aggregator, ProbeSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let aggregator = Aggregator::new(&ProbeSettings::default()).unwrap();
//!     let report = aggregator.check("@alice").await;
//!     print!("{}", report.render());
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod identity;
pub mod lookup;
pub mod probe;
pub mod sink;
pub mod types;

#[cfg(test)]
mod test_support;

pub use aggregator::Aggregator;
pub use config::{Commands, Config, IpConfig, NameConfig, ProbeSettings, ProviderEndpoints, UserConfig};
pub use identity::{normalize, FullName};
pub use probe::{HttpProbe, PageBands, Probe, ProbeRegistry, ProviderDescriptor, Signal};
pub use types::{
    AggregateReport, FaultPolicy, PassiveError, Presence, ProbeFault, ProbeResult, ReportEntry,
    Result,
};

//! Core types and errors for identity presence checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur outside of an individual probe.
#[derive(Error, Debug)]
pub enum PassiveError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, PassiveError>;

/// Faults a probe can hit while classifying a response.
///
/// These never leave the probe as errors; each provider's [`FaultPolicy`]
/// turns them into a [`Presence`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeFault {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("decode failure: {0}")]
    Decode(String),

    #[error("unexpected status: HTTP {0}")]
    UnexpectedStatus(u16),

    #[error("no signal: {0}")]
    NoSignal(String),
}

/// Tri-state existence classification for one provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Presence {
    /// The identity exists on the provider.
    Present,
    /// The identity does not exist on the provider.
    Absent,
    /// The provider's response carried no definitive signal.
    Indeterminate,
}

impl Presence {
    /// Whether this is a definitive answer.
    pub fn is_definitive(self) -> bool {
        !matches!(self, Presence::Indeterminate)
    }

    /// Collapse to a yes/no answer, using `indeterminate_as` for the third state.
    pub fn as_reported(self, indeterminate_as: bool) -> bool {
        match self {
            Presence::Present => true,
            Presence::Absent => false,
            Presence::Indeterminate => indeterminate_as,
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Present => write!(f, "present"),
            Presence::Absent => write!(f, "absent"),
            Presence::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Per-provider mapping from fault kind to classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPolicy {
    pub transport: Presence,
    pub decode: Presence,
    pub unexpected_status: Presence,
    pub no_signal: Presence,
}

impl FaultPolicy {
    /// Every fault is indeterminate.
    pub const fn cautious() -> Self {
        Self {
            transport: Presence::Indeterminate,
            decode: Presence::Indeterminate,
            unexpected_status: Presence::Indeterminate,
            no_signal: Presence::Indeterminate,
        }
    }

    /// Override the classification used for decode failures.
    pub const fn with_decode(mut self, presence: Presence) -> Self {
        self.decode = presence;
        self
    }

    /// Resolve a fault to the classification this provider reports for it.
    pub fn resolve(&self, fault: &ProbeFault) -> Presence {
        match fault {
            ProbeFault::Transport(_) => self.transport,
            ProbeFault::Decode(_) => self.decode,
            ProbeFault::UnexpectedStatus(_) => self.unexpected_status,
            ProbeFault::NoSignal(_) => self.no_signal,
        }
    }
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self::cautious()
    }
}

/// Outcome of one probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub presence: Presence,
    /// The fault behind the classification, if any.
    pub fault: Option<ProbeFault>,
}

impl ProbeResult {
    pub fn definitive(presence: Presence) -> Self {
        Self {
            presence,
            fault: None,
        }
    }

    /// Build a result from a fault using the provider's policy.
    pub fn from_fault(fault: ProbeFault, policy: &FaultPolicy) -> Self {
        Self {
            presence: policy.resolve(&fault),
            fault: Some(fault),
        }
    }
}

/// One provider line of an aggregate report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportEntry {
    /// Provider display name.
    pub provider: String,
    /// Tri-state classification.
    pub presence: Presence,
    /// Yes/no value shown in the text report.
    pub reported: bool,
    /// Fault text when the provider did not answer cleanly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Merged results for one identity, in provider registration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateReport {
    /// Identity as supplied by the caller.
    pub identity: String,
    /// Identity after normalization, as sent to every provider.
    pub normalized: String,
    pub entries: Vec<ReportEntry>,
    /// Wall time spent on the query in seconds.
    pub duration_secs: f64,
}

impl AggregateReport {
    /// Look up the entry for a provider by display name.
    pub fn entry(&self, provider: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.provider == provider)
    }

    /// Number of providers that reported the identity as present.
    pub fn present_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.presence == Presence::Present)
            .count()
    }

    /// Render the human-readable report handed to a sink.
    pub fn render(&self) -> String {
        let mut out = format!("Search results for username '{}':\n", self.identity);
        for entry in &self.entries {
            out.push_str(&format!("- {}: {}\n", entry.provider, entry.reported));
        }
        out
    }
}

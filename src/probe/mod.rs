//! Provider probes.
//!
//! A probe answers "does this identity exist on this service" with a
//! tri-state [`Presence`]. Every fault is absorbed at the probe boundary and
//! turned into a classification by the provider's [`FaultPolicy`].

mod cache;
pub mod registry;
pub mod signal;

pub use cache::ProbeCache;
pub use registry::ProbeRegistry;
pub use signal::{PageBands, Signal};

use crate::config::ProbeSettings;
use crate::types::{FaultPolicy, PassiveError, ProbeFault, ProbeResult, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, trace, warn};
use url::Url;

const IDENTITY_PLACEHOLDER: &str = "{identity}";
const KEY_PLACEHOLDER: &str = "{key}";

/// Existence check against a single provider.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Provider display name.
    fn name(&self) -> &str;

    /// How this provider classifies its faults.
    fn fault_policy(&self) -> FaultPolicy;

    /// Yes/no value shown when the result is indeterminate.
    fn indeterminate_as(&self) -> bool {
        false
    }

    /// Check one already-normalized identity.
    async fn probe(&self, identity: &str) -> ProbeResult;
}

/// URL template with `{identity}` and optional `{key}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    template: String,
}

impl EndpointTemplate {
    /// Validate and wrap a template.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(IDENTITY_PLACEHOLDER) {
            return Err(PassiveError::ConfigError(format!(
                "endpoint template '{}' has no {} placeholder",
                template, IDENTITY_PLACEHOLDER
            )));
        }

        let sample = template
            .replace(IDENTITY_PLACEHOLDER, "sample")
            .replace(KEY_PLACEHOLDER, "sample");
        Url::parse(&sample)?;

        Ok(Self { template })
    }

    /// Whether rendering needs an API key.
    pub fn needs_key(&self) -> bool {
        self.template.contains(KEY_PLACEHOLDER)
    }

    /// Substitute the identity (and key) into the template.
    pub fn render(&self, identity: &str, key: Option<&str>) -> std::result::Result<Url, ProbeFault> {
        let mut rendered = self
            .template
            .replace(IDENTITY_PLACEHOLDER, &urlencoding::encode(identity));

        if self.needs_key() {
            let key = key.ok_or_else(|| ProbeFault::NoSignal("no API key configured".to_string()))?;
            rendered = rendered.replace(KEY_PLACEHOLDER, &urlencoding::encode(key));
        }

        Url::parse(&rendered).map_err(|e| ProbeFault::Transport(format!("invalid URL: {}", e)))
    }
}

/// Immutable description of one provider.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub endpoint: EndpointTemplate,
    pub signal: Signal,
    pub fault_policy: FaultPolicy,
    /// Send the configured client identifier as User-Agent.
    pub sends_client_id: bool,
    pub indeterminate_as: bool,
    pub api_key: Option<String>,
}

/// Probe backed by one HTTP GET to a templated endpoint.
pub struct HttpProbe {
    descriptor: ProviderDescriptor,
    client: Client,
}

impl HttpProbe {
    /// Create a probe with its own HTTP client.
    pub fn new(descriptor: ProviderDescriptor, settings: &ProbeSettings) -> Result<Self> {
        let mut builder = settings
            .client_builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .http1_only();

        if descriptor.sends_client_id {
            builder = builder.user_agent(settings.client_id.as_str());
        }

        Ok(Self {
            descriptor,
            client: builder.build()?,
        })
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn fetch_and_classify(&self, identity: &str) -> std::result::Result<crate::types::Presence, ProbeFault> {
        let url = self
            .descriptor
            .endpoint
            .render(identity, self.descriptor.api_key.as_deref())?;
        trace!("Probing {} for '{}'", self.descriptor.name, identity);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeFault::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} answered HTTP {} for '{}'", self.descriptor.name, status, identity);
        }

        if let Some(presence) = self.descriptor.signal.classify_status(status)? {
            return Ok(presence);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeFault::Transport(e.to_string()))?;
        trace!("{} body for '{}': {} bytes", self.descriptor.name, identity, body.len());

        self.descriptor.signal.classify_body(&body)
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn fault_policy(&self) -> FaultPolicy {
        self.descriptor.fault_policy
    }

    fn indeterminate_as(&self) -> bool {
        self.descriptor.indeterminate_as
    }

    async fn probe(&self, identity: &str) -> ProbeResult {
        match self.fetch_and_classify(identity).await {
            Ok(presence) => {
                debug!("{}: '{}' is {}", self.descriptor.name, identity, presence);
                ProbeResult::definitive(presence)
            }
            Err(fault) => {
                let result = ProbeResult::from_fault(fault, &self.descriptor.fault_policy);
                if let Some(ref fault) = result.fault {
                    warn!(
                        "{} probe for '{}' failed ({}), reporting {}",
                        self.descriptor.name, identity, fault, result.presence
                    );
                }
                result
            }
        }
    }
}

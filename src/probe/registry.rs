//! The fixed set of providers consulted for a username query.

use crate::config::ProbeSettings;
use crate::probe::signal::Signal;
use crate::probe::{EndpointTemplate, HttpProbe, Probe, ProviderDescriptor};
use crate::types::{FaultPolicy, Presence, Result};
use std::sync::Arc;

pub const REDDIT: &str = "Reddit";
pub const YOUTUBE: &str = "YouTube";
pub const TIKTOK: &str = "TikTok";
pub const GITLAB: &str = "GitLab";
pub const GITHUB: &str = "GitHub";

/// Ordered, read-only list of probes.
#[derive(Clone)]
pub struct ProbeRegistry {
    probes: Vec<Arc<dyn Probe>>,
}

impl ProbeRegistry {
    /// Wrap an explicit list of probes. Order is display order.
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self { probes }
    }

    /// Build the standard five providers from settings.
    pub fn from_settings(settings: &ProbeSettings) -> Result<Self> {
        let probes = Self::descriptors(settings)?
            .into_iter()
            .map(|descriptor| HttpProbe::new(descriptor, settings).map(|p| Arc::new(p) as Arc<dyn Probe>))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(probes))
    }

    /// Descriptors for the standard providers, in display order.
    pub fn descriptors(settings: &ProbeSettings) -> Result<Vec<ProviderDescriptor>> {
        let endpoints = &settings.endpoints;

        Ok(vec![
            // Reddit answers "is this name available"; when that answer cannot
            // be decoded the name is treated as available.
            ProviderDescriptor {
                name: REDDIT.to_string(),
                endpoint: EndpointTemplate::new(endpoints.reddit.as_str())?,
                signal: Signal::AvailabilityFlag,
                fault_policy: FaultPolicy::cautious().with_decode(Presence::Absent),
                sends_client_id: false,
                indeterminate_as: false,
                api_key: None,
            },
            ProviderDescriptor {
                name: YOUTUBE.to_string(),
                endpoint: EndpointTemplate::new(endpoints.youtube.as_str())?,
                signal: Signal::PayloadCutoff(settings.channel_payload_cutoff),
                fault_policy: FaultPolicy::cautious(),
                sends_client_id: false,
                indeterminate_as: false,
                api_key: settings.youtube_api_key.clone(),
            },
            ProviderDescriptor {
                name: TIKTOK.to_string(),
                endpoint: EndpointTemplate::new(endpoints.tiktok.as_str())?,
                signal: Signal::PageSize(settings.page_bands),
                fault_policy: FaultPolicy::cautious(),
                sends_client_id: false,
                indeterminate_as: false,
                api_key: None,
            },
            ProviderDescriptor {
                name: GITLAB.to_string(),
                endpoint: EndpointTemplate::new(endpoints.gitlab.as_str())?,
                signal: Signal::UserList,
                fault_policy: FaultPolicy::cautious(),
                sends_client_id: true,
                indeterminate_as: false,
                api_key: None,
            },
            ProviderDescriptor {
                name: GITHUB.to_string(),
                endpoint: EndpointTemplate::new(endpoints.github.as_str())?,
                signal: Signal::UserObject,
                fault_policy: FaultPolicy::cautious(),
                sends_client_id: true,
                indeterminate_as: false,
                api_key: None,
            },
        ])
    }

    pub fn probes(&self) -> &[Arc<dyn Probe>] {
        &self.probes
    }

    /// Provider names in display order.
    pub fn names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("probes", &self.names())
            .finish()
    }
}

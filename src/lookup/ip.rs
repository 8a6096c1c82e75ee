//! IP address geolocation.

use crate::config::ProbeSettings;
use crate::types::{PassiveError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::{debug, trace};

const DEFAULT_BASE_URL: &str = "http://ip-api.com";

/// Location data for an IP address.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IpInfo {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub isp: String,
}

impl IpInfo {
    pub fn render(&self) -> String {
        format!("ISP: {}\nCity: {}\nCountry: {}", self.isp, self.city, self.country)
    }
}

/// Client for the geolocation API.
pub struct IpLocator {
    client: Client,
    base_url: String,
}

impl IpLocator {
    pub fn new(settings: &ProbeSettings) -> Result<Self> {
        let client = settings.client_builder().build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the locator at another API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Look up one address.
    pub async fn locate(&self, address: &str) -> Result<IpInfo> {
        let ip: IpAddr = address
            .trim()
            .parse()
            .map_err(|_| PassiveError::InvalidInput(format!("'{}' is not an IP address", address)))?;

        let url = format!("{}/json/{}", self.base_url, ip);
        trace!("Locating {}", url);

        let info: IpInfo = self.client.get(&url).send().await?.json().await?;
        if info.isp.is_empty() {
            return Err(PassiveError::NotFound(format!("no info found for {}", ip)));
        }

        debug!("Located {}: {} / {}", ip, info.city, info.country);
        Ok(info)
    }
}

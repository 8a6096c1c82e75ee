//! Configuration handling for the CLI and the probe registry.

use crate::probe::signal::{PageBands, CHANNEL_PAYLOAD_CUTOFF};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Client identifier sent to providers that ask callers to identify themselves.
pub const DEFAULT_CLIENT_ID: &str =
    "passive/0.1.0 (https://www.example.com/contact; to check if user exists or not)";

/// Passive identity presence checker.
#[derive(Parser, Debug, Clone)]
#[command(name = "passive")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Per-provider request timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    pub timeout: u64,

    /// Custom client identifier (User-Agent) for providers that require one
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// YouTube Data API key
    #[arg(long, env = "PASSIVE_YOUTUBE_API_KEY", global = true, hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    /// Ignore HTTP(S)_PROXY environment variables
    #[arg(long, global = true)]
    pub no_proxy: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check whether usernames are registered across providers
    User(UserConfig),
    /// Look up a person by full name in the local database
    Name(NameConfig),
    /// Geolocate an IP address
    Ip(IpConfig),
}

/// Configuration for the username command.
#[derive(Parser, Debug, Clone)]
pub struct UserConfig {
    /// Username(s) to check, with or without a leading '@'
    #[arg(required_unless_present = "file")]
    pub identities: Vec<String>,

    /// File containing usernames to check (one per line)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Write JSON results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not write text results under the results directory
    #[arg(long)]
    pub no_save: bool,

    /// Directory for text results
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Outbound requests per second across all providers
    #[arg(long, default_value = "10")]
    pub rate_limit: u32,

    /// Number of usernames to check in parallel
    #[arg(long, short = 'p', default_value = "1")]
    pub parallel: usize,

    /// Quiet mode: only show usernames found on at least one provider
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Configuration for the full-name command.
#[derive(Parser, Debug, Clone)]
pub struct NameConfig {
    /// First and last name
    #[arg(required = true, num_args = 1..)]
    pub name: Vec<String>,

    /// Path to the people database
    #[arg(long, default_value = "dummy_database.json")]
    pub database: PathBuf,

    /// Do not write the result under the results directory
    #[arg(long)]
    pub no_save: bool,

    /// Directory for text results
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
}

/// Configuration for the IP command.
#[derive(Parser, Debug, Clone)]
pub struct IpConfig {
    /// IPv4 or IPv6 address
    pub address: String,

    /// Do not write the result under the results directory
    #[arg(long)]
    pub no_save: bool,

    /// Directory for text results
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
}

impl UserConfig {
    /// Collect identities from arguments and the optional file.
    pub fn load_identities(&self) -> crate::types::Result<Vec<String>> {
        let mut identities: Vec<String> = self
            .identities
            .iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();

        if let Some(ref file_path) = self.file {
            let content = std::fs::read_to_string(file_path)?;
            identities.extend(parse_identity_lines(&content));
        }

        Ok(identities)
    }
}

/// Parse one identity per line, skipping blanks and `#` comments.
pub fn parse_identity_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Endpoint templates for every provider.
///
/// `{identity}` is replaced by the percent-encoded normalized identity and
/// `{key}` by the provider's API key.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub reddit: String,
    pub youtube: String,
    pub tiktok: String,
    pub gitlab: String,
    pub github: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            reddit: "https://www.reddit.com/api/username_available.json?user={identity}"
                .to_string(),
            youtube: "https://youtube.googleapis.com/youtube/v3/channels?part=snippet,contentDetails,statistics&forUsername={identity}&key={key}"
                .to_string(),
            tiktok: "https://www.tiktok.com/@{identity}".to_string(),
            gitlab: "https://gitlab.com/api/v4/users?username={identity}".to_string(),
            github: "https://api.github.com/users/{identity}".to_string(),
        }
    }
}

/// Injected configuration for the probe registry and aggregator.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Client identifier for providers that require one.
    pub client_id: String,
    /// Upper bound on a single probe, network and body read included.
    pub timeout: Duration,
    /// Outbound requests per second shared by all probes.
    pub rate_limit: u32,
    /// How long definitive results stay cached.
    pub cache_ttl: Duration,
    pub youtube_api_key: Option<String>,
    /// Route requests through proxies from the environment.
    pub system_proxy: bool,
    pub endpoints: ProviderEndpoints,
    pub page_bands: PageBands,
    pub channel_payload_cutoff: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            timeout: Duration::from_secs(10),
            rate_limit: 10,
            cache_ttl: Duration::from_secs(600),
            youtube_api_key: None,
            system_proxy: true,
            endpoints: ProviderEndpoints::default(),
            page_bands: PageBands::default(),
            channel_payload_cutoff: CHANNEL_PAYLOAD_CUTOFF,
        }
    }
}

impl ProbeSettings {
    /// Build a reqwest client carrying the shared HTTP settings.
    pub fn client_builder(&self) -> reqwest::ClientBuilder {
        let builder = reqwest::Client::builder().timeout(self.timeout);
        if self.system_proxy {
            builder
        } else {
            builder.no_proxy()
        }
    }
}

impl Config {
    /// Settings derived from global flags only.
    pub fn http_settings(&self) -> ProbeSettings {
        ProbeSettings {
            client_id: self
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            timeout: Duration::from_secs(self.timeout.max(1)),
            youtube_api_key: self.youtube_api_key.clone().filter(|k| !k.is_empty()),
            system_proxy: !self.no_proxy,
            ..ProbeSettings::default()
        }
    }

    /// Build probe settings from global flags and the username command.
    pub fn probe_settings(&self, user: &UserConfig) -> ProbeSettings {
        ProbeSettings {
            rate_limit: user.rate_limit,
            ..self.http_settings()
        }
    }
}

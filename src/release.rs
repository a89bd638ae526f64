use std::io::Read;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// The GitHub API rejects requests with an empty or library-default user agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/79.0.3945.117 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(rename = "tag_name")]
    pub tag: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

impl Release {
    /// First asset whose name equals `name`.
    pub fn asset_named(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }

    /// First asset whose name matches `pattern` anywhere.
    pub fn asset_matching(&self, pattern: &Regex) -> Option<&Asset> {
        self.assets.iter().find(|a| pattern.is_match(&a.name))
    }
}

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed release metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where release metadata and asset bodies come from.
pub trait ReleaseSource {
    fn latest_release(&self, api_url: &str) -> Result<Release, ReleaseError>;

    /// Open `url` for reading. The body is streamed, not buffered.
    fn download(&self, url: &str) -> Result<Box<dyn Read>, ReleaseError>;
}

pub fn parse_release(body: &str) -> Result<Release, ReleaseError> {
    Ok(serde_json::from_str(body)?)
}

/// GitHub releases over a blocking reqwest client, with no request timeout.
pub struct GitHubClient {
    client: reqwest::blocking::Client,
}

impl GitHubClient {
    pub fn new() -> Result<Self, ReleaseError> {
        Self::with_builder(reqwest::blocking::Client::builder())
    }

    fn with_builder(builder: reqwest::blocking::ClientBuilder) -> Result<Self, ReleaseError> {
        let client = builder.user_agent(USER_AGENT).timeout(None).build()?;
        Ok(GitHubClient { client })
    }
}

impl ReleaseSource for GitHubClient {
    fn latest_release(&self, api_url: &str) -> Result<Release, ReleaseError> {
        tracing::debug!(url = api_url, "fetching release metadata");
        let body = self.client.get(api_url).send()?.error_for_status()?.text()?;
        parse_release(&body)
    }

    fn download(&self, url: &str) -> Result<Box<dyn Read>, ReleaseError> {
        tracing::debug!(url, "downloading asset");
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(Box::new(response))
    }
}

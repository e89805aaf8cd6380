use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};

use crate::{Error, Result};

/// Public plain-text proxy lists, one `host:port` per line
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://api.proxyscrape.com/v2/?request=displayproxies&protocol=http&timeout=5000&country=all",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
];

const PROBE_URL: &str = "https://www.youtube.com/generate_204";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CANDIDATES: usize = 25;

/// An HTTP proxy that requests can be routed through
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EgressPoint {
    pub host: String,
    pub port: u16,
}

impl EgressPoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Parse `host:port`, optionally prefixed with `http://`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix("http://").unwrap_or(line);
        let (host, port) = rest.rsplit_once(':')?;
        if host.is_empty() || host.contains(['/', '@', ' ']) {
            return None;
        }
        let port: u16 = port.trim_end_matches('/').parse().ok()?;
        if port == 0 {
            return None;
        }
        Some(Self::new(host, port))
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for EgressPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Build an HTTP client that sends everything through `proxy`
pub fn proxied_client(proxy: &EgressPoint, timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .proxy(reqwest::Proxy::all(proxy.url())?)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Directory of alternate egress points
#[async_trait]
pub trait ProxyDirectory: Send + Sync {
    /// Candidate egress points, best guess first
    async fn candidates(&self) -> Result<Vec<EgressPoint>>;

    /// Whether `candidate` currently forwards requests
    async fn probe(&self, candidate: &EgressPoint) -> bool;
}

/// Probe candidates in order and return the first reachable one with its index.
/// Unreachable candidates are skipped.
pub async fn select_first_reachable<'c>(
    directory: &dyn ProxyDirectory,
    candidates: &'c [EgressPoint],
) -> Option<(usize, &'c EgressPoint)> {
    for (index, candidate) in candidates.iter().enumerate() {
        if directory.probe(candidate).await {
            info!("Proxy {candidate} is reachable");
            return Some((index, candidate));
        }
        debug!("Proxy {candidate} is unreachable");
    }
    None
}

/// Proxy directory backed by public proxy-list URLs
pub struct PublicProxyList {
    client: reqwest::Client,
    sources: Vec<String>,
    probe_url: String,
    probe_timeout: Duration,
    max_candidates: usize,
}

impl PublicProxyList {
    pub fn new(client: reqwest::Client, sources: Vec<String>) -> Self {
        Self {
            client,
            sources,
            probe_url: PROBE_URL.to_string(),
            probe_timeout: PROBE_TIMEOUT,
            max_candidates: MAX_CANDIDATES,
        }
    }

    pub fn with_defaults(client: reqwest::Client) -> Self {
        Self::new(client, DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect())
    }

    async fn fetch_source(&self, source: &str) -> Result<String> {
        let body = self
            .client
            .get(source)
            .timeout(self.probe_timeout * 2)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

/// Parse a plain-text proxy list, dropping malformed lines and repeats
pub fn parse_proxy_list(body: &str) -> Vec<EgressPoint> {
    let mut seen = HashSet::new();
    body.lines()
        .filter_map(EgressPoint::parse)
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[async_trait]
impl ProxyDirectory for PublicProxyList {
    async fn candidates(&self) -> Result<Vec<EgressPoint>> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut reached_any = false;

        for source in &self.sources {
            match self.fetch_source(source).await {
                Ok(body) => {
                    reached_any = true;
                    let parsed = parse_proxy_list(&body);
                    debug!("Proxy source {source} listed {} candidates", parsed.len());
                    candidates.extend(parsed.into_iter().filter(|p| seen.insert(p.clone())));
                }
                Err(e) => debug!("Proxy source {source} failed: {e}"),
            }
            if candidates.len() >= self.max_candidates {
                break;
            }
        }

        if !reached_any && !self.sources.is_empty() {
            return Err(Error::Transient("no proxy list source was reachable".to_string()));
        }

        candidates.truncate(self.max_candidates);
        Ok(candidates)
    }

    async fn probe(&self, candidate: &EgressPoint) -> bool {
        let client = match proxied_client(candidate, self.probe_timeout) {
            Ok(c) => c,
            Err(e) => {
                debug!("Cannot build client for proxy {candidate}: {e}");
                return false;
            }
        };
        match client.get(&self.probe_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

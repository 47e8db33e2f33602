// ABOUTME: Configuration options for the page fetcher and the ClientBuilder fluent API.
// ABOUTME: Defaults match a polite desktop browser with a 30 second timeout.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Fetcher;
use crate::error::FetchError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Configuration options for the fetcher.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
            max_redirects: 10,
        }
    }
}

/// Builder for constructing Fetcher instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    pub fn max_redirects(mut self, hops: usize) -> Self {
        self.opts.max_redirects = hops;
        self
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Build the Fetcher with the configured options.
    pub fn build(self) -> Result<Fetcher, FetchError> {
        Fetcher::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

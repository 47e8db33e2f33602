// ABOUTME: Blocking page fetcher built on reqwest with URL validation and charset decoding.
// ABOUTME: Its fetch method plugs straight into the core enrichment and address passes.

use bytes::Bytes;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::options::{ClientBuilder, Options};
use crate::resource::decode_body;

/// Fetches HTML documents over HTTP(S).
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: HttpClient,
    opts: Options,
}

impl Fetcher {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn new(opts: Options) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &opts.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                FetchError::fetch("", "Build", Some(anyhow::anyhow!("bad header {key}: {e}")))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                FetchError::fetch("", "Build", Some(anyhow::anyhow!("bad header {key}: {e}")))
            })?;
            headers.insert(name, value);
        }

        let http = HttpClient::builder()
            .redirect(reqwest::redirect::Policy::limited(opts.max_redirects))
            .user_agent(&opts.user_agent)
            .timeout(opts.timeout)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::fetch("", "Build", Some(anyhow::Error::new(e))))?;

        Ok(Self { http, opts })
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// GETs `url` and returns the decoded body. Non-2xx responses are errors.
    pub fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = parse_http_url(url, "Fetch")?;
        let body = self.get(&parsed, "Fetch")?;
        debug!(url, bytes = body.len(), "fetched page");
        Ok(body)
    }

    /// Like [`Fetcher::fetch`] for an already-validated URL; callers that
    /// put secrets in the query string should report errors via
    /// [`FetchError::detail`].
    pub fn get(&self, url: &Url, op: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|e| classify(url.as_str(), op, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(url.as_str(), op, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: Bytes = response.bytes().map_err(|e| classify(url.as_str(), op, e))?;
        Ok(decode_body(&body, content_type.as_deref()))
    }
}

/// Parses `url` and insists on an http(s) scheme.
pub fn parse_http_url(url: &str, op: &str) -> Result<Url, FetchError> {
    if url.trim().is_empty() {
        return Err(FetchError::invalid_url(url, op, None));
    }
    let parsed = Url::parse(url.trim()).map_err(|e| {
        FetchError::invalid_url(url, op, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::invalid_url(
            url,
            op,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }
    Ok(parsed)
}

fn classify(url: &str, op: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::timeout(url, op, Some(anyhow::Error::new(err)))
    } else {
        FetchError::fetch(url, op, Some(anyhow::Error::new(err)))
    }
}

// src/fetch/mod.rs
pub mod page;
pub mod urls;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub use page::{parse_page, PageDocument, TableBlock};

/// Produces the parsed report page for one (period, region) unit.
pub trait DocumentSource {
    fn fetch(&self, period: u32, region: u32) -> Result<PageDocument>;
}

/// Fetches report pages over HTTP and parses them with `scraper`.
pub struct HttpSource {
    client: Client,
    template: String,
}

impl HttpSource {
    pub fn new(template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .build()
            .context("building HTTP client")?;
        let template = template.into();
        if urls::region_only_in_fragment(&template) {
            warn!(
                template = %template,
                "region only appears in the URL fragment; the server sees the same request for every region"
            );
        }
        Ok(Self { client, template })
    }
}

impl DocumentSource for HttpSource {
    #[instrument(level = "debug", skip(self))]
    fn fetch(&self, period: u32, region: u32) -> Result<PageDocument> {
        let url = urls::page_url(&self.template, period, region)?;
        let html = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("GET {}", url))?
            .error_for_status()?
            .text()
            .with_context(|| format!("reading body from {}", url))?;
        debug!(bytes = html.len(), "fetched page");
        Ok(parse_page(&html))
    }
}

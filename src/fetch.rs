use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{ACCEPT, USER_AGENT};

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

pub struct PageFetcher {
    client: reqwest::blocking::Client,
}

impl PageFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build page fetch http client")?;
        Ok(Self { client })
    }

    /// Fetches a page. Non-2xx statuses are returned, not raised; only
    /// transport failures are errors.
    pub fn fetch(&self, url: &str) -> anyhow::Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("bookharvest/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("read body: {url}"))?;
        Ok(FetchedPage { status, body })
    }
}

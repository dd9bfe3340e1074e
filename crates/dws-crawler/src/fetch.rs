use std::io::prelude::*;
use std::time::Duration;

use anyhow::Result;
use flate2::read::GzDecoder;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};

use crate::config::CrawlerConfig;

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Fetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .gzip(true)
            .deflate(true)
            .build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Downloads a page, non-success statuses are errors.
    pub async fn download(&self, url: &str, timeout: Option<Duration>) -> Result<String> {
        let mut req = self.client.get(url).header(USER_AGENT, &self.user_agent);
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }
        let resp = req.send().await?.error_for_status()?;

        let page = match resp.headers().get(CONTENT_TYPE) {
            Some(c) if c == "application/x-gzip" || c == "application/gzip" => {
                let compressed = resp.bytes().await?;
                let mut gz = GzDecoder::new(&compressed[..]);
                let mut page = String::new();
                gz.read_to_string(&mut page)?;
                page
            }
            _ => resp.text().await?,
        };

        Ok(page)
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_first_page")]
    pub first_page: u32,

    #[serde(default = "default_last_page")]
    pub last_page: u32,

    /// Seconds to sleep after each listing page
    #[serde(default = "default_page_delay")]
    pub page_delay: f32,

    #[serde(default = "default_max_consecutive_stale")]
    pub max_consecutive_stale: usize,

    /// Seconds before a listing page download is abandoned
    #[serde(default)]
    pub listing_timeout: Option<f32>,

    /// Seconds before a detail page download is abandoned
    #[serde(default = "default_detail_timeout")]
    pub detail_timeout: Option<f32>,

    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,

    #[serde(default = "default_on_listing_error")]
    pub on_listing_error: OnError,

    #[serde(default = "default_on_detail_error")]
    pub on_detail_error: OnError,

    #[serde(default = "default_handle_sigint")]
    pub handle_sigint: bool,

    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            first_page: default_first_page(),
            last_page: default_last_page(),
            page_delay: default_page_delay(),
            max_consecutive_stale: default_max_consecutive_stale(),
            listing_timeout: None,
            detail_timeout: default_detail_timeout(),
            concurrent_downloads: default_concurrent_downloads(),
            on_listing_error: default_on_listing_error(),
            on_detail_error: default_on_detail_error(),
            handle_sigint: default_handle_sigint(),
            show_progress: default_show_progress(),
        }
    }
}

impl CrawlerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.first_page > self.last_page {
            anyhow::bail!(
                "Invalid page range, firstPage ({}) is greater than lastPage ({})",
                self.first_page,
                self.last_page
            );
        }
        if self.concurrent_downloads == 0 {
            anyhow::bail!("Invalid concurrentDownloads, must be at least 1");
        }
        for (name, secs) in [
            ("pageDelay", Some(self.page_delay)),
            ("listingTimeout", self.listing_timeout),
            ("detailTimeout", self.detail_timeout),
        ] {
            if let Some(secs) = secs {
                if !secs.is_finite() || secs < 0.0 {
                    anyhow::bail!("Invalid {name}, expected a positive number of seconds got: {secs}");
                }
                if let Err(e) = Duration::try_from_secs_f32(secs) {
                    anyhow::bail!("Invalid {name}, {secs} seconds got: {e}");
                }
            }
        }
        Ok(())
    }

    pub(crate) fn page_delay(&self) -> Duration {
        Duration::from_secs_f32(self.page_delay)
    }

    pub(crate) fn listing_timeout(&self) -> Option<Duration> {
        self.listing_timeout.map(Duration::from_secs_f32)
    }

    pub(crate) fn detail_timeout(&self) -> Option<Duration> {
        self.detail_timeout.map(Duration::from_secs_f32)
    }
}

fn default_user_agent() -> String {
    String::from("Mozilla/5.0 (compatible; TeddyBot/1.0)")
}

fn default_first_page() -> u32 {
    1
}

fn default_last_page() -> u32 {
    999
}

fn default_page_delay() -> f32 {
    0.15
}

fn default_max_consecutive_stale() -> usize {
    1000
}

fn default_detail_timeout() -> Option<f32> {
    Some(10.0)
}

fn default_concurrent_downloads() -> usize {
    10
}

fn default_on_listing_error() -> OnError {
    OnError::SkipAndLog
}

fn default_on_detail_error() -> OnError {
    OnError::SkipAndLog
}

fn default_handle_sigint() -> bool {
    true
}

fn default_show_progress() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OnError {
    Fail,
    SkipAndLog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_uses_defaults() {
        let conf: CrawlerConfig = serde_yaml::from_str(
            "lastPage: 40\nconcurrentDownloads: 3\nonDetailError: Fail\nlistingTimeout: 2.5\n",
        )
        .unwrap();

        assert_eq!(conf.first_page, 1);
        assert_eq!(conf.last_page, 40);
        assert_eq!(conf.concurrent_downloads, 3);
        assert_eq!(conf.on_detail_error, OnError::Fail);
        assert_eq!(conf.on_listing_error, OnError::SkipAndLog);
        assert_eq!(conf.listing_timeout(), Some(Duration::from_secs_f32(2.5)));
        assert_eq!(conf.detail_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(conf.user_agent, "Mozilla/5.0 (compatible; TeddyBot/1.0)");
    }

    #[test]
    fn default_is_valid() {
        CrawlerConfig::default().validate().unwrap();
    }

    #[test]
    fn reversed_page_range_is_rejected() {
        let conf = CrawlerConfig {
            first_page: 10,
            last_page: 2,
            ..Default::default()
        };
        let err = conf.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid page range"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let conf = CrawlerConfig {
            concurrent_downloads: 0,
            ..Default::default()
        };
        assert!(conf.validate().is_err());
    }

    #[test]
    fn negative_delay_is_rejected() {
        let conf = CrawlerConfig {
            page_delay: -1.0,
            ..Default::default()
        };
        let err = conf.validate().unwrap_err();
        assert!(err.to_string().contains("pageDelay"));
    }

    #[test]
    fn huge_delay_is_rejected() {
        let conf = CrawlerConfig {
            page_delay: 1e30,
            ..Default::default()
        };
        let err = conf.validate().unwrap_err();
        assert!(err.to_string().contains("pageDelay"));

        let conf = CrawlerConfig {
            detail_timeout: Some(1e30),
            ..Default::default()
        };
        let err = conf.validate().unwrap_err();
        assert!(err.to_string().contains("detailTimeout"));
    }
}

mod config;
mod crawler;
mod directory;
mod fetch;
mod report;
mod seen;

pub use config::{CrawlerConfig, OnError};
pub use crawler::{collect_cards, crawl_directory, fetch_details, Crawl, Listing};
pub use directory::Directory;
pub use fetch::Fetcher;
pub use report::{ListingReport, PageStat};
pub use seen::SeenUrls;

pub use anyhow;

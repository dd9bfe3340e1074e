use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Error, Result};
use futures::{future, stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{CrawlerConfig, OnError};
use crate::directory::Directory;
use crate::fetch::Fetcher;
use crate::report::{ListingReport, PageStat};
use crate::seen::SeenUrls;

/// New cards gathered from the listing pages.
#[derive(Debug)]
pub struct Listing<C> {
    pub cards: Vec<C>,
    pub report: ListingReport,
}

#[derive(Debug)]
pub struct Crawl<R> {
    pub records: Vec<R>,
    pub report: ListingReport,
}

fn progress_bar(config: &CrawlerConfig, len: u64, msg: &'static str) -> ProgressBar {
    if !config.show_progress {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(msg);
    pb
}

fn until_err<T, E>(
    err: &mut &mut Result<(), E>,
    item: Result<T, E>,
) -> impl Future<Output = Option<T>> {
    match item {
        Ok(item) => future::ready(Some(item)),
        Err(e) => {
            **err = Err(e);
            future::ready(None)
        }
    }
}

async fn scrap_listing<D>(
    config: &CrawlerConfig,
    directory: &D,
    fetcher: &Fetcher,
    page_num: u32,
) -> Result<Vec<D::Card>>
where
    D: Directory,
{
    let url = directory.listing_url(page_num);
    let page = fetcher
        .download(&url, config.listing_timeout())
        .await
        .with_context(|| format!("Couldn't download {url}"))?;
    directory
        .parse_listing(&page, page_num)
        .with_context(|| format!("Couldn't parse {url}"))
}

async fn scrap_detail<D>(
    directory: &D,
    fetcher: &Fetcher,
    url: &str,
    timeout: Option<Duration>,
) -> Result<D::Details>
where
    D: Directory,
{
    let page = fetcher
        .download(url, timeout)
        .await
        .with_context(|| format!("Couldn't download {url}"))?;
    directory
        .parse_detail(&page)
        .with_context(|| format!("Couldn't parse {url}"))
}

/// Walks the listing pages in order and keeps the cards whose URL is not in `seen`.
///
/// Stops at the first page without cards, at `lastPage`, or after `maxConsecutiveStale`
/// pages in a row brought nothing new. Every kept URL is added to `seen`.
pub async fn collect_cards<D>(
    config: &CrawlerConfig,
    directory: &D,
    fetcher: &Fetcher,
    seen: &mut SeenUrls,
) -> Result<Listing<D::Card>>
where
    D: Directory,
{
    config.validate()?;

    let num_pages = u64::from(config.last_page - config.first_page) + 1;
    let pb = progress_bar(config, num_pages, "Collecting listing cards");

    let mut cards = vec![];
    let mut report = ListingReport::default();
    let mut consecutive_stale = 0;

    for page_num in config.first_page..=config.last_page {
        pb.inc(1);

        let page_cards = match scrap_listing(config, directory, fetcher, page_num).await {
            Ok(page_cards) => page_cards,
            Err(e) => match config.on_listing_error {
                OnError::SkipAndLog => {
                    log::warn!("Skipping listing page {page_num} got: {e:#}");
                    report.failed_pages.push(page_num);
                    continue;
                }
                OnError::Fail => {
                    pb.abandon();
                    return Err(e);
                }
            },
        };

        if page_cards.is_empty() {
            log::warn!("No cards found on page {page_num}, stopping");
            break;
        }

        let total = page_cards.len();
        let mut new = 0;
        for card in page_cards {
            if seen.insert(directory.card_url(&card)) {
                cards.push(card);
                new += 1;
            }
        }
        report.stats.push(PageStat {
            page: page_num,
            cards: total,
            new,
        });

        if page_num % 25 == 0 {
            log::info!(
                "Page {page_num}: {total} cards, {new} new, total new so far {}",
                cards.len()
            );
        }

        tokio::time::sleep(config.page_delay()).await;

        if new == 0 {
            consecutive_stale += 1;
            if consecutive_stale >= config.max_consecutive_stale {
                log::info!(
                    "{consecutive_stale} consecutive pages with no new URLs, stopping early at page {page_num}"
                );
                break;
            }
        } else {
            consecutive_stale = 0;
        }
    }

    pb.finish_and_clear();

    Ok(Listing { cards, report })
}

/// Downloads and parses the detail page of every card, at most `concurrentDownloads`
/// at a time.
///
/// Each card fails on its own: with `OnError::SkipAndLog` its details fall back to
/// `Default` while the card itself is kept. Records come out in completion order.
pub async fn fetch_details<D>(
    config: &CrawlerConfig,
    directory: &D,
    fetcher: &Fetcher,
    cards: Vec<D::Card>,
) -> Result<Vec<D::Record>>
where
    D: Directory,
{
    config.validate()?;

    let pb = progress_bar(config, cards.len() as u64, "Scraping detail pages");
    let timeout = config.detail_timeout();

    let stream = stream::iter(cards)
        .map(|card| async move {
            let details = scrap_detail(directory, fetcher, directory.card_url(&card), timeout).await;
            (card, details)
        })
        .buffer_unordered(config.concurrent_downloads)
        .map(|(card, details)| {
            pb.inc(1);
            match details {
                Ok(details) => Ok(directory.record(card, details)),
                Err(e) => match config.on_detail_error {
                    OnError::SkipAndLog => {
                        log::debug!("Nulling out details got: {e:#}");
                        Ok(directory.record(card, D::Details::default()))
                    }
                    OnError::Fail => Err(e),
                },
            }
        });

    let mut err = Ok::<(), Error>(());
    let records = stream
        .scan(&mut err, until_err)
        .collect::<Vec<_>>()
        .await;

    match err {
        Ok(()) => {
            pb.finish_and_clear();
            Ok(records)
        }
        Err(e) => {
            pb.abandon();
            Err(e)
        }
    }
}

/// Runs both stages: listing pages, then detail pages of the cards not in `seen`.
pub async fn crawl_directory<D>(
    config: &CrawlerConfig,
    directory: &D,
    mut seen: SeenUrls,
) -> Result<Crawl<D::Record>>
where
    D: Directory,
{
    config.validate()?;
    let fetcher = Fetcher::new(config)?;

    let crawl = async {
        let Listing { cards, report } =
            collect_cards(config, directory, &fetcher, &mut seen).await?;

        let records = fetch_details(config, directory, &fetcher, cards).await?;
        Ok::<_, Error>(Crawl { records, report })
    };

    if config.handle_sigint {
        tokio::select! {
            res = crawl => res,
            Ok(()) = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
        }
    } else {
        crawl.await
    }
}

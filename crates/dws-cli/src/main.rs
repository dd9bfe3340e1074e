use std::io;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use dws_crawler::{crawl_directory, Crawl, CrawlerConfig, ListingReport, OnError, SeenUrls};
use dws_mcp::writer::{snapshot_path, write_snapshot, CsvWriter, CsvWriterConfig};
use dws_mcp::{history, McpSo, ServerDetails, MCP_SO_URL};
use tokio::runtime;

/// Directory Web Scraper
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[command(name = "crawl")]
    Crawl(CrawlArgs),
    #[command(name = "scrap")]
    Scrap(ScrapArgs),
    #[command(hide = true)]
    Completion,
}

/// Crawl the server listing and scrap the pages of servers not seen before
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// Directory holding previous `results/` and written `raw/` snapshots
    #[arg(long, default_value = "data/mcp")]
    pub data_dir: PathBuf,
    /// Write the snapshot there instead of `<data-dir>/raw/mcp_scraped_<date>.csv`
    #[arg(long, short)]
    pub output_file: Option<PathBuf>,
    /// Snapshot field delimiter
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,
    /// Root URL of the directory
    #[arg(long, default_value = MCP_SO_URL)]
    pub base_url: String,
    /// Scrap every listed server, ignoring previous results
    #[arg(long)]
    pub no_dedup: bool,
    /// Optional default crawler yaml configuration file
    #[arg(env = "DWS_CRAWLER_CONFIG", long)]
    pub crawler_config: Option<PathBuf>,
    /// Override crawler's user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Override crawler's first listing page
    #[arg(long)]
    pub first_page: Option<u32>,
    /// Override crawler's last listing page
    #[arg(long)]
    pub last_page: Option<u32>,
    /// Override crawler's delay in seconds between listing pages
    #[arg(long)]
    pub page_delay: Option<f32>,
    /// Override crawler's number of pages in a row without new servers before stopping
    #[arg(long)]
    pub max_consecutive_stale: Option<usize>,
    /// Override crawler's listing page timeout in seconds
    #[arg(long)]
    pub listing_timeout: Option<f32>,
    /// Override crawler's detail page timeout in seconds
    #[arg(long)]
    pub detail_timeout: Option<f32>,
    /// Override crawler's maximum concurrent detail page downloads
    #[arg(long)]
    pub concurrent_downloads: Option<usize>,
    /// Override crawler's listing page error handling strategy
    #[arg(value_enum, long)]
    pub on_listing_error: Option<OnError>,
    /// Override crawler's detail page error handling strategy
    #[arg(value_enum, long)]
    pub on_detail_error: Option<OnError>,
    /// No SIGINT handling, an interrupted crawl is simply killed
    #[arg(long)]
    pub no_sigint: bool,
    /// When quiet no logs nor progress bars are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

impl TryFrom<&CrawlArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CrawlArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.crawler_config.as_ref().map(fs_err::File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            CrawlerConfig::default()
        };
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(first_page) = args.first_page {
            conf.first_page = first_page;
        }
        if let Some(last_page) = args.last_page {
            conf.last_page = last_page;
        }
        if let Some(page_delay) = args.page_delay {
            conf.page_delay = page_delay;
        }
        if let Some(max_consecutive_stale) = args.max_consecutive_stale {
            conf.max_consecutive_stale = max_consecutive_stale;
        }
        if let Some(listing_timeout) = args.listing_timeout {
            conf.listing_timeout = Some(listing_timeout);
        }
        if let Some(detail_timeout) = args.detail_timeout {
            conf.detail_timeout = Some(detail_timeout);
        }
        if let Some(concurrent_downloads) = args.concurrent_downloads {
            conf.concurrent_downloads = concurrent_downloads;
        }
        if let Some(on_listing_error) = args.on_listing_error {
            conf.on_listing_error = on_listing_error;
        }
        if let Some(on_detail_error) = args.on_detail_error {
            conf.on_detail_error = on_detail_error;
        }
        if args.no_sigint {
            conf.handle_sigint = false;
        }
        if args.quiet {
            conf.show_progress = false;
        }
        conf.validate()?;
        Ok(conf)
    }
}

fn print_report(report: &ListingReport) {
    println!("Collected {} unique URLs after deduping", report.total_new());
    println!("Total pages scraped: {}", report.pages_scraped());
    if !report.failed_pages.is_empty() {
        println!("Failed pages: {:?}", report.failed_pages);
    }

    let stale = report.stale_pages();
    if !stale.is_empty() {
        println!(
            "Pages with zero new URLs: {:?} ...",
            &stale[..stale.len().min(10)]
        );
    }

    println!("Top 10 pages by # of new URLs:");
    for stat in report.top_pages(10) {
        println!("  {stat}");
    }
}

fn csv_config(args: &CrawlArgs) -> anyhow::Result<CsvWriterConfig> {
    let conf = CsvWriterConfig {
        delimiter: args.delimiter,
        ..Default::default()
    };
    conf.validate()?;
    Ok(conf)
}

pub fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    let crawler_conf = (&args).try_into()?;
    let csv_conf = csv_config(&args)?;
    let directory = McpSo::new(&args.base_url);
    let seen = if args.no_dedup {
        SeenUrls::default()
    } else {
        history::load_seen_urls(&args.data_dir)?
    };

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let Crawl { records, report } =
        rt.block_on(crawl_directory(&crawler_conf, &directory, seen))?;

    print_report(&report);

    let output_file = args
        .output_file
        .unwrap_or_else(|| snapshot_path(&args.data_dir, Local::now().date_naive()));
    let written = write_snapshot(&output_file, &csv_conf, &records)?;

    println!("Saved {written} rows to {}", output_file.display());
    println!("Elapsed: {:.2} seconds", start.elapsed().as_secs_f64());

    Ok(())
}

/// Scrap a single server page and print its details to stdout
#[derive(Debug, clap::Args)]
#[command(group = clap::ArgGroup::new("page").required(true))]
pub struct ScrapArgs {
    /// A local html page to scrap
    #[arg(group = "page", long)]
    pub file: Option<PathBuf>,
    /// A distant html page to scrap
    #[arg(group = "page", long)]
    pub url: Option<String>,
    /// Custom user agent to download the page
    #[arg(long, conflicts_with = "file")]
    pub ua: Option<String>,
}

pub fn scrap(args: ScrapArgs) -> anyhow::Result<()> {
    let page = if let Some(url) = args.url {
        let ua = args
            .ua
            .unwrap_or_else(|| CrawlerConfig::default().user_agent);
        let client = reqwest::blocking::ClientBuilder::new()
            .user_agent(ua)
            .build()?;
        client.get(&url).send()?.error_for_status()?.text()?
    } else if let Some(path) = args.file {
        fs_err::read_to_string(path)?
    } else {
        anyhow::bail!("Missing `url` or `file`");
    };

    let details = McpSo::default().parse_details(&page);

    let mut wtr = CsvWriter::stdout(&CsvWriterConfig::default());
    wtr.write_record(ServerDetails::HEADERS)?;
    wtr.serialize(&details)?;
    wtr.flush()?;

    Ok(())
}

fn init_logger(default_filters: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filters))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Crawl(args) => {
            if !args.quiet {
                init_logger("dws=info,dws_crawler=info,dws_mcp=info");
            }
            crawl(args)
        }
        SubCommand::Scrap(args) => {
            init_logger("dws_mcp=warn");
            scrap(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "dws", &mut io::stdout());
            Ok(())
        }
    }
}

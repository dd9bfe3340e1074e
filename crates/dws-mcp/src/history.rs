//! Results of previous runs, used to skip servers that were already scraped.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use dws_crawler::SeenUrls;

pub const RESULTS_DIR: &str = "results";
pub const RESULTS_PATTERN: &str = "mcp_results_*.csv";
pub const URL_COLUMN: &str = "url";

/// The most recent results file of `data_dir`, the file names sort chronologically.
pub fn latest_results<P: AsRef<Path>>(data_dir: P) -> Result<Option<PathBuf>> {
    let results_dir = data_dir.as_ref().join(RESULTS_DIR);
    let results_dir = results_dir
        .to_str()
        .ok_or_else(|| anyhow!("Non UTF-8 path: {}", results_dir.display()))?;
    let pattern = format!("{}/{RESULTS_PATTERN}", glob::Pattern::escape(results_dir));

    let mut paths = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths.pop())
}

/// Reads the `url` column of a results file, other columns are ignored.
pub fn read_seen_urls<P: AsRef<Path>>(results_file: P) -> Result<SeenUrls> {
    let path = results_file.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(fs_err::File::open(path)?);

    let url_idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == URL_COLUMN)
        .ok_or_else(|| anyhow!("Missing `{URL_COLUMN}` column in {}", path.display()))?;

    let mut urls = vec![];
    for record in rdr.records() {
        if let Some(url) = record?.get(url_idx) {
            urls.push(url.to_string());
        }
    }

    Ok(SeenUrls::from_urls(urls))
}

/// Seen URLs from the latest results of `data_dir`, empty when there are none.
pub fn load_seen_urls<P: AsRef<Path>>(data_dir: P) -> Result<SeenUrls> {
    match latest_results(data_dir)? {
        Some(path) => {
            log::info!("Using existing results for dedup: {}", path.display());
            let seen = read_seen_urls(&path)?;
            log::info!("Loaded {} existing URLs to skip", seen.len());
            Ok(seen)
        }
        None => {
            log::info!("No existing results found, scraping all URLs");
            Ok(SeenUrls::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_results(data_dir: &Path, name: &str, content: &str) -> PathBuf {
        let dir = data_dir.join(RESULTS_DIR);
        fs_err::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs_err::write(&path, content).unwrap();
        path
    }

    #[test]
    fn latest_is_last_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_results(tmp.path(), "mcp_results_2025-01-03.csv", "url\n");
        let latest = write_results(tmp.path(), "mcp_results_2025-02-01.csv", "url\n");
        write_results(tmp.path(), "mcp_results_2024-12-31.csv", "url\n");
        write_results(tmp.path(), "other_2099-01-01.csv", "url\n");

        assert_eq!(latest_results(tmp.path()).unwrap(), Some(latest));
    }

    #[test]
    fn no_results_dir() {
        let tmp = tempfile::tempdir().unwrap();

        assert_eq!(latest_results(tmp.path()).unwrap(), None);
        assert!(load_seen_urls(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn reads_url_column_only() {
        let tmp = tempfile::tempdir().unwrap();
        write_results(
            tmp.path(),
            "mcp_results_2025-01-01.csv",
            "title,url,category\n\
             A,https://mcp.so/server/a,db\n\
             B, https://mcp.so/server/b ,\"x, y\"\n\
             C,,none\n\
             D\n\
             E,https://mcp.so/server/a,dup\n",
        );

        let seen = load_seen_urls(tmp.path()).unwrap();

        assert_eq!(seen.len(), 2);
        assert!(seen.contains("https://mcp.so/server/a"));
        assert!(seen.contains("https://mcp.so/server/b"));
    }

    #[test]
    fn missing_url_column() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_results(tmp.path(), "mcp_results_2025-01-01.csv", "title,link\nA,b\n");

        let err = read_seen_urls(path).unwrap_err();
        assert!(err.to_string().contains("Missing `url` column"));
    }
}

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::ServerRecord;

pub const RAW_DIR: &str = "raw";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsvWriterConfig {
    #[serde(default = "default_csv_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub escape: Option<char>,
    #[serde(default = "default_csv_terminator")]
    pub terminator: CsvTerminator,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            escape: None,
            terminator: CsvTerminator::Any('\n'),
        }
    }
}

impl CsvWriterConfig {
    /// The csv writer works on bytes, so every special character must be ASCII.
    pub fn validate(&self) -> anyhow::Result<()> {
        let terminator = match self.terminator {
            CsvTerminator::CRLF => None,
            CsvTerminator::Any(c) => Some(c),
        };
        for (name, c) in [
            ("delimiter", Some(self.delimiter)),
            ("escape", self.escape),
            ("terminator", terminator),
        ] {
            if let Some(c) = c {
                if !c.is_ascii() {
                    anyhow::bail!("Invalid csv {name} {c:?}, must be an ASCII character");
                }
            }
        }
        Ok(())
    }
}

fn default_csv_delimiter() -> char {
    CsvWriterConfig::default().delimiter
}

fn default_csv_terminator() -> CsvTerminator {
    CsvWriterConfig::default().terminator
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CsvTerminator {
    CRLF,
    Any(char),
}

impl From<CsvTerminator> for csv::Terminator {
    fn from(source: CsvTerminator) -> Self {
        match source {
            CsvTerminator::CRLF => Self::CRLF,
            CsvTerminator::Any(c) => Self::Any(c as u8),
        }
    }
}

impl From<&CsvWriterConfig> for csv::WriterBuilder {
    fn from(c: &CsvWriterConfig) -> Self {
        let mut builder = csv::WriterBuilder::new();
        builder.has_headers(false);
        builder.delimiter(c.delimiter as u8);
        builder.terminator(c.terminator.into());
        if let Some(escape) = c.escape {
            builder.double_quote(false);
            builder.escape(escape as u8);
        } else {
            builder.double_quote(true);
        }
        builder
    }
}

pub enum CsvWriter {
    File(csv::Writer<fs_err::File>),
    Stdout(csv::Writer<io::Stdout>),
}

impl CsvWriter {
    /// Creates the file along with its missing parent directories.
    pub fn create<P: AsRef<Path>>(path: P, config: &CsvWriterConfig) -> anyhow::Result<Self> {
        let path = path.as_ref();
        config.validate()?;
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        let file = fs_err::File::create(path)?;
        Ok(Self::File(csv::WriterBuilder::from(config).from_writer(file)))
    }

    pub fn stdout(config: &CsvWriterConfig) -> Self {
        Self::Stdout(csv::WriterBuilder::from(config).from_writer(io::stdout()))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File(wtr) => wtr.flush(),
            Self::Stdout(wtr) => wtr.flush(),
        }
    }

    pub fn write_record<I, T>(&mut self, record: I) -> csv::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        match self {
            Self::File(wtr) => wtr.write_record(record),
            Self::Stdout(wtr) => wtr.write_record(record),
        }
    }

    pub fn serialize<S: Serialize>(&mut self, record: S) -> csv::Result<()> {
        match self {
            Self::File(wtr) => wtr.serialize(record),
            Self::Stdout(wtr) => wtr.serialize(record),
        }
    }
}

/// `<data_dir>/raw/mcp_scraped_<date>.csv`
pub fn snapshot_path<P: AsRef<Path>>(data_dir: P, date: NaiveDate) -> PathBuf {
    data_dir
        .as_ref()
        .join(RAW_DIR)
        .join(format!("mcp_scraped_{}.csv", date.format("%Y-%m-%d")))
}

/// Writes the header and every record, returns the number of records written.
pub fn write_snapshot<P: AsRef<Path>>(
    path: P,
    config: &CsvWriterConfig,
    records: &[ServerRecord],
) -> anyhow::Result<usize> {
    let mut wtr = CsvWriter::create(path, config)?;
    wtr.write_record(ServerRecord::HEADERS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, uploaded: Option<&str>) -> ServerRecord {
        ServerRecord {
            page: 2,
            title: Some("Fetch".into()),
            description: Some("Web content, as markdown".into()),
            url: url.into(),
            uploaded: uploaded.map(String::from),
            use_cases: None,
            key_features: Some("Fast".into()),
        }
    }

    #[test]
    fn snapshot_path_is_dated() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            snapshot_path("data/mcp", date),
            Path::new("data/mcp/raw/mcp_scraped_2025-03-07.csv")
        );
    }

    #[test]
    fn snapshot_has_header_and_empty_nulls() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("raw").join("out.csv");
        let records = vec![
            record("https://mcp.so/server/fetch", Some("2 days ago")),
            record("https://mcp.so/server/other", None),
        ];

        let written = write_snapshot(&path, &CsvWriterConfig::default(), &records).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            fs_err::read_to_string(&path).unwrap(),
            "page,title,description,url,uploaded,use_cases,key_features\n\
             2,Fetch,\"Web content, as markdown\",https://mcp.so/server/fetch,2 days ago,,Fast\n\
             2,Fetch,\"Web content, as markdown\",https://mcp.so/server/other,,,Fast\n"
        );
    }

    #[test]
    fn empty_snapshot_keeps_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.csv");

        write_snapshot(&path, &CsvWriterConfig::default(), &[]).unwrap();

        assert_eq!(
            fs_err::read_to_string(&path).unwrap(),
            "page,title,description,url,uploaded,use_cases,key_features\n"
        );
    }

    #[test]
    fn custom_delimiter() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.tsv");
        let config = CsvWriterConfig {
            delimiter: '\t',
            ..Default::default()
        };

        write_snapshot(&path, &config, &[record("u", None)]).unwrap();

        let content = fs_err::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().nth(1),
            Some("2\tFetch\tWeb content, as markdown\tu\t\t\tFast")
        );
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.csv");
        let config = CsvWriterConfig {
            delimiter: '§',
            ..Default::default()
        };

        let err = write_snapshot(&path, &config, &[record("u", None)]).unwrap_err();

        assert!(err.to_string().contains("delimiter"));
        assert!(!path.exists());
    }

    #[test]
    fn non_ascii_escape_is_rejected() {
        let config = CsvWriterConfig {
            escape: Some('é'),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(CsvWriterConfig::default().validate().is_ok());
    }
}

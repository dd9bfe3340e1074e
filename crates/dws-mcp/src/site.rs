use dws_crawler::Directory;
use lazy_static::lazy_static;
use scraper::{Html, Selector};

use crate::extract::{element_text, extract_section_text, non_empty};
use crate::record::{ServerCard, ServerDetails, ServerRecord};

pub const MCP_SO_URL: &str = "https://mcp.so";

/// Class list of the badge holding the upload time on a server page
const UPLOADED_BADGE_CLASS: &str = "bg-secondary border-secondary text-secondary-foreground px-2 py-1 rounded-full text-xs truncate flex items-center gap-1";

const USE_CASE_KEYWORDS: &[&str] = &["use case"];
const KEY_FEATURE_KEYWORDS: &[&str] = &["key feature"];

lazy_static! {
    static ref SERVER_LINK: Selector = Selector::parse("a[href^='/server/']").unwrap();
    static ref CARD_TITLE: Selector = Selector::parse("h2, h3, h4").unwrap();
    static ref CARD_DESCRIPTION: Selector = Selector::parse("p").unwrap();
    static ref DIV: Selector = Selector::parse("div").unwrap();
}

/// The mcp.so server directory, or a mirror of it.
#[derive(Debug, Clone)]
pub struct McpSo {
    base_url: String,
}

impl Default for McpSo {
    fn default() -> Self {
        Self::new(MCP_SO_URL)
    }
}

impl McpSo {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn parse_cards(&self, page: &str, page_num: u32) -> Vec<ServerCard> {
        let document = Html::parse_document(page);

        document
            .select(&SERVER_LINK)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                let title = link
                    .select(&CARD_TITLE)
                    .next()
                    .and_then(|e| non_empty(element_text(e, "")));
                let description = link
                    .select(&CARD_DESCRIPTION)
                    .next()
                    .and_then(|e| non_empty(element_text(e, "")));
                Some(ServerCard {
                    page: page_num,
                    title,
                    description,
                    url: format!("{}{href}", self.base_url),
                })
            })
            .collect()
    }

    pub fn parse_details(&self, page: &str) -> ServerDetails {
        let document = Html::parse_document(page);

        let uploaded = document
            .select(&DIV)
            .find(|div| {
                div.value()
                    .attr("class")
                    .map(|class| class.split_whitespace().collect::<Vec<_>>().join(" "))
                    .map_or(false, |class| class == UPLOADED_BADGE_CLASS)
            })
            .and_then(|div| non_empty(element_text(div, "")));

        ServerDetails {
            uploaded,
            use_cases: extract_section_text(&document, USE_CASE_KEYWORDS),
            key_features: extract_section_text(&document, KEY_FEATURE_KEYWORDS),
        }
    }
}

impl Directory for McpSo {
    type Card = ServerCard;
    type Details = ServerDetails;
    type Record = ServerRecord;

    fn listing_url(&self, page: u32) -> String {
        format!("{}/servers?page={page}", self.base_url)
    }

    fn parse_listing(&self, page: &str, page_num: u32) -> anyhow::Result<Vec<ServerCard>> {
        Ok(self.parse_cards(page, page_num))
    }

    fn card_url<'a>(&self, card: &'a ServerCard) -> &'a str {
        &card.url
    }

    fn parse_detail(&self, page: &str) -> anyhow::Result<ServerDetails> {
        Ok(self.parse_details(page))
    }

    fn record(&self, card: ServerCard, details: ServerDetails) -> ServerRecord {
        ServerRecord::new(card, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <nav><a href="/servers?page=2">Next</a><a href="/about">About</a></nav>
          <a href="/server/github/modelcontextprotocol">
            <div><h3> GitHub </h3><p>Repository management</p><p>ignored</p></div>
          </a>
          <a href="/server/bare"><span>No title</span></a>
          <a href="/server/empty"><div><h2>   </h2><p>Only a description</p></div></a>
        </body></html>
    "#;

    #[test]
    fn listing_url() {
        assert_eq!(
            McpSo::default().listing_url(7),
            "https://mcp.so/servers?page=7"
        );
        assert_eq!(
            McpSo::new("http://localhost:8080/").listing_url(1),
            "http://localhost:8080/servers?page=1"
        );
    }

    #[test]
    fn cards_from_server_links() {
        let cards = McpSo::default().parse_cards(LISTING, 4);

        assert_eq!(
            cards,
            vec![
                ServerCard {
                    page: 4,
                    title: Some("GitHub".into()),
                    description: Some("Repository management".into()),
                    url: "https://mcp.so/server/github/modelcontextprotocol".into(),
                },
                ServerCard {
                    page: 4,
                    title: None,
                    description: None,
                    url: "https://mcp.so/server/bare".into(),
                },
                ServerCard {
                    page: 4,
                    title: None,
                    description: Some("Only a description".into()),
                    url: "https://mcp.so/server/empty".into(),
                },
            ]
        );
    }

    #[test]
    fn no_cards() {
        assert!(McpSo::default()
            .parse_cards("<html><body><p>End</p></body></html>", 9)
            .is_empty());
    }

    #[test]
    fn details_from_server_page() {
        let page = format!(
            r#"
            <div class="bg-secondary text-xs">not this one</div>
            <div class="  {UPLOADED_BADGE_CLASS}  "><svg></svg> 3 months ago </div>
            <h2>Key Features</h2><ul><li>Search</li><li>Issues</li></ul>
            <h2>Use Cases</h2><p>Automate triage</p>
            "#
        );

        let details = McpSo::default().parse_details(&page);

        assert_eq!(
            details,
            ServerDetails {
                uploaded: Some("3 months ago".into()),
                use_cases: Some("Automate triage".into()),
                key_features: Some("Search Issues".into()),
            }
        );
    }

    #[test]
    fn details_default_when_absent() {
        let details = McpSo::default().parse_details("<p>Server not found</p>");
        assert_eq!(details, ServerDetails::default());
    }
}

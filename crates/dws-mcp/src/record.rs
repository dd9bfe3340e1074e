use serde::{Deserialize, Serialize};

/// A server as listed on a directory page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerCard {
    pub page: u32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
}

/// Fields scraped from a server page, all `None` when the page couldn't be scraped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerDetails {
    pub uploaded: Option<String>,
    pub use_cases: Option<String>,
    pub key_features: Option<String>,
}

impl ServerDetails {
    pub const HEADERS: [&'static str; 3] = ["uploaded", "use_cases", "key_features"];
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerRecord {
    pub page: u32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub uploaded: Option<String>,
    pub use_cases: Option<String>,
    pub key_features: Option<String>,
}

impl ServerRecord {
    pub const HEADERS: [&'static str; 7] = [
        "page",
        "title",
        "description",
        "url",
        "uploaded",
        "use_cases",
        "key_features",
    ];

    pub fn new(card: ServerCard, details: ServerDetails) -> Self {
        Self {
            page: card.page,
            title: card.title,
            description: card.description,
            url: card.url,
            uploaded: details.uploaded,
            use_cases: details.use_cases,
            key_features: details.key_features,
        }
    }
}

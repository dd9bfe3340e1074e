use std::collections::HashSet;

/// URLs already scraped, by previous runs or earlier in the current one.
#[derive(Debug, Clone, Default)]
pub struct SeenUrls {
    urls: HashSet<String>,
}

impl SeenUrls {
    /// Seeds the set, blank entries are ignored and the others trimmed.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = urls
            .into_iter()
            .map(|url| url.as_ref().trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        Self { urls }
    }

    /// Returns true when the URL had not been seen yet.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            false
        } else {
            self.urls.insert(url.to_string())
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

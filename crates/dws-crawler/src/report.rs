use std::fmt;

/// Outcome of one successfully scraped listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStat {
    pub page: u32,
    pub cards: usize,
    pub new: usize,
}

impl fmt::Display for PageStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Page {}: {} new / {} total cards",
            self.page, self.new, self.cards
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingReport {
    pub stats: Vec<PageStat>,
    pub failed_pages: Vec<u32>,
}

impl ListingReport {
    pub fn pages_scraped(&self) -> usize {
        self.stats.len()
    }

    pub fn total_new(&self) -> usize {
        self.stats.iter().map(|s| s.new).sum()
    }

    /// Pages that did not yield any new URL, in crawl order.
    pub fn stale_pages(&self) -> Vec<u32> {
        self.stats
            .iter()
            .filter(|s| s.new == 0)
            .map(|s| s.page)
            .collect()
    }

    /// The `n` pages with the most new URLs, ties kept in crawl order.
    pub fn top_pages(&self, n: usize) -> Vec<PageStat> {
        let mut stats = self.stats.clone();
        stats.sort_by(|a, b| b.new.cmp(&a.new));
        stats.truncate(n);
        stats
    }
}

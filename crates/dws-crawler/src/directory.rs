/// Site specific scraping logic driven by the crawler.
///
/// A directory exposes numbered listing pages made of cards, and each card points to a
/// detail page. Listing pages are scraped sequentially, detail pages concurrently.
pub trait Directory {
    /// Metadata of an item as shown on a listing page
    type Card: Send;

    /// Fields extracted from a detail page, `Default` is used when extraction fails
    type Details: Default + Send;

    /// One output row
    type Record: Send;

    fn listing_url(&self, page: u32) -> String;

    /// Returns the cards of a listing page, an empty list marks the end of the listing.
    fn parse_listing(&self, page: &str, page_num: u32) -> anyhow::Result<Vec<Self::Card>>;

    /// Absolute URL of the card's detail page, also used as its identity.
    fn card_url<'a>(&self, card: &'a Self::Card) -> &'a str;

    fn parse_detail(&self, page: &str) -> anyhow::Result<Self::Details>;

    fn record(&self, card: Self::Card, details: Self::Details) -> Self::Record;
}

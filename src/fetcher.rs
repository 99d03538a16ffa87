//! Review listing pagination and product page extraction.
//!
//! The browser is only used to navigate and to wait for elements; the page
//! HTML is then parsed with `scraper`, so every extraction rule below can be
//! exercised against captured markup.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::AnalyzerConfig;
use crate::product_url::ProductUrl;
use crate::review::ReviewRecord;
use crate::session::{random_user_agent, BrowserSession};

pub const DEFAULT_TITLE: &str = "Product";

/// Present once the review listing has rendered.
pub const LISTING_MARKER: &str = ".review";
pub const TITLE_SELECTOR: &str = "#productTitle";

/// Product image candidates, most specific first.
pub const IMAGE_SELECTORS: &[&str] = &[
    "#landingImage",
    "#imgBlkFront",
    "#main-image",
    "#main-image-container img",
    "#imageBlock_feature_div img",
    ".a-dynamic-image",
];

static REVIEW_NODE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[data-hook="review"]"#).unwrap());

static REVIEW_BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"span[data-hook="review-body"]"#).unwrap());

/// Star rating element variants, tried in order.
pub static RATING_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"i[data-hook="review-star-rating"]"#,
        r#"i[data-hook="cmps-review-star-rating"]"#,
        r#"span[data-hook="review-star-rating"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

// Leading number, whitespace-terminated ("4.0 out of 5 stars").
static RATING_LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)(?:\s|$)").unwrap());

/// Title and image read from the product detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub title: String,
    /// Base64-encoded image bytes
    pub image: Option<String>,
}

impl Default for ProductSnapshot {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            image: None,
        }
    }
}

/// Downloads the product image found on the page.
pub trait ImageDownloader {
    fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches images over HTTP with a random user agent. Only a 200 counts.
#[derive(Debug, Clone)]
pub struct HttpImageDownloader {
    pub timeout: Duration,
}

impl ImageDownloader for HttpImageDownloader {
    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client
            .get(url)
            .header(reqwest::header::USER_AGENT, random_user_agent())
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            anyhow::bail!("image request returned {}", status);
        }
        Ok(response.bytes()?.to_vec())
    }
}

// ============================================================================
// Per-page parsing
// ============================================================================

/// Reviews parsed from one listing page.
#[derive(Debug, Default)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewRecord>,
    pub nodes: usize,
}

impl ReviewPage {
    pub fn skipped(&self) -> usize {
        self.nodes - self.reviews.len()
    }
}

pub fn parse_review_page(html: &str) -> ReviewPage {
    let document = Html::parse_document(html);
    let mut page = ReviewPage::default();

    for node in document.select(&REVIEW_NODE) {
        page.nodes += 1;
        match extract_review(node) {
            Some(review) => page.reviews.push(review),
            None => debug!("Skipping review node #{} (missing body or rating)", page.nodes),
        }
    }

    page
}

/// One review node to a record; `None` if the body or a usable rating is missing.
pub fn extract_review(node: ElementRef<'_>) -> Option<ReviewRecord> {
    let text = node
        .select(&REVIEW_BODY)
        .next()?
        .text()
        .collect::<String>();

    let label = first_match(node, &RATING_SELECTORS)?
        .text()
        .collect::<String>();
    let rating = parse_rating(&label)?;

    ReviewRecord::new(&text, rating)
}

/// First element found by walking `chain` in order.
pub fn first_match<'a>(node: ElementRef<'a>, chain: &[Selector]) -> Option<ElementRef<'a>> {
    chain.iter().find_map(|selector| node.select(selector).next())
}

/// Leading numeric token of a rating label. Decimal commas are not accepted.
pub fn parse_rating(label: &str) -> Option<f64> {
    RATING_LEADING_NUMBER
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// ============================================================================
// Fetcher
// ============================================================================

pub struct PageFetcher {
    max_pages: u32,
    page_wait: Duration,
    image_wait: Duration,
    title_wait: Duration,
    dedupe: bool,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl PageFetcher {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            page_wait: config.page_wait,
            image_wait: config.image_wait,
            title_wait: config.title_wait,
            dedupe: config.dedupe_reviews,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Walks listing pages `1..=max_pages`. The first page that fails to load
    /// or never shows the listing ends pagination; everything collected so far
    /// is kept.
    pub fn fetch_reviews(&self, session: &dyn BrowserSession, product: &ProductUrl) -> Vec<ReviewRecord> {
        let mut reviews = Vec::new();
        let mut seen = HashSet::new();

        for page in 1..=self.max_pages {
            if self.should_stop() {
                warn!("⏹️ Pagination interrupted before page {}; keeping {} reviews", page, reviews.len());
                break;
            }

            let page_url = product.page_url(page);
            if let Err(e) = session.navigate(&page_url) {
                error!("❌ Error fetching page {}: {}", page, e);
                break;
            }
            if !session.wait_for(LISTING_MARKER, self.page_wait) {
                warn!("⏳ No review listing on page {} within {:?}; stopping", page, self.page_wait);
                break;
            }
            let html = match session.content() {
                Ok(html) => html,
                Err(e) => {
                    error!("❌ Could not read page {}: {}", page, e);
                    break;
                }
            };

            let parsed = parse_review_page(&html);
            info!("📄 Fetched page {} - Found {} reviews ({} skipped)", page, parsed.nodes, parsed.skipped());

            for review in parsed.reviews {
                if self.dedupe && !seen.insert(review.text().to_string()) {
                    debug!("Dropping duplicate review on page {}", page);
                    continue;
                }
                reviews.push(review);
            }
        }

        reviews
    }

    /// Title and image from the product page. Never fails; missing pieces
    /// fall back to the defaults.
    pub fn fetch_snapshot(
        &self,
        session: &dyn BrowserSession,
        product: &ProductUrl,
        downloader: &dyn ImageDownloader,
    ) -> ProductSnapshot {
        if let Err(e) = session.navigate(product.as_str()) {
            warn!("⚠️ Could not open product page: {}", e);
            return ProductSnapshot::default();
        }

        let title = self.fetch_title(session).unwrap_or_else(|| {
            warn!("⚠️ Product title not found, using '{}'", DEFAULT_TITLE);
            DEFAULT_TITLE.to_string()
        });
        let image = self.fetch_image(session, downloader);
        if image.is_none() {
            warn!("🖼️ No product image found");
        }

        ProductSnapshot { title, image }
    }

    fn fetch_title(&self, session: &dyn BrowserSession) -> Option<String> {
        if !session.wait_for(TITLE_SELECTOR, self.title_wait) {
            return None;
        }
        read_first(session, TITLE_SELECTOR, |el| {
            let title = el.text().collect::<String>().trim().to_string();
            (!title.is_empty()).then_some(title)
        })
    }

    fn fetch_image(&self, session: &dyn BrowserSession, downloader: &dyn ImageDownloader) -> Option<String> {
        let selector = first_present(session, IMAGE_SELECTORS, self.image_wait)?;
        let src = read_first(session, selector, |el| {
            el.value()
                .attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })?;

        if let Some(inline) = inline_base64(&src) {
            return Some(inline.to_string());
        }

        match downloader.download(&src) {
            Ok(bytes) => {
                info!("🖼️ Product image downloaded ({} bytes)", bytes.len());
                Some(STANDARD.encode(bytes))
            }
            Err(e) => {
                warn!("⚠️ Error fetching product image {}: {}", src, e);
                None
            }
        }
    }
}

/// First selector in `chain` whose element appears within `timeout`.
fn first_present<'c>(session: &dyn BrowserSession, chain: &[&'c str], timeout: Duration) -> Option<&'c str> {
    chain.iter().copied().find(|selector| {
        let found = session.wait_for(selector, timeout);
        if !found {
            debug!("Selector {} not found", selector);
        }
        found
    })
}

/// Applies `read` to the first element matching `selector` on the current page.
fn read_first<F>(session: &dyn BrowserSession, selector: &str, read: F) -> Option<String>
where
    F: Fn(ElementRef<'_>) -> Option<String>,
{
    let html = session
        .content()
        .map_err(|e| debug!("Could not read page content: {}", e))
        .ok()?;
    let selector = Selector::parse(selector).ok()?;
    let document = Html::parse_document(&html);
    let value = document.select(&selector).next().and_then(read);
    value
}

/// Payload of a `data:image/...;base64,` source, already encoded.
fn inline_base64(src: &str) -> Option<&str> {
    if !src.starts_with("data:image/") {
        return None;
    }
    src.split_once(";base64,").map(|(_, payload)| payload)
}

//! Product URL validation and review-listing URL derivation.

use url::Url;

use crate::error::AnalyzerError;

/// Substring every accepted product URL must contain (case-insensitive).
pub const VENDOR_MARKER: &str = "amazon";

const PRODUCT_SEGMENT: &str = "/dp/";
const REVIEWS_SEGMENT: &str = "/product-reviews/";

/// A validated product detail page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUrl {
    url: Url,
}

impl ProductUrl {
    pub fn parse(raw: &str) -> Result<Self, AnalyzerError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AnalyzerError::InvalidUrl("No URL provided".to_string()));
        }
        if !raw.to_lowercase().contains(VENDOR_MARKER) {
            return Err(AnalyzerError::InvalidUrl(
                "Please enter a valid Amazon URL".to_string(),
            ));
        }

        let url = Url::parse(raw)
            .map_err(|e| AnalyzerError::InvalidUrl(format!("Invalid URL '{}': {}", raw, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AnalyzerError::InvalidUrl(format!(
                "Unsupported URL scheme: {}",
                url.scheme()
            )));
        }

        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Product identifier from `/dp/<ASIN>`, `/gp/product/<ASIN>` or
    /// `/product-reviews/<ASIN>` paths, falling back to an `ASIN` query pair.
    pub fn asin(&self) -> Option<String> {
        let segments: Vec<&str> = self.url.path_segments()?.filter(|s| !s.is_empty()).collect();
        let from_path = segments.windows(2).find_map(|pair| match pair {
            ["dp", id] | ["product", id] | ["product-reviews", id] => Some(id.to_string()),
            _ => None,
        });

        from_path.or_else(|| {
            self.url
                .query_pairs()
                .find(|(k, _)| k == "ASIN")
                .map(|(_, v)| v.into_owned())
        })
    }

    /// Review listing URL: the product segment swapped for the reviews
    /// segment, with the product page's query and fragment dropped.
    pub fn listing_url(&self) -> Url {
        let mut listing = self.url.clone();
        let path = listing.path().replacen(PRODUCT_SEGMENT, REVIEWS_SEGMENT, 1);
        listing.set_path(&path);
        listing.set_query(None);
        listing.set_fragment(None);
        listing
    }

    /// Listing URL for a 1-based review page.
    pub fn page_url(&self, page: u32) -> String {
        let mut url = self.listing_url();
        url.query_pairs_mut().append_pair("pageNumber", &page.to_string());
        url.to_string()
    }
}

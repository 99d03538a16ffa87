//! One analysis run: session → product snapshot → reviews → summary.

use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::fetcher::{HttpImageDownloader, ImageDownloader, PageFetcher};
use crate::narrative;
use crate::product_url::ProductUrl;
use crate::review::ReviewRecord;
use crate::session::{ChromeLauncher, SessionLauncher, SessionManager};

/// Payload returned for every analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AnalysisResult {
    Success {
        summary: String,
        /// Base64-encoded product image
        image: Option<String>,
        total_reviews: usize,
        average_rating: Option<f64>,
    },
    Failure {
        error: String,
    },
}

impl AnalysisResult {
    pub fn success(summary: String, image: Option<String>, reviews: &[ReviewRecord]) -> Self {
        let average_rating = (!reviews.is_empty())
            .then(|| reviews.iter().map(ReviewRecord::rating).sum::<f64>() / reviews.len() as f64);

        AnalysisResult::Success {
            summary,
            image,
            total_reviews: reviews.len(),
            average_rating,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        AnalysisResult::Failure {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AnalysisResult::Failure { .. })
    }
}

/// Runs the full pipeline. Every call builds and owns its own browser
/// session, so concurrent analyses never share navigation state.
pub struct ReviewAnalyzer<L = ChromeLauncher, D = HttpImageDownloader> {
    config: AnalyzerConfig,
    launcher: L,
    downloader: D,
}

impl ReviewAnalyzer {
    /// Headless Chrome + HTTP image download, as configured.
    pub fn from_config(config: AnalyzerConfig) -> Self {
        let launcher = ChromeLauncher::new(config.chrome_path.clone());
        let downloader = HttpImageDownloader {
            timeout: config.image_fetch_timeout,
        };
        Self::new(config, launcher, downloader)
    }
}

impl<L: SessionLauncher, D: ImageDownloader> ReviewAnalyzer<L, D> {
    pub fn new(config: AnalyzerConfig, launcher: L, downloader: D) -> Self {
        Self {
            config,
            launcher,
            downloader,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, url: &str) -> AnalysisResult {
        self.analyze_with_cancel(url, CancellationToken::new())
    }

    /// Like [`analyze`](Self::analyze), stopping review pagination once
    /// `cancel` fires or the configured deadline passes.
    pub fn analyze_with_cancel(&self, url: &str, cancel: CancellationToken) -> AnalysisResult {
        let started = Instant::now();
        let span = info_span!("analysis", id = %Uuid::new_v4(), asin = tracing::field::Empty);
        let _guard = span.enter();
        info!("🚀 Starting analysis for URL: {}", url);

        let product = match ProductUrl::parse(url) {
            Ok(product) => product,
            Err(e) => {
                error!("❌ Rejected URL: {}", e);
                return AnalysisResult::failure(e.to_string());
            }
        };
        if let Some(asin) = product.asin() {
            span.record("asin", asin.as_str());
        }

        let mut fetcher = PageFetcher::new(&self.config).with_cancellation(cancel);
        if let Some(budget) = self.config.deadline {
            fetcher = fetcher.with_deadline(started + budget);
        }

        let mut sessions = SessionManager::new(&self.launcher, self.config.session_retry);
        let outcome = self.run(&mut sessions, &fetcher, &product);
        sessions.release();

        match outcome {
            Ok(result) => {
                info!("✅ Analysis finished in {:.1}s", started.elapsed().as_secs_f64());
                result
            }
            Err(e) => {
                error!("🔥 Analysis failed: {}", e);
                AnalysisResult::failure(e.to_string())
            }
        }
    }

    fn run(
        &self,
        sessions: &mut SessionManager<'_>,
        fetcher: &PageFetcher,
        product: &ProductUrl,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let session = sessions.acquire()?;

        info!("🖼️ Fetching product snapshot");
        let snapshot = fetcher.fetch_snapshot(session, product, &self.downloader);

        info!("📥 Fetching reviews");
        let reviews = fetcher.fetch_reviews(session, product);

        info!("📝 Generating summary from {} reviews", reviews.len());
        let summary = narrative::compose(&reviews, &snapshot.title);

        Ok(AnalysisResult::success(summary, snapshot.image, &reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{no_backoff, FakeSession, ScriptedLauncher};
    use std::cell::Cell;
    use std::rc::Rc;

    const PRODUCT: &str = "https://www.amazon.com/Acme-Blender/dp/B07XYZ1234";

    struct StaticImage(Option<Vec<u8>>);

    impl ImageDownloader for StaticImage {
        fn download(&self, _url: &str) -> anyhow::Result<Vec<u8>> {
            self.0.clone().ok_or_else(|| anyhow::anyhow!("connection reset"))
        }
    }

    fn config() -> AnalyzerConfig {
        AnalyzerConfig {
            session_retry: no_backoff(3),
            ..Default::default()
        }
    }

    fn review_html(body: &str, label: &str) -> String {
        format!(
            r#"<div data-hook="review" class="review"><i data-hook="review-star-rating">{label}</i><span data-hook="review-body">{body}</span></div>"#
        )
    }

    fn product_page() -> String {
        r#"<html><body><span id="productTitle">Acme Blender</span><img id="landingImage" src="https://img.example/a.jpg"></body></html>"#.to_string()
    }

    fn store(closes: Rc<Cell<u32>>, review_pages: Vec<String>) -> impl Fn() -> FakeSession {
        let product = ProductUrl::parse(PRODUCT).unwrap();
        move || {
            let mut session = FakeSession {
                close_calls: closes.clone(),
                ..Default::default()
            }
            .with_page(PRODUCT, &product_page());
            for (i, html) in review_pages.iter().enumerate() {
                session = session.with_page(&product.page_url(i as u32 + 1), html);
            }
            session
        }
    }

    #[test]
    fn test_successful_analysis() {
        let closes = Rc::new(Cell::new(0));
        let pages = vec![
            format!(
                "<html><body>{}{}</body></html>",
                review_html("Great product, I love it.", "5.0 out of 5 stars"),
                review_html("Excellent, wonderful blender.", "4.0 out of 5 stars"),
            ),
            format!(
                "<html><body>{}</body></html>",
                review_html("Terrible lid, I hate it.", "3.0 out of 5 stars")
            ),
        ];
        let launcher = ScriptedLauncher::new(1, store(closes.clone(), pages));
        let analyzer = ReviewAnalyzer::new(config(), launcher, StaticImage(Some(b"img".to_vec())));

        let result = analyzer.analyze(PRODUCT);
        let AnalysisResult::Success {
            summary,
            image,
            total_reviews,
            average_rating,
        } = result.clone()
        else {
            panic!("expected success, got {result:?}");
        };

        assert_eq!(total_reviews, 3);
        assert_eq!(average_rating, Some(4.0));
        assert_eq!(image.as_deref(), Some("aW1n"));
        assert!(summary.starts_with(
            "Based on a detailed analysis of 3 customer reviews, the Acme Blender has received generally positive reviews with an average rating of 4.0 out of 5 stars."
        ));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_no_reviews_message() {
        let closes = Rc::new(Cell::new(0));
        let launcher = ScriptedLauncher::new(0, store(closes.clone(), vec![]));
        let analyzer = ReviewAnalyzer::new(config(), launcher, StaticImage(None));

        assert_eq!(
            analyzer.analyze(PRODUCT),
            AnalysisResult::Success {
                summary: "No reviews found for analysis.".to_string(),
                image: None,
                total_reviews: 0,
                average_rating: None,
            }
        );
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_session_failure_is_reported() {
        let closes = Rc::new(Cell::new(0));
        let launcher = ScriptedLauncher::new(3, store(closes.clone(), vec![]));
        let analyzer = ReviewAnalyzer::new(config(), launcher, StaticImage(None));

        let result = analyzer.analyze(PRODUCT);
        assert_eq!(
            result,
            AnalysisResult::failure(
                "Failed to initialize browser session after 3 attempts: chrome failed to start"
            )
        );
        assert_eq!(closes.get(), 0);
    }

    #[test]
    fn test_rejected_url_never_launches() {
        let launcher = ScriptedLauncher::new(0, FakeSession::default);
        let analyzer = ReviewAnalyzer::new(config(), launcher, StaticImage(None));

        let result = analyzer.analyze("https://www.example.com/dp/B07XYZ1234");
        assert_eq!(result, AnalysisResult::failure("Please enter a valid Amazon URL"));
        assert_eq!(analyzer.launcher.launches.get(), 0);
    }

    #[test]
    fn test_cancelled_analysis_still_summarizes() {
        let closes = Rc::new(Cell::new(0));
        let launcher = ScriptedLauncher::new(0, store(closes.clone(), vec![]));
        let analyzer = ReviewAnalyzer::new(config(), launcher, StaticImage(None));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = analyzer.analyze_with_cancel(PRODUCT, cancel);
        assert!(!result.is_failure());
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_payload_shapes() {
        let ok = AnalysisResult::Success {
            summary: "s".to_string(),
            image: None,
            total_reviews: 0,
            average_rating: None,
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"summary": "s", "image": null, "total_reviews": 0, "average_rating": null})
        );
        assert_eq!(
            serde_json::to_value(AnalysisResult::failure("boom")).unwrap(),
            serde_json::json!({"error": "boom"})
        );
    }
}

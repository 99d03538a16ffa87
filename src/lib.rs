//! Review narrator: collects a product's customer reviews with Headless Chrome
//! and condenses them into a single deterministic narrative paragraph.
//!
//! Pipeline: `session` → `fetcher` → `sentiment` → `themes` → `narrative`,
//! sequenced by `analyzer`.

pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod narrative;
pub mod product_url;
pub mod review;
pub mod sentiment;
pub mod session;
pub mod themes;

pub use analyzer::{AnalysisResult, ReviewAnalyzer};
pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, SessionInitError};
pub use review::{ReviewRecord, Sentiment};

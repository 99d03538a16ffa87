//! Run one analysis from the command line and print the JSON payload.
//!
//! Usage: `analyze_url <product-url>`

use anyhow::anyhow;
use dotenv::dotenv;
use review_narrator::{AnalyzerConfig, ReviewAnalyzer};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let url = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: analyze_url <product-url>"))?;

    let analyzer = ReviewAnalyzer::from_config(AnalyzerConfig::from_env());
    let result = analyzer.analyze(&url);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}

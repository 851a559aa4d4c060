//! Crawler module for mirroring a wiki
//!
//! This module contains the core crawling logic, including:
//! - Asset fetching with retry logic
//! - Page transformation and link rewriting
//! - Nested bundle discovery in stylesheets and scripts
//! - The bounded work queue driving the crawl
//! - Overall crawl coordination

mod assets;
mod coordinator;
mod fetcher;
mod html;
mod redirect;
mod scheduler;
mod transform;
mod work;

pub use assets::{rewrite_nested_bundles, NestedRewrite};
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_asset, AssetBody, RetryPolicy};
pub use redirect::{redirect_document, write_redirect};
pub use scheduler::Scheduler;
pub use transform::{PageTransformer, TransformOutcome};
pub use work::{ContentKind, ItemOutcome, WorkItem};

pub use crate::output::CrawlReport;

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and wiki client
/// 2. Resolve the main page and write the `index.html` stub
/// 3. Crawl every reachable page and asset
/// 4. Return counts per final item state
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran to completion (individual items may have failed)
/// * `Err(MirrorError)` - Crawl could not start
pub async fn crawl(config: Config) -> Result<CrawlReport> {
    run_crawl(config).await
}

//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the crawl together:
//! - Resolving the main page through the wiki's system message
//! - Writing the module store artifact and the `index.html` stub
//! - Seeding and running the scheduler
//! - Processing each page and asset item
//! - Summarising the run

use crate::config::Config;
use crate::crawler::assets::rewrite_nested_bundles;
use crate::crawler::fetcher::{build_http_client, fetch_asset, AssetBody, RetryPolicy};
use crate::crawler::redirect::write_redirect;
use crate::crawler::scheduler::Scheduler;
use crate::crawler::transform::{PageTransformer, TransformOutcome};
use crate::crawler::work::{ContentKind, ItemOutcome, WorkItem};
use crate::naming::{
    canonical_title, is_excluded_title, local_path_for_asset, local_path_for_page, BundleKind,
    INDEX_PAGE,
};
use crate::output::{write_module_cache, CrawlReport, ExportWriter};
use crate::state::{CrawlState, ItemState};
use crate::wiki::WikiClient;
use crate::Result;
use chrono::Utc;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Log a progress line every this many finished items
const PROGRESS_INTERVAL: usize = 50;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    wiki: WikiClient,
    client: Client,
    writer: ExportWriter,
}

/// Everything a worker needs to process one item, shared for one run
struct CrawlContext {
    wiki: WikiClient,
    client: Client,
    writer: ExportWriter,
    transformer: PageTransformer,
    retry: RetryPolicy,
    excluded_namespaces: Vec<String>,
    processed: AtomicUsize,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawl configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MirrorError)` - Missing base URL or the HTTP client could not be built
    pub fn new(config: Config) -> Result<Self> {
        let base_url = config.site_url()?;
        let client = build_http_client(&config.fetcher)?;
        let wiki = WikiClient::new(client.clone(), base_url);
        let writer = ExportWriter::new(config.output.export_dir.clone());

        Ok(Self {
            config,
            wiki,
            client,
            writer,
        })
    }

    /// Runs the crawl to completion
    ///
    /// The `index.html` stub is written before the scheduler starts, so the
    /// export has an entry point even if the crawl is interrupted right away.
    /// Per-item failures are logged and counted; only failures before the
    /// scheduler starts are returned as errors.
    pub async fn run(&self) -> Result<CrawlReport> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        tracing::info!(
            base_url = %self.wiki.base_url(),
            export_dir = %self.writer.root().display(),
            concurrency = self.config.crawler.concurrency,
            "Starting crawl"
        );

        let main_page = self.resolve_main_page().await;
        let inject_module_cache = self.prepare_module_cache().await;

        write_redirect(&self.writer, INDEX_PAGE, &main_page).await?;

        let context = Arc::new(CrawlContext {
            wiki: self.wiki.clone(),
            client: self.client.clone(),
            writer: self.writer.clone(),
            transformer: PageTransformer::new(
                self.wiki.base_url(),
                &self.config.crawler.audio_extensions,
                inject_module_cache,
            )?,
            retry: RetryPolicy::from_config(&self.config.fetcher),
            excluded_namespaces: self.config.crawler.excluded_namespaces.clone(),
            processed: AtomicUsize::new(0),
        });

        let state = Arc::new(CrawlState::new());
        let mut scheduler = Scheduler::new(Arc::clone(&state), self.config.crawler.concurrency);
        scheduler.enqueue(WorkItem::page(&main_page));

        scheduler
            .run(move |item| {
                let context = Arc::clone(&context);
                async move { context.process(item).await }
            })
            .await;

        let report = CrawlReport::from_state(&state, started_at, start_time.elapsed());
        tracing::info!(
            total = report.total_items,
            written = report.count(ItemState::Written),
            redirected = report.count(ItemState::Redirected),
            excluded = report.count(ItemState::Excluded),
            failed = report.count(ItemState::Failed),
            elapsed_secs = report.elapsed.as_secs_f64(),
            "Crawl complete"
        );

        Ok(report)
    }

    /// Reads the main page title from the wiki's system message
    ///
    /// Falls back to the configured title when the message cannot be read.
    async fn resolve_main_page(&self) -> String {
        let message = &self.config.site.main_page_message;
        let fallback = canonical_title(&self.config.site.fallback_main_page);

        match self.wiki.fetch_raw_text(message).await {
            Ok(text) if !canonical_title(&text).is_empty() => {
                let title = canonical_title(&text);
                tracing::info!(main_page = %title, "Resolved main page");
                title
            }
            Ok(_) => {
                tracing::warn!(message = %message, fallback = %fallback, "Main page message is empty");
                fallback
            }
            Err(e) => {
                tracing::warn!(
                    message = %message,
                    fallback = %fallback,
                    error = %e,
                    "Could not resolve main page"
                );
                fallback
            }
        }
    }

    /// Writes the module store artifact if a captured blob is configured
    ///
    /// Returns true if pages should reference the artifact.
    async fn prepare_module_cache(&self) -> bool {
        let Some(source) = &self.config.output.module_cache_source else {
            return false;
        };

        match write_module_cache(&self.writer, source).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping module cache");
                false
            }
        }
    }
}

impl CrawlContext {
    async fn process(&self, item: WorkItem) -> Result<ItemOutcome> {
        let outcome = match item {
            WorkItem::Page { title } => self.process_page(&title).await,
            WorkItem::Asset { url, kind } => self.process_asset(&url, kind).await,
        };

        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if processed % PROGRESS_INTERVAL == 0 {
            tracing::info!("Progress: {} items processed", processed);
        }

        outcome
    }

    async fn process_page(&self, title: &str) -> Result<ItemOutcome> {
        if is_excluded_title(title, &self.excluded_namespaces) {
            tracing::debug!(title = %title, "Skipping page in excluded namespace");
            return Ok(ItemOutcome::done(ItemState::Excluded));
        }

        let html = self.wiki.fetch_rendered_html(title).await?;

        let outcome = self.transformer.transform(title, &html)?;
        tracing::debug!(
            title = %title,
            discovered = outcome.discovered().len(),
            "Transformed page"
        );

        match outcome {
            TransformOutcome::Redirect { target, discovered } => {
                write_redirect(&self.writer, title, &target).await?;
                Ok(ItemOutcome::new(ItemState::Redirected, discovered))
            }
            TransformOutcome::Content { html, discovered } => {
                self.writer.write(&local_path_for_page(title), html).await?;
                tracing::info!(title = %title, "Downloaded page");
                Ok(ItemOutcome::new(ItemState::Written, discovered))
            }
        }
    }

    async fn process_asset(&self, url: &Url, kind: ContentKind) -> Result<ItemOutcome> {
        let local_path = local_path_for_asset(url);

        let (contents, discovered) = match fetch_asset(&self.client, url, kind, &self.retry).await? {
            AssetBody::Text(text) => {
                // Stylesheets resolve url() against their own location;
                // scripts run in the context of the page at the export root.
                let from_dir = match BundleKind::for_url(url) {
                    BundleKind::Style => local_path.rsplit_once('/').map(|(dir, _)| dir),
                    _ => None,
                };
                let nested = rewrite_nested_bundles(&text, self.transformer.resolve_base(), from_dir);
                let discovered = nested
                    .discovered
                    .into_iter()
                    .map(|nested_url| {
                        let kind = ContentKind::for_bundle(&nested_url);
                        WorkItem::asset(nested_url, kind)
                    })
                    .collect();
                (nested.text.into_bytes(), discovered)
            }
            body @ AssetBody::Bytes(_) => (body.into_bytes(), Vec::new()),
        };

        self.writer.write(&local_path, contents).await?;
        tracing::info!(url = %url, path = %local_path, "Downloaded file");

        Ok(ItemOutcome::new(ItemState::Written, discovered))
    }
}

/// Builds a coordinator from `config` and runs one crawl
pub async fn run_crawl(config: Config) -> Result<CrawlReport> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run().await
}

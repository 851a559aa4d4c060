//! State module for tracking crawl progress
//!
//! This module provides the per-run bookkeeping shared by all workers.
//!
//! # Components
//!
//! - `ItemState`: Lifecycle of a single work item (queued, in flight, written, ...)
//! - `CrawlState`: Visited and completed sets for one crawl run
//! - `WorkKey`: Identity key used for deduplication

mod crawl_state;
mod item_state;

// Re-export main types
pub use crawl_state::{CrawlState, WorkKey};
pub use item_state::ItemState;

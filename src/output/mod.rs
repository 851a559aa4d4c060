//! Output module for the export tree and crawl reports
//!
//! This module handles:
//! - Writing pages and assets under the export root
//! - Producing the module store artifact
//! - Recording and printing crawl statistics

mod module_cache;
pub mod stats;
mod writer;

pub use module_cache::{module_cache_script, write_module_cache, MODULE_STORE_KEY};
pub use stats::{print_statistics, CrawlReport};
pub use writer::ExportWriter;

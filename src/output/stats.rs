//! Crawl statistics
//!
//! This module turns the final crawl bookkeeping into a report and prints it
//! in a formatted manner.

use crate::state::{CrawlState, ItemState, WorkKey};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Summary of one finished crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Total number of distinct work items enqueued
    pub total_items: usize,

    /// Count of items by final state
    pub items_by_state: HashMap<ItemState, usize>,

    /// Identities of the items that failed
    pub failed: Vec<WorkKey>,
}

impl CrawlReport {
    /// Builds a report from the state of a finished run
    pub fn from_state(state: &CrawlState, started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            started_at,
            elapsed,
            total_items: state.visited_count(),
            items_by_state: state.counts_by_state(),
            failed: state.keys_in_state(ItemState::Failed),
        }
    }

    /// Number of items that ended in `state`
    pub fn count(&self, state: ItemState) -> usize {
        self.items_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Non-zero state counts in lifecycle order
    pub fn state_lines(&self) -> Vec<(ItemState, usize)> {
        ItemState::all_states()
            .into_iter()
            .map(|state| (state, self.count(state)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Items written as content or redirect documents
    pub fn succeeded(&self) -> usize {
        self.items_by_state
            .iter()
            .filter(|(state, _)| state.is_success())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_statistics(report: &CrawlReport) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    println!("  Total items: {}", report.total_items);
    println!();

    println!("Items by State:");
    for (state, count) in report.state_lines() {
        let percentage = if report.total_items > 0 {
            (count as f64 / report.total_items as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if !report.failed.is_empty() {
        println!("Failed ({}):", report.failed.len());
        for key in &report.failed {
            println!("  - {}", key);
        }
        println!();
    }

    let succeeded = report.succeeded();
    let success_rate = if report.total_items > 0 {
        (succeeded as f64 / report.total_items as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} items written)",
        success_rate, succeeded, report.total_items
    );
}

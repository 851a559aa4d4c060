/// Item state definitions for tracking crawl progress
///
/// Every identity key moves through `Queued -> InFlight -> <terminal>`.
use std::fmt;

/// Represents the current state of a work item in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Active States =====
    /// Item has been enqueued and is waiting for a worker
    Queued,

    /// Item is currently being processed by a worker
    InFlight,

    // ===== Terminal Success States =====
    /// Page or asset was fetched and its file written
    Written,

    /// Page turned out to be an alias; a redirect document was written
    Redirected,

    // ===== Terminal Skip States =====
    /// Page lies in an excluded namespace - recorded but never fetched
    Excluded,

    // ===== Terminal Error States =====
    /// Fetch, parse or write failed; the failure was logged
    Failed,
}

impl ItemState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (item may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::InFlight)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written | Self::Redirected)
    }

    /// Short lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InFlight => "in_flight",
            Self::Written => "written",
            Self::Redirected => "redirected",
            Self::Excluded => "excluded",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible item states in lifecycle order
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::InFlight,
            Self::Written,
            Self::Redirected,
            Self::Excluded,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

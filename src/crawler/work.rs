use crate::naming::{canonical_title, BundleKind};
use crate::state::{ItemState, WorkKey};
use std::fmt;
use url::Url;

/// How an asset body is fetched and persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Written verbatim
    Binary,
    /// Decoded as text and scanned for nested bundle references
    Text,
}

impl ContentKind {
    /// How a response of the bundle endpoint is handled
    pub fn for_bundle(url: &Url) -> Self {
        if BundleKind::for_url(url).is_binary() {
            Self::Binary
        } else {
            Self::Text
        }
    }
}

/// One unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkItem {
    Page { title: String },
    Asset { url: Url, kind: ContentKind },
}

impl WorkItem {
    /// Creates a page item; the title is canonicalised
    pub fn page(title: &str) -> Self {
        Self::Page {
            title: canonical_title(title),
        }
    }

    pub fn asset(url: Url, kind: ContentKind) -> Self {
        Self::Asset { url, kind }
    }

    /// Deduplication key of this item
    pub fn key(&self) -> WorkKey {
        match self {
            Self::Page { title } => WorkKey::Page(title.clone()),
            Self::Asset { url, .. } => WorkKey::Asset(url.as_str().to_string()),
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page { title } => write!(f, "page '{}'", title),
            Self::Asset { url, .. } => write!(f, "asset {}", url),
        }
    }
}

/// What processing one item produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Final state of the processed item
    pub state: ItemState,
    /// New work found while processing it
    pub discovered: Vec<WorkItem>,
}

impl ItemOutcome {
    pub fn new(state: ItemState, discovered: Vec<WorkItem>) -> Self {
        Self { state, discovered }
    }

    /// Outcome with nothing discovered
    pub fn done(state: ItemState) -> Self {
        Self::new(state, Vec::new())
    }
}

//! Naming module for Wiki-Mirror
//!
//! Deterministic mapping from page titles and asset URLs to file paths under
//! the export root. Nothing here touches the filesystem: link rewriting calls
//! these functions to target a file before that file has been downloaded.

mod asset;
mod page;

pub use asset::{
    bundle_hash, is_bundle_url, local_path_for_asset, relative_href, BundleKind, BUNDLE_ENDPOINT,
};
pub use page::{
    canonical_title, local_path_for_page, page_href, sanitize_file_name, split_fragment,
    SAFE_SEQUENCE, UNSAFE_CHARS,
};

/// Title of the redirect stub written at the export root
pub const INDEX_PAGE: &str = "index";

/// Location of the module store artifact, relative to the export root
pub const MODULE_CACHE_PATH: &str = "scripts/wiki_data.js";

/// Returns true if a title lies in one of the excluded namespaces
///
/// Matching is an exact, case-sensitive `<namespace>:` prefix test on the
/// canonical title.
pub fn is_excluded_title(title: &str, excluded_namespaces: &[String]) -> bool {
    let title = canonical_title(title);
    excluded_namespaces.iter().any(|ns| {
        title
            .strip_prefix(ns.as_str())
            .map_or(false, |rest| rest.starts_with(':'))
    })
}

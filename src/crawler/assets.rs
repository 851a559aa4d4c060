//! Nested bundle references inside fetched stylesheets and scripts

use crate::naming::{is_bundle_url, local_path_for_asset, relative_href};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// A bundle endpoint call with its query string, optionally with scheme/host
/// and leading path. Parentheses and quotes are excluded so CSS `url(...)`
/// wrappers and string delimiters are left in place.
const NESTED_BUNDLE_PATTERN: &str =
    r"(?:(?:https?:)?//[-a-zA-Z0-9.:]+)?(?:/[-a-zA-Z0-9_.~%]*)*/?load\.php\?[-a-zA-Z0-9!@:%_+.~#?&/=,|]*";

fn nested_bundle_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(NESTED_BUNDLE_PATTERN).unwrap_or_else(|e| panic!("invalid bundle pattern: {}", e))
    })
}

/// Text with nested references rewritten, plus the bundles they pointed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedRewrite {
    pub text: String,
    /// Distinct bundle URLs in order of first occurrence
    pub discovered: Vec<Url>,
}

/// Rewrites same-site bundle references found in a text asset
///
/// Matches are resolved against `base_dir` (the wiki root, ending in `/`).
/// Foreign-origin matches are left as they are. `from_dir` is the directory of
/// the file being rewritten, relative to the export root.
pub fn rewrite_nested_bundles(text: &str, base_dir: &Url, from_dir: Option<&str>) -> NestedRewrite {
    let mut seen = HashSet::new();
    let mut discovered = Vec::new();

    let rewritten = nested_bundle_regex().replace_all(text, |caps: &Captures<'_>| {
        let matched = &caps[0];
        let url = match base_dir.join(matched) {
            Ok(url) if url.origin() == base_dir.origin() && is_bundle_url(&url) => url,
            _ => return matched.to_string(),
        };

        let href = relative_href(from_dir, &local_path_for_asset(&url));
        if seen.insert(url.as_str().to_string()) {
            discovered.push(url);
        }
        href
    });

    NestedRewrite {
        text: rewritten.into_owned(),
        discovered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://wiki.example.org/").unwrap()
    }

    #[test]
    fn test_css_import_rewritten() {
        let css = r#"@import url(/load.php?modules=ext.gadget&only=styles);body{}"#;
        let result = rewrite_nested_bundles(css, &base(), Some("styles"));

        let nested = Url::parse("https://wiki.example.org/load.php?modules=ext.gadget&only=styles").unwrap();
        assert_eq!(result.discovered, vec![nested.clone()]);
        assert_eq!(
            result.text,
            format!("@import url(../{});body{{}}", local_path_for_asset(&nested))
        );
    }

    #[test]
    fn test_script_reference_relative_to_root() {
        let js = r#"mw.loader.load("https://wiki.example.org/load.php?modules=jquery&only=scripts");"#;
        let result = rewrite_nested_bundles(js, &base(), None);

        let nested = Url::parse("https://wiki.example.org/load.php?modules=jquery&only=scripts").unwrap();
        assert_eq!(
            result.text,
            format!(r#"mw.loader.load("./{}");"#, local_path_for_asset(&nested))
        );
        assert!(!result.text.contains("wiki.example.org"));
    }

    #[test]
    fn test_duplicate_occurrences_discovered_once() {
        let css = "a{background:url(/load.php?modules=a)}b{background:url(/load.php?modules=a)}";
        let result = rewrite_nested_bundles(css, &base(), Some("styles"));

        assert_eq!(result.discovered.len(), 1);
        assert!(!result.text.contains("load.php"));
    }

    #[test]
    fn test_foreign_origin_untouched() {
        let js = r#"load("https://cdn.other.org/load.php?modules=x")"#;
        let result = rewrite_nested_bundles(js, &base(), None);

        assert!(result.discovered.is_empty());
        assert_eq!(result.text, js);
    }

    #[test]
    fn test_text_without_references_unchanged() {
        let css = "body{color:red}";
        let result = rewrite_nested_bundles(css, &base(), Some("styles"));
        assert_eq!(result.text, css);
        assert!(result.discovered.is_empty());
    }
}

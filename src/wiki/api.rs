//! Response shapes of the wiki's `api.php` revision query
//!
//! Requests are made with `formatversion=2`, where `pages` is a list and
//! `missing` is a boolean. Older wikis without multi-content revisions return
//! the text directly on the revision instead of under `slots.main`.

use crate::{MirrorError, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub query: Option<Query>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub info: String,
}

#[derive(Debug, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPage {
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
pub struct Revision {
    pub slots: Option<Slots>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Slots {
    pub main: Slot,
}

#[derive(Debug, Deserialize)]
pub struct Slot {
    pub content: Option<String>,
}

impl QueryResponse {
    /// Text of the latest revision of the first page in the response
    ///
    /// `requested` is the title asked for; messages about a returned page use
    /// the title the wiki normalised it to.
    pub fn into_content(self, requested: &str) -> Result<String> {
        if let Some(error) = self.error {
            return Err(MirrorError::Api(format!("{}: {}", error.code, error.info)));
        }

        let page = self
            .query
            .and_then(|query| query.pages.into_iter().next())
            .ok_or_else(|| MirrorError::Api(format!("No query result for '{}'", requested)))?;

        if page.missing {
            return Err(MirrorError::Api(format!("Page '{}' does not exist", page.title)));
        }
        page.latest_content()
            .map(str::to_string)
            .ok_or_else(|| MirrorError::Api(format!("Page '{}' has no revisions", page.title)))
    }
}

impl ApiPage {
    /// Content of the latest revision, from whichever field carries it
    pub fn latest_content(&self) -> Option<&str> {
        let revision = self.revisions.first()?;
        revision
            .slots
            .as_ref()
            .and_then(|slots| slots.main.content.as_deref())
            .or(revision.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot_content() {
        let body = r#"{"batchcomplete":true,"query":{"pages":[{"pageid":3,"ns":8,"title":"MediaWiki:Mainpage","revisions":[{"slots":{"main":{"contentmodel":"wikitext","contentformat":"text/x-wiki","content":"Home"}}}]}]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let pages = parsed.query.unwrap().pages;
        assert_eq!(pages[0].latest_content(), Some("Home"));
    }

    #[test]
    fn test_parse_legacy_content() {
        let body = r#"{"query":{"pages":[{"title":"MediaWiki:Mainpage","revisions":[{"content":"Start"}]}]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.query.unwrap().pages[0].latest_content(), Some("Start"));
    }

    #[test]
    fn test_parse_missing_page() {
        let body = r#"{"query":{"pages":[{"ns":8,"title":"MediaWiki:Mainpage","missing":true}]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let page = &parsed.query.unwrap().pages[0];
        assert!(page.missing);
        assert_eq!(page.latest_content(), None);
    }

    #[test]
    fn test_missing_page_reports_wiki_title() {
        let body = r#"{"query":{"normalized":[{"fromencoded":false,"from":"mediawiki:mainpage","to":"MediaWiki:Mainpage"}],"pages":[{"ns":8,"title":"MediaWiki:Mainpage","missing":true}]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        match parsed.into_content("mediawiki:mainpage") {
            Err(MirrorError::Api(message)) => {
                assert_eq!(message, "Page 'MediaWiki:Mainpage' does not exist")
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_content() {
        let body = r#"{"query":{"pages":[{"title":"MediaWiki:Mainpage","revisions":[{"slots":{"main":{"content":"Home"}}}]}]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_content("MediaWiki:Mainpage").unwrap(), "Home");
    }

    #[test]
    fn test_empty_query_is_error() {
        let parsed: QueryResponse = serde_json::from_str(r#"{"batchcomplete":true}"#).unwrap();
        assert!(matches!(parsed.into_content("X"), Err(MirrorError::Api(_))));
    }

    #[test]
    fn test_parse_error() {
        let body = r#"{"error":{"code":"badvalue","info":"Unrecognized value"}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.query.is_none());
        assert_eq!(parsed.error.unwrap().code, "badvalue");
    }
}

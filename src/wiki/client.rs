//! Wiki content client
//!
//! Reads rendered pages through `index.php` and raw wikitext through
//! `api.php`. Failures are returned to the caller untouched; page fetches are
//! never retried.

use crate::naming::canonical_title;
use crate::wiki::api::QueryResponse;
use crate::{MirrorError, Result};
use reqwest::Client;
use url::Url;

/// Client for the two wiki read endpoints
#[derive(Debug, Clone)]
pub struct WikiClient {
    client: Client,
    base_url: Url,
}

impl WikiClient {
    /// Creates a client for the wiki rooted at `base_url`
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Base URL of the wiki
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, script: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), script)
    }

    /// URL of the page render endpoint
    pub fn index_url(&self) -> String {
        self.endpoint("index.php")
    }

    /// URL of the read API
    pub fn api_url(&self) -> String {
        self.endpoint("api.php")
    }

    /// Fetches the fully rendered HTML of a page
    ///
    /// Uses `action=view` rather than `action=render`: only the full page
    /// carries the canonical link and the "redirected from" marker.
    pub async fn fetch_rendered_html(&self, title: &str) -> Result<String> {
        let title = canonical_title(title);
        let url = Url::parse_with_params(
            &self.index_url(),
            &[("title", title.as_str()), ("action", "view")],
        )?;

        tracing::debug!(title = %title, "Fetching rendered page");
        self.get_text(url).await
    }

    /// Fetches the raw wikitext of a page's latest revision
    pub async fn fetch_raw_text(&self, title: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.api_url(),
            &[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("titles", title),
                ("redirects", "1"),
                ("format", "json"),
                ("formatversion", "2"),
            ],
        )?;

        tracing::debug!(title = %title, "Fetching raw wikitext");
        let body = self.get_text(url).await?;
        let response: QueryResponse = serde_json::from_str(&body)?;
        response.into_content(title)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        let url_str = url.to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| MirrorError::Http {
                url: url_str.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| MirrorError::Http { url: url_str, source })
    }
}

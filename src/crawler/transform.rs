//! Page transformer
//!
//! Turns the rendered HTML of one wiki page into its offline form:
//! - Detects redirect pages and reports their target instead of content
//! - Points bundle stylesheets/scripts at `styles/` and `scripts/`
//! - Points intra-wiki links at local `.html` files
//! - Points same-site images and audio at mirrored local copies
//! - Strips the site origin from every other absolute same-site reference
//! - Optionally injects the module store script into `<head>`
//!
//! Every rewritten reference is reported back as a discovered work item.

use crate::crawler::html::Rewrites;
use crate::crawler::work::{ContentKind, WorkItem};
use crate::naming::{
    canonical_title, is_bundle_url, local_path_for_asset, page_href, relative_href,
    split_fragment, MODULE_CACHE_PATH,
};
use crate::{MirrorError, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Result of transforming one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// A regular page, rewritten and ready to be written
    Content {
        html: String,
        discovered: Vec<WorkItem>,
    },

    /// The page is an alias of `target`; no content should be written for it
    Redirect {
        target: String,
        discovered: Vec<WorkItem>,
    },
}

impl TransformOutcome {
    /// Work items found while transforming
    pub fn discovered(&self) -> &[WorkItem] {
        match self {
            Self::Content { discovered, .. } | Self::Redirect { discovered, .. } => discovered,
        }
    }
}

struct Selectors {
    redirected_from: Selector,
    canonical: Selector,
    bundles: Selector,
    anchors: Selector,
    references: Selector,
    images: Selector,
    media_sources: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            redirected_from: parse_selector(".mw-redirectedfrom")?,
            canonical: parse_selector(r#"link[rel="canonical"][href]"#)?,
            bundles: parse_selector(r#"link[rel="stylesheet"][href], script[src]"#)?,
            anchors: parse_selector("a[href]")?,
            references: parse_selector("[href], [src]")?,
            images: parse_selector("img")?,
            media_sources: parse_selector("audio[src], source[src]")?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| MirrorError::HtmlParse {
        title: selector.to_string(),
        message: format!("invalid selector: {:?}", e),
    })
}

/// Collects discovered work items in first-seen order without duplicates
#[derive(Default)]
struct Discoveries {
    seen: HashSet<WorkItem>,
    items: Vec<WorkItem>,
}

impl Discoveries {
    fn push(&mut self, item: WorkItem) {
        if self.seen.insert(item.clone()) {
            self.items.push(item);
        }
    }
}

/// Rewrites rendered wiki pages for offline viewing
pub struct PageTransformer {
    /// Base URL with a trailing slash, used to resolve references
    resolve_base: Url,
    /// Path prefix of page-view URLs, e.g. `/w/index.php/`
    page_prefix: String,
    /// Path of the page-view script, e.g. `/w/index.php`
    script_path: String,
    audio_extensions: Vec<String>,
    inject_module_cache: bool,
    selectors: Selectors,
}

impl PageTransformer {
    /// Creates a transformer for the wiki rooted at `base_url`
    pub fn new(
        base_url: &Url,
        audio_extensions: &[String],
        inject_module_cache: bool,
    ) -> Result<Self> {
        let mut resolve_base = base_url.clone();
        resolve_base.set_query(None);
        resolve_base.set_fragment(None);
        let dir = format!("{}/", resolve_base.path().trim_end_matches('/'));
        resolve_base.set_path(&dir);

        Ok(Self {
            page_prefix: format!("{}index.php/", dir),
            script_path: format!("{}index.php", dir),
            resolve_base,
            audio_extensions: audio_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            inject_module_cache,
            selectors: Selectors::new()?,
        })
    }

    /// Transforms the rendered HTML of page `title`
    ///
    /// A page carrying the "redirected from" marker and a canonical link is
    /// reported as a redirect and nothing else is rewritten. Otherwise all
    /// rewrite rules are collected, applied to the tree and the document is
    /// serialized once. Rules run from the most general to the most specific,
    /// so a local file target always beats a stripped origin.
    pub fn transform(&self, title: &str, html: &str) -> Result<TransformOutcome> {
        if html.trim().is_empty() {
            return Err(MirrorError::HtmlParse {
                title: title.to_string(),
                message: "empty document".to_string(),
            });
        }

        let mut document = Html::parse_document(html);

        if let Some(target) = self.redirect_target(&document) {
            tracing::debug!(title = %title, target = %target, "Page is a redirect");
            let (target_page, _) = split_fragment(&target);
            return Ok(TransformOutcome::Redirect {
                discovered: vec![WorkItem::page(target_page)],
                target,
            });
        }

        let mut rewrites = Rewrites::new();
        let mut discovered = Discoveries::default();

        self.strip_origin(&document, &mut rewrites);
        self.rewrite_bundles(&document, &mut rewrites, &mut discovered);
        self.rewrite_anchors(&document, &mut rewrites, &mut discovered);
        self.rewrite_canonical(&document, &mut rewrites);
        self.rewrite_media(&document, &mut rewrites, &mut discovered);

        if self.inject_module_cache {
            let src = format!("./{}", MODULE_CACHE_PATH);
            rewrites.prepend_to_head("script", &[("src", src.as_str())]);
        }

        tracing::trace!(title = %title, elements = rewrites.len(), "Applying rewrites");
        rewrites.apply(&mut document);

        Ok(TransformOutcome::Content {
            html: document.html(),
            discovered: discovered.items,
        })
    }

    /// Base URL with a trailing slash, against which references resolve
    pub fn resolve_base(&self) -> &Url {
        &self.resolve_base
    }

    /// Returns the title a page-view link points at, with its `#fragment`
    ///
    /// Same-origin links qualify in two shapes: `<base>/index.php/Title`
    /// without a query string, and `<base>/index.php?title=Title` whose query
    /// carries nothing but `title`, `oldid` and `action=view`. Returns `None`
    /// when the title is empty.
    pub fn page_link(&self, href: &str) -> Option<(String, String)> {
        let url = self.resolve(href)?;
        let title = match url.query() {
            None => {
                let encoded = url.path().strip_prefix(self.page_prefix.as_str())?;
                urlencoding::decode(encoded).ok()?.into_owned()
            }
            Some(_) => self.query_title(&url)?,
        };

        let title = canonical_title(&title);
        if title.is_empty() {
            return None;
        }

        let fragment = url.fragment().map(|f| format!("#{}", f)).unwrap_or_default();
        Some((title, fragment))
    }

    fn query_title(&self, url: &Url) -> Option<String> {
        if url.path() != self.script_path {
            return None;
        }

        let mut title = None;
        for (key, value) in url.query_pairs() {
            match (key.as_ref(), value.as_ref()) {
                ("title", name) => title = Some(name.to_string()),
                ("oldid", _) | ("action", "view") => {}
                _ => return None,
            }
        }
        title
    }

    /// Site-relative form of an absolute same-origin reference
    ///
    /// Relative references and other origins give `None`.
    fn site_relative(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if Url::parse(reference).is_err() && !reference.starts_with("//") {
            return None;
        }
        let url = self.resolve(reference)?;

        let mut local = url.path().to_string();
        if let Some(query) = url.query() {
            local.push('?');
            local.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            local.push('#');
            local.push_str(fragment);
        }
        Some(local)
    }

    fn resolve(&self, reference: &str) -> Option<Url> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        let url = self.resolve_base.join(reference).ok()?;
        if url.origin() != self.resolve_base.origin() {
            return None;
        }
        Some(url)
    }

    fn redirect_target(&self, document: &Html) -> Option<String> {
        document.select(&self.selectors.redirected_from).next()?;

        let href = document
            .select(&self.selectors.canonical)
            .next()?
            .value()
            .attr("href")?;

        // The canonical URL may sit on another host name than the base URL,
        // so only the part after the page-view script is used.
        let (_, encoded) = href.rsplit_once("/index.php/")?;
        let (encoded, fragment) = match encoded.split_once('#') {
            Some((path, fragment)) => (path, format!("#{}", fragment)),
            None => (encoded, String::new()),
        };
        let title = canonical_title(&urlencoding::decode(encoded).ok()?);
        if title.is_empty() {
            return None;
        }
        Some(format!("{}{}", title, fragment))
    }

    fn strip_origin(&self, document: &Html, rewrites: &mut Rewrites) {
        for element in document.select(&self.selectors.references) {
            for attr in ["href", "src"] {
                let Some(value) = element.value().attr(attr) else {
                    continue;
                };
                if let Some(local) = self.site_relative(value) {
                    rewrites.set(element.id(), attr, local);
                }
            }
        }
    }

    fn rewrite_bundles(&self, document: &Html, rewrites: &mut Rewrites, found: &mut Discoveries) {
        for element in document.select(&self.selectors.bundles) {
            let attr = if element.value().name() == "link" {
                "href"
            } else {
                "src"
            };
            let Some(url) = element.value().attr(attr).and_then(|v| self.resolve(v)) else {
                continue;
            };
            if !is_bundle_url(&url) {
                continue;
            }

            rewrites.set(element.id(), attr, relative_href(None, &local_path_for_asset(&url)));
            let kind = ContentKind::for_bundle(&url);
            found.push(WorkItem::asset(url, kind));
        }
    }

    fn rewrite_anchors(&self, document: &Html, rewrites: &mut Rewrites, found: &mut Discoveries) {
        for element in document.select(&self.selectors.anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            if let Some((title, fragment)) = self.page_link(href) {
                rewrites.set(element.id(), "href", page_href(&format!("{}{}", title, fragment)));
                found.push(WorkItem::page(&title));
            } else if let Some(url) = self.audio_link(href) {
                self.rewrite_binary(element, "href", url, rewrites, found);
            }
        }
    }

    fn rewrite_canonical(&self, document: &Html, rewrites: &mut Rewrites) {
        for element in document.select(&self.selectors.canonical) {
            if let Some((title, fragment)) = element.value().attr("href").and_then(|h| self.page_link(h)) {
                rewrites.set(element.id(), "href", page_href(&format!("{}{}", title, fragment)));
            }
        }
    }

    fn rewrite_media(&self, document: &Html, rewrites: &mut Rewrites, found: &mut Discoveries) {
        for element in document.select(&self.selectors.images) {
            // Responsive candidates would make the browser fetch remote variants
            rewrites.remove(element.id(), "srcset");

            if let Some(url) = element.value().attr("src").and_then(|v| self.media_url(v)) {
                self.rewrite_binary(element, "src", url, rewrites, found);
            }
        }

        for element in document.select(&self.selectors.media_sources) {
            if let Some(url) = element.value().attr("src").and_then(|v| self.media_url(v)) {
                self.rewrite_binary(element, "src", url, rewrites, found);
            }
        }
    }

    fn rewrite_binary(
        &self,
        element: ElementRef<'_>,
        attr: &str,
        url: Url,
        rewrites: &mut Rewrites,
        found: &mut Discoveries,
    ) {
        rewrites.set(element.id(), attr, relative_href(None, &local_path_for_asset(&url)));
        found.push(WorkItem::asset(url, ContentKind::Binary));
    }

    fn media_url(&self, src: &str) -> Option<Url> {
        let url = self.resolve(src)?;
        if is_bundle_url(&url) {
            return None;
        }
        Some(url)
    }

    fn audio_link(&self, href: &str) -> Option<Url> {
        let url = self.media_url(href)?;
        let extension = url.path().rsplit_once('.')?.1.to_ascii_lowercase();
        if self.audio_extensions.iter().any(|ext| *ext == extension) {
            Some(url)
        } else {
            None
        }
    }
}

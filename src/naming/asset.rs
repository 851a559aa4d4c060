use crate::naming::page::sanitize_file_name;
use url::Url;

/// Script name of the wiki's style/script aggregation endpoint
pub const BUNDLE_ENDPOINT: &str = "load.php";

/// Flavours of response served by the bundle endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    Style,
    Script,
    /// A single icon from an image module, rasterized unless `format=original`
    Image { vector: bool },
}

impl BundleKind {
    /// Derives the bundle flavour from its URL alone
    ///
    /// An `image=` parameter asks for one icon of an image module. Otherwise
    /// the endpoint serves CSS when asked for `only=styles`, and every other
    /// combination is JavaScript.
    pub fn for_url(url: &Url) -> Self {
        let mut styles = false;
        let mut image = false;
        let mut vector = false;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "image" => image = true,
                "format" => vector = value == "original",
                "only" => styles = value == "styles",
                _ => {}
            }
        }

        if image {
            Self::Image { vector }
        } else if styles {
            Self::Style
        } else {
            Self::Script
        }
    }

    /// Directory under the export root holding bundles of this kind
    pub fn dir(&self) -> &'static str {
        match self {
            Self::Style => "styles",
            Self::Script => "scripts",
            Self::Image { .. } => "icons",
        }
    }

    /// File extension of bundles of this kind
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Style => "css",
            Self::Script => "js",
            Self::Image { vector: true } => "svg",
            Self::Image { vector: false } => "png",
        }
    }

    /// True if the response must be stored byte for byte
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// Returns true if the URL addresses the bundle endpoint
pub fn is_bundle_url(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map_or(false, |last| last == BUNDLE_ENDPOINT)
}

/// Hex MD5 digest used to name bundles
pub fn bundle_hash(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Maps an asset URL to its file path relative to the export root
///
/// Bundle URLs become `styles/<md5>.css`, `scripts/<md5>.js` or, for single
/// icons, `icons/<md5>.png` / `icons/<md5>.svg`, hashed over the full URL so every query combination gets a stable, safe name. Any other
/// asset mirrors its decoded site path; empty, `.` and `..` segments are
/// dropped so the result never escapes the export root, and the query string
/// is ignored.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wiki_mirror::naming::local_path_for_asset;
///
/// let url = Url::parse("https://wiki.example.org/images/a/ab/Caf%C3%A9.png").unwrap();
/// assert_eq!(local_path_for_asset(&url), "images/a/ab/Café.png");
/// ```
pub fn local_path_for_asset(url: &Url) -> String {
    if is_bundle_url(url) {
        let kind = BundleKind::for_url(url);
        return format!(
            "{}/{}.{}",
            kind.dir(),
            bundle_hash(url.as_str()),
            kind.extension()
        );
    }

    let segments: Vec<String> = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter_map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            match decoded.as_str() {
                "" | "." | ".." => None,
                _ => Some(sanitize_file_name(&decoded)),
            }
        })
        .collect();

    if segments.is_empty() {
        return format!("files/{}", bundle_hash(url.as_str()));
    }
    segments.join("/")
}

/// Turns a local path into an `href` relative to a directory of the export
///
/// `from_dir` is the directory (relative to the export root) of the document
/// that will contain the reference; `None` means the export root itself.
/// Every path segment is percent-encoded.
pub fn relative_href(from_dir: Option<&str>, local_path: &str) -> String {
    let encoded = local_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    let depth = from_dir
        .map(|dir| dir.split('/').filter(|s| !s.is_empty()).count())
        .unwrap_or(0);

    if depth == 0 {
        format!("./{}", encoded)
    } else {
        format!("{}{}", "../".repeat(depth), encoded)
    }
}

/// Characters that cannot appear in a file name on common filesystems
pub const UNSAFE_CHARS: [char; 8] = ['/', ':', '*', '?', '"', '<', '>', '|'];

/// Replacement written in place of every unsafe character
pub const SAFE_SEQUENCE: &str = "__";

/// Canonicalises a page title the way the wiki spells it in URLs
///
/// Surrounding whitespace is dropped and inner spaces become underscores, so
/// `"Main Page"` (as returned by the API) and `Main_Page` (as found in links)
/// share one identity and one file.
pub fn canonical_title(title: &str) -> String {
    title.trim().replace(' ', "_")
}

/// Replaces filesystem-unsafe characters with [`SAFE_SEQUENCE`]
///
/// Distinct names that differ only in unsafe characters collapse to the same
/// result (`a:b` and `a/b` both become `a__b`). The mapping is still
/// deterministic, which is all link rewriting relies on.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if UNSAFE_CHARS.contains(&c) {
            out.push_str(SAFE_SEQUENCE);
        } else {
            out.push(c);
        }
    }
    out
}

/// Splits `Title#fragment` into the title and the `#fragment` suffix
pub fn split_fragment(title: &str) -> (&str, &str) {
    match title.find('#') {
        Some(idx) => title.split_at(idx),
        None => (title, ""),
    }
}

/// Maps a page title to its file path relative to the export root
///
/// Any `#fragment` suffix is kept unchanged after the `.html` extension.
///
/// # Examples
///
/// ```
/// use wiki_mirror::naming::local_path_for_page;
///
/// assert_eq!(local_path_for_page("Main Page"), "Main_Page.html");
/// assert_eq!(local_path_for_page("Help:Contents#Editing"), "Help__Contents.html#Editing");
/// ```
pub fn local_path_for_page(title: &str) -> String {
    let (name, fragment) = split_fragment(title);
    format!("{}.html{}", sanitize_file_name(&canonical_title(name)), fragment)
}

/// Returns the `href` value that points at a page's local file
///
/// The file name is percent-encoded so that characters such as `%` or spaces
/// survive relative URL resolution; the fragment is passed through as-is.
pub fn page_href(title: &str) -> String {
    let (name, fragment) = split_fragment(title);
    let file = format!("{}.html", sanitize_file_name(&canonical_title(name)));
    format!("./{}{}", urlencoding::encode(&file), fragment)
}

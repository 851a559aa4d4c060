//! Redirect documents for page aliases

use crate::naming::{local_path_for_page, page_href, split_fragment};
use crate::output::ExportWriter;
use crate::Result;

/// Builds a document that sends the viewer to the local copy of `to_title`
///
/// Carries a meta refresh, a script redirect and a plain link, so it works
/// with scripts or refresh disabled.
pub fn redirect_document(to_title: &str) -> String {
    let target = page_href(to_title);
    let (name, _) = split_fragment(to_title);

    let href = escape(&target);
    let title = escape(to_title);
    let label = escape(name);

    // JSON string literals are valid JavaScript; `</` is split so the value
    // cannot close the script element.
    let script_target = serde_json::Value::String(target)
        .to_string()
        .replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta http-equiv="X-UA-Compatible" content="IE=edge">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta http-equiv="refresh" content="0; url={href}">
    <title>{title}</title>
</head>
<body>
    <p>If you are not redirected automatically, follow this <a href="{href}">link to {label}</a>.</p>
    <script type="text/javascript">
        window.location.href = {script_target};
    </script>
</body>
</html>
"#
    )
}

/// Escapes text for use in element content and double-quoted attributes
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Writes the redirect document for `from_title` pointing at `to_title`
///
/// Always overwrites: the latest known target wins.
pub async fn write_redirect(writer: &ExportWriter, from_title: &str, to_title: &str) -> Result<()> {
    let path = local_path_for_page(from_title);
    writer.write(&path, redirect_document(to_title)).await?;
    tracing::info!(from = %from_title, to = %to_title, "Created redirect page");
    Ok(())
}

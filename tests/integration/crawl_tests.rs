//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a fake wiki (`api.php`, `index.php`,
//! `load.php` and `/images/...`) and run the full crawl cycle end-to-end into
//! a temporary export directory.

use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiki_mirror::config::Config;
use wiki_mirror::crawler::Coordinator;
use wiki_mirror::{crawl, local_path_for_asset, ItemState, MirrorError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock wiki
fn create_test_config(base_url: &str, export_dir: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = Some(base_url.to_string());
    config.crawler.concurrency = 3;
    config.fetcher.max_retries = 2;
    config.fetcher.retry_base_delay_ms = 10; // Very short for testing
    config.output.export_dir = export_dir.to_path_buf();
    config
}

async fn mount_main_page_message(server: &MockServer, title: &str) {
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("titles", "MediaWiki:Mainpage"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"batchcomplete":true,"query":{{"pages":[{{"ns":8,"title":"MediaWiki:Mainpage","revisions":[{{"slots":{{"main":{{"content":"{}"}}}}}}]}}]}}}}"#,
            title
        )))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, title: &str, html: String) {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("title", title))
        .and(query_param("action", "view"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html; charset=UTF-8"),
        )
        .mount(server)
        .await;
}

async fn mount_bundle(server: &MockServer, modules: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path("/load.php"))
        .and(query_param("modules", modules))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn home_html(base_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Home</title>
<link rel="canonical" href="{base}/index.php/Home">
<link rel="stylesheet" href="{base}/load.php?lang=en&amp;modules=site.styles&amp;only=styles">
<script async src="/load.php?lang=en&amp;modules=startup&amp;only=scripts"></script>
<link rel="EditURI" type="application/rsd+xml" href="{base}/api.php?action=rsd">
</head><body>
<a href="{base}/index.php/About">About</a>
<a href="/index.php/Start">Start</a>
<a href="/index.php/Special:Random">Random</a>
<a href="/index.php/Missing">Missing</a>
<img src="{base}/images/a/ab/Logo.png" srcset="{base}/images/thumb/a/ab/Logo.png/2x.png 2x" alt="Logo">
<a href="/images/5/5a/Theme.mp3">Theme</a>
<div class="printfooter">Retrieved from "<a dir="ltr" href="{base}/index.php?title=Home&amp;oldid=5">{base}/index.php?title=Home&amp;oldid=5</a>"</div>
</body></html>"#,
        base = base_url
    )
}

/// Mounts a small wiki: Home links to About, a redirect Start -> About, an
/// excluded special page, a missing page, bundles and media
async fn mount_wiki(server: &MockServer) {
    let base_url = server.uri();

    mount_main_page_message(server, "Home").await;
    mount_page(server, "Home", home_html(&base_url)).await;
    mount_page(
        server,
        "About",
        format!(
            r#"<!DOCTYPE html><html><head><title>About</title></head><body>
<p>See <a href="{}/index.php/Home#Intro">home</a>.</p></body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        server,
        "Start",
        format!(
            r#"<!DOCTYPE html><html><head><title>About</title>
<link rel="canonical" href="{}/index.php/About"></head><body>
<span class="mw-redirectedfrom">(Redirected from <a href="/index.php?title=Start&amp;redirect=no">Start</a>)</span>
</body></html>"#,
            base_url
        ),
    )
    .await;

    // Excluded namespace: must never be requested
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("title", "Special:Random"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(server)
        .await;

    mount_bundle(
        server,
        "site.styles",
        "@import url(/load.php?modules=ext.nested&only=styles);body{margin:0}",
    )
    .await;
    mount_bundle(server, "ext.nested", "p{color:red}").await;
    mount_bundle(
        server,
        "startup",
        r#"mw.loader.load("/load.php?modules=jquery&only=scripts");"#,
    )
    .await;
    mount_bundle(server, "jquery", "var jQuery={};").await;

    // The logo fails once before succeeding
    Mock::given(method("GET"))
        .and(path("/images/a/ab/Logo.png"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/a/ab/Logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/images/5/5a/Theme.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfb, 0x90]))
        .mount(server)
        .await;
}

fn read(dir: &Path, local_path: &str) -> String {
    std::fs::read_to_string(dir.join(local_path))
        .unwrap_or_else(|e| panic!("failed to read {}: {}", local_path, e))
}

fn asset_path(base_url: &str, reference: &str) -> String {
    local_path_for_asset(&Url::parse(&format!("{}{}", base_url, reference)).unwrap())
}

/// Collects every file under `root` keyed by its relative path
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, files);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                files.insert(relative, std::fs::read(&path).unwrap());
            }
        }
    }

    let mut files = BTreeMap::new();
    walk(root, root, &mut files);
    files
}

#[tokio::test]
async fn test_full_crawl_of_small_wiki() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_wiki(&mock_server).await;

    let export = TempDir::new().unwrap();
    let report = crawl(create_test_config(&base_url, export.path()))
        .await
        .expect("crawl should run to completion");
    let root = export.path();

    // Entry point redirects to the resolved main page
    let index = read(root, "index.html");
    assert!(index.contains(r#"content="0; url=./Home.html""#));
    assert!(index.contains(r#"window.location.href = "./Home.html";"#));

    // Home is fully localised
    let home = read(root, "Home.html");
    assert!(
        !home.contains(&format!(r#"="{}"#, base_url)),
        "remote reference left in Home.html"
    );
    assert!(home.contains(r#"<a dir="ltr" href="./Home.html">"#));
    assert!(home.contains(r#"<link rel="EditURI" type="application/rsd+xml" href="/api.php?action=rsd">"#));
    assert!(home.contains(r#"<a href="./About.html">"#));
    assert!(home.contains(r#"<a href="./Start.html">"#));
    assert!(home.contains(r#"<link rel="canonical" href="./Home.html">"#));
    assert!(home.contains(r#"<img src="./images/a/ab/Logo.png" alt="Logo">"#));
    assert!(home.contains(r#"<a href="./images/5/5a/Theme.mp3">"#));
    assert!(!home.contains("srcset"));
    assert!(!home.contains("wiki_data.js"));

    let styles = asset_path(&base_url, "/load.php?lang=en&modules=site.styles&only=styles");
    let startup = asset_path(&base_url, "/load.php?lang=en&modules=startup&only=scripts");
    assert!(home.contains(&format!(r#"href="./{}""#, styles)));
    assert!(home.contains(&format!(r#"src="./{}""#, startup)));

    // Pages reached through links
    let about = read(root, "About.html");
    assert!(about.contains(r#"<a href="./Home.html#Intro">"#));

    // Redirect page points at its target and carries no content
    let start = read(root, "Start.html");
    assert!(start.contains("url=./About.html"));
    assert!(!start.contains("mw-redirectedfrom"));

    // Excluded and missing pages are never written
    assert!(!root.join("Special__Random.html").exists());
    assert!(!root.join("Missing.html").exists());

    // Nested bundles are discovered and referenced locally
    let nested_css = asset_path(&base_url, "/load.php?modules=ext.nested&only=styles");
    let css = read(root, &styles);
    assert_eq!(css, format!("@import url(../{});body{{margin:0}}", nested_css));
    assert_eq!(read(root, &nested_css), "p{color:red}");

    let jquery = asset_path(&base_url, "/load.php?modules=jquery&only=scripts");
    let js = read(root, &startup);
    assert_eq!(js, format!(r#"mw.loader.load("./{}");"#, jquery));
    assert_eq!(read(root, &jquery), "var jQuery={};");

    // Binary assets, including one that needed a retry
    assert_eq!(
        std::fs::read(root.join("images/a/ab/Logo.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
    assert_eq!(
        std::fs::read(root.join("images/5/5a/Theme.mp3")).unwrap(),
        vec![0xff, 0xfb, 0x90]
    );

    // Home, About, Start, Special:Random, Missing + 4 bundles + 2 media files
    assert_eq!(report.total_items, 11);
    assert_eq!(report.count(ItemState::Written), 8);
    assert_eq!(report.count(ItemState::Redirected), 1);
    assert_eq!(report.count(ItemState::Excluded), 1);
    assert_eq!(report.count(ItemState::Failed), 1);
}

#[tokio::test]
async fn test_icon_bundle_saved_verbatim() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let icon_bytes = vec![137, 80, 78, 71, 13, 10, 26, 10, 255, 254, 0];

    mount_main_page_message(&mock_server, "Home").await;
    mount_page(
        &mock_server,
        "Home",
        r#"<html><head><link rel="stylesheet" href="/load.php?modules=skins.styles&amp;only=styles"></head><body></body></html>"#
            .to_string(),
    )
    .await;
    mount_bundle(
        &mock_server,
        "skins.styles",
        ".edit{background-image:url(/load.php?modules=skins.icons&image=edit&format=rasterized)}",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/load.php"))
        .and(query_param("modules", "skins.icons"))
        .and(query_param("image", "edit"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(icon_bytes.clone())
                .insert_header("content-type", "image/png"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let export = TempDir::new().unwrap();
    let report = crawl(create_test_config(&base_url, export.path()))
        .await
        .unwrap();
    let root = export.path();

    let icon = asset_path(&base_url, "/load.php?modules=skins.icons&image=edit&format=rasterized");
    assert!(icon.starts_with("icons/") && icon.ends_with(".png"));
    assert_eq!(std::fs::read(root.join(&icon)).unwrap(), icon_bytes);

    let styles = asset_path(&base_url, "/load.php?modules=skins.styles&only=styles");
    assert_eq!(
        read(root, &styles),
        format!(".edit{{background-image:url(../{})}}", icon)
    );
    assert_eq!(report.count(ItemState::Written), 3);
    assert_eq!(report.count(ItemState::Failed), 0);
}

#[tokio::test]
async fn test_page_render_failure_not_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_main_page_message(&mock_server, "Home").await;
    mount_page(
        &mock_server,
        "Home",
        r#"<html><head></head><body><a href="/index.php/Busy">Busy</a></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("title", "Busy"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let export = TempDir::new().unwrap();
    let report = crawl(create_test_config(&base_url, export.path()))
        .await
        .expect("crawl should finish despite the failed page");

    assert!(export.path().join("Home.html").exists());
    assert!(!export.path().join("Busy.html").exists());
    assert_eq!(report.count(ItemState::Written), 1);
    assert_eq!(report.count(ItemState::Failed), 1);
    assert_eq!(
        report.failed,
        vec![wiki_mirror::state::WorkKey::Page("Busy".to_string())]
    );
}

#[tokio::test]
async fn test_crawl_is_idempotent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_main_page_message(&mock_server, "Home").await;
    mount_page(&mock_server, "Home", home_html(&base_url)).await;
    Mock::given(method("GET"))
        .and(path("/load.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/a/ab/Logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&mock_server)
        .await;

    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    crawl(create_test_config(&base_url, first.path())).await.unwrap();
    crawl(create_test_config(&base_url, second.path())).await.unwrap();

    let first_files = snapshot(first.path());
    assert!(first_files.contains_key("Home.html"));
    assert_eq!(first_files, snapshot(second.path()));
}

#[tokio::test]
async fn test_main_page_fallback() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/api.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "Main_Page",
        "<html><head></head><body><p>Welcome</p></body></html>".to_string(),
    )
    .await;

    let export = TempDir::new().unwrap();
    let report = crawl(create_test_config(&base_url, export.path()))
        .await
        .unwrap();

    assert!(read(export.path(), "index.html").contains("url=./Main_Page.html"));
    assert!(read(export.path(), "Main_Page.html").contains("<p>Welcome</p>"));
    assert_eq!(report.count(ItemState::Written), 1);
}

#[tokio::test]
async fn test_asset_retries_exhausted() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_main_page_message(&mock_server, "Home").await;
    mount_page(
        &mock_server,
        "Home",
        r#"<html><head></head><body><img src="/images/broken.png"></body></html>"#.to_string(),
    )
    .await;

    // First attempt plus two retries
    Mock::given(method("GET"))
        .and(path("/images/broken.png"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let export = TempDir::new().unwrap();
    let report = crawl(create_test_config(&base_url, export.path()))
        .await
        .unwrap();

    assert!(export.path().join("Home.html").exists());
    assert!(!export.path().join("images/broken.png").exists());
    assert_eq!(report.count(ItemState::Written), 1);
    assert_eq!(report.count(ItemState::Failed), 1);
}

#[tokio::test]
async fn test_not_found_asset_is_not_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_main_page_message(&mock_server, "Home").await;
    mount_page(
        &mock_server,
        "Home",
        r#"<html><head></head><body><img src="/images/gone.png"></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/images/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let export = TempDir::new().unwrap();
    let report = crawl(create_test_config(&base_url, export.path()))
        .await
        .unwrap();

    assert_eq!(report.count(ItemState::Failed), 1);
}

#[tokio::test]
async fn test_module_cache_injected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_main_page_message(&mock_server, "Home").await;
    mount_page(
        &mock_server,
        "Home",
        "<html><head><title>Home</title></head><body></body></html>".to_string(),
    )
    .await;

    let work = TempDir::new().unwrap();
    let blob = work.path().join("module-store.json");
    std::fs::write(&blob, r#"{"items":{}}"#).unwrap();

    let export = work.path().join("export");
    let mut config = create_test_config(&base_url, &export);
    config.output.module_cache_source = Some(blob);
    crawl(config).await.unwrap();

    assert!(read(&export, "Home.html")
        .contains(r#"<head><script src="./scripts/wiki_data.js"></script><title>Home</title>"#));
    assert_eq!(
        read(&export, "scripts/wiki_data.js"),
        r#"localStorage.setItem('MediaWikiModuleStore:wiki_data', "{\"items\":{}}")"#
    );
}

#[test]
fn test_missing_base_url_is_config_error() {
    let export = TempDir::new().unwrap();
    let mut config = create_test_config("http://unused", export.path());
    config.site.base_url = None;

    let result = Coordinator::new(config);
    assert!(matches!(result, Err(MirrorError::Config(_))));
}

//! Index page rewriting
//!
//! Every `href="..."` on a package's simple-index page is pointed back at
//! this mirror as `/simple/<package>/<filename>`, and the original target
//! is recorded so the filename can be resolved later.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use super::filename::{encode_segment, extract_filename, METADATA_SUFFIX};
use super::table::PackageLinks;

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("href pattern is valid"));

/// Result of rewriting one index page
#[derive(Debug, Clone)]
pub struct RewrittenIndex {
    /// Page body with all links routed through the mirror
    pub body: String,
    /// Links discovered while rewriting
    pub links: PackageLinks,
}

/// Rewrite a package index page fetched from `page_url`
pub fn rewrite_index(package: &str, page_url: &Url, html: &str) -> RewrittenIndex {
    let mut links = PackageLinks::new();

    let body = HREF.replace_all(html, |caps: &Captures| {
        let href = &caps[1];
        let filename = extract_filename(href);

        match absolute_target(page_url, href) {
            Some(target) if filename.ends_with(METADATA_SUFFIX) => {
                links.record_metadata(&filename, &target)
            }
            Some(target) => links.record_artifact(&filename, &target),
            None => debug!("Skipping unresolvable link {}", href),
        }

        format!(
            r#"href="/simple/{}/{}""#,
            encode_segment(package),
            encode_segment(&filename)
        )
    });

    RewrittenIndex {
        body: body.into_owned(),
        links,
    }
}

/// Resolve an href against the page it came from, without fragment or query
fn absolute_target(page_url: &Url, href: &str) -> Option<Url> {
    let mut target = page_url.join(href).ok()?;
    target.set_fragment(None);
    target.set_query(None);
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <h1>Links for demo</h1>
    <a href="https://files.example/packages/ab/cd/demo-1.0-py3-none-any.whl#sha256=0123" data-requires-python="&gt;=3.8">demo-1.0-py3-none-any.whl</a><br/>
    <a href="../../packages/ef/01/demo-1.0.tar.gz#sha256=4567">demo-1.0.tar.gz</a><br/>
  </body>
</html>
"#;

    fn page_url() -> Url {
        Url::parse("https://index.example/simple/demo/").unwrap()
    }

    #[test]
    fn rewrites_links_to_local_routes() {
        let rewritten = rewrite_index("demo", &page_url(), DEMO_PAGE);

        let body = &rewritten.body;
        assert!(body.contains(r#"href="/simple/demo/demo-1.0-py3-none-any.whl""#));
        assert!(body.contains(r#"href="/simple/demo/demo-1.0.tar.gz""#));
        assert!(!body.contains("sha256="));
        assert!(!body.contains("files.example"));
        assert!(body.contains("<h1>Links for demo</h1>"));
    }

    #[test]
    fn records_artifact_and_metadata_entries() {
        let rewritten = rewrite_index("demo", &page_url(), DEMO_PAGE);
        let links = rewritten.links;

        assert_eq!(
            links.get("demo-1.0-py3-none-any.whl"),
            Some("https://files.example/packages/ab/cd/demo-1.0-py3-none-any.whl")
        );
        assert_eq!(
            links.get("demo-1.0-py3-none-any.whl.metadata"),
            Some("https://files.example/packages/ab/cd/demo-1.0-py3-none-any.whl.metadata")
        );
        assert_eq!(
            links.get("demo-1.0.tar.gz"),
            Some("https://index.example/packages/ef/01/demo-1.0.tar.gz")
        );
        assert_eq!(links.len(), 4);
    }

    #[test]
    fn metadata_href_records_only_itself() {
        let html = r#"<a href="https://files.example/p/demo-1.0.whl.metadata#sha256=aa">m</a>"#;
        let rewritten = rewrite_index("demo", &page_url(), html);

        assert_eq!(rewritten.links.len(), 1);
        assert_eq!(
            rewritten.links.get("demo-1.0.whl.metadata"),
            Some("https://files.example/p/demo-1.0.whl.metadata")
        );
        assert_eq!(
            rewritten.body,
            r#"<a href="/simple/demo/demo-1.0.whl.metadata">m</a>"#
        );
    }

    #[test]
    fn every_rewritten_href_resolves() {
        let rewritten = rewrite_index("demo", &page_url(), DEMO_PAGE);
        let prefix = "/simple/demo/";

        for caps in HREF.captures_iter(&rewritten.body) {
            let local = caps[1].strip_prefix(prefix).unwrap();
            assert!(rewritten.links.get(local).is_some(), "{local} unresolved");
        }
    }

    #[test]
    fn page_without_links_is_unchanged() {
        let html = "<html><body>No links here</body></html>";
        let rewritten = rewrite_index("demo", &page_url(), html);
        assert_eq!(rewritten.body, html);
        assert!(rewritten.links.is_empty());
    }
}

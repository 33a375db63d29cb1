// src/fetch/locator.rs
//
// The landing page marks the current dataset with a "badge" element; the
// dataset link is the nearest anchor preceding it in document order.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument};
use url::Url;

use super::get_text;
use crate::error::{PipelineError, Result};

static BADGE: Lazy<Selector> = Lazy::new(|| Selector::parse(".badge").expect("valid selector"));

/// Resolve the dataset URL from landing-page markup.
///
/// Relative hrefs are resolved against `base`.
pub fn locate_dataset_url(markup: &str, base: &Url) -> Result<Url> {
    let doc = Html::parse_document(markup);
    let badge = doc
        .select(&BADGE)
        .next()
        .ok_or_else(|| PipelineError::layout("no badge element on landing page"))?;

    let mut anchor: Option<ElementRef> = None;
    for node in doc.root_element().descendants() {
        if node.id() == badge.id() {
            break;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == "a" {
                anchor = Some(el);
            }
        }
    }

    let anchor = anchor.ok_or_else(|| PipelineError::layout("no link precedes the badge"))?;
    let href = anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| PipelineError::layout("link preceding the badge has no href"))?;

    base.join(href)
        .map_err(|e| PipelineError::layout(format!("unresolvable dataset href {href:?}: {e}")))
}

/// Fetch the landing page and locate the current dataset URL.
#[instrument(level = "info", skip(client))]
pub async fn fetch_dataset_url(client: &Client, landing: &Url, timeout: Duration) -> Result<Url> {
    let markup = get_text(client, landing, timeout).await?;
    let url = locate_dataset_url(&markup, landing)?;
    info!(dataset_url = %url, "located dataset");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(super::super::LANDING_URL).unwrap()
    }

    #[test]
    fn test_resolves_link_before_badge() {
        let html = r#"
            <ul>
              <li><a href="/en/old-report.html">Week 30</a></li>
              <li><a href="/en/public-health/rvdss/week-31.html">Week 31</a> <span class="badge">New</span></li>
              <li><a href="/en/later.html">Archive</a></li>
            </ul>"#;
        let url = locate_dataset_url(html, &base()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.canada.ca/en/public-health/rvdss/week-31.html"
        );
    }

    #[test]
    fn test_badge_inside_link() {
        let html = r#"<p><a href="data.html">Latest <span class="label badge">new</span></a></p>"#;
        let url = locate_dataset_url(html, &Url::parse("https://host.example/a/b/").unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://host.example/a/b/data.html");
    }

    #[test]
    fn test_absolute_href_kept() {
        let html = r#"<a href="https://mirror.example/x.html">x</a><span class="badge"></span>"#;
        let url = locate_dataset_url(html, &base()).unwrap();
        assert_eq!(url.as_str(), "https://mirror.example/x.html");
    }

    #[test]
    fn test_missing_badge() {
        let err = locate_dataset_url("<a href='/x'>x</a>", &base()).unwrap_err();
        assert!(matches!(err, PipelineError::SourceLayoutChanged { .. }));
    }

    #[test]
    fn test_no_preceding_link() {
        let html = r#"<span class="badge">New</span><a href="/after.html">after</a>"#;
        let err = locate_dataset_url(html, &base()).unwrap_err();
        assert!(matches!(err, PipelineError::SourceLayoutChanged { .. }));
    }

    #[test]
    fn test_link_without_href() {
        let html = r#"<a name="top">top</a><span class="badge">New</span>"#;
        let err = locate_dataset_url(html, &base()).unwrap_err();
        assert!(matches!(err, PipelineError::SourceLayoutChanged { .. }));
    }
}

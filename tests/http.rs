//! Loads against a local HTTP server serving canned publisher responses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rvdss::fetch::{build_client, fetch_dataset_url, get_text};
use rvdss::schema::{Region, Variant};
use rvdss::{DatasetSource, HttpSource, PipelineError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Canned (status, body) per request path; unknown paths get a 404.
type Routes = HashMap<&'static str, (u16, String)>;

async fn serve(routes: Routes) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(respond(stream, Arc::clone(&routes)));
        }
    });
    addr
}

async fn respond(mut stream: TcpStream, routes: Arc<Routes>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let head = String::from_utf8_lossy(&request);
    let path = head.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = routes
        .get(path)
        .cloned()
        .unwrap_or((404, "not found".to_string()));
    let response = format!(
        "HTTP/1.1 {status} Canned\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn url(addr: SocketAddr, path: &str) -> Url {
    Url::parse(&format!("http://{addr}{path}")).unwrap()
}

fn landing_page(dataset_href: &str) -> String {
    format!(
        "<html><body><ul><li><a href='/archive.html'>Week 30</a></li>\
         <li><a href='{dataset_href}'>Week 31</a> <span class='badge'>New</span></li></ul></body></html>"
    )
}

fn html_table(labels: &[&str], row: &[&str]) -> String {
    let head: String = labels.iter().map(|l| format!("<th>{l}</th>")).collect();
    let cells: String = row.iter().map(|c| format!("<td>{c}</td>")).collect();
    format!("<table><thead><tr>{head}</tr></thead><tbody><tr>{cells}</tr></tbody></table>")
}

/// Preamble plus one Ontario-only table per virus, one week each.
fn ontario_dataset_document() -> String {
    let mut tables: Vec<String> = (0..4)
        .map(|i| format!("<table><tr><th>Summary {i}</th></tr></table>"))
        .collect();
    tables.push(html_table(
        &["Week end", "ON Tests", "SARS-CoV-2%.3"],
        &["2024-01-06", "200", "10"],
    ));
    tables.push(html_table(
        &["Week end", "ON Tests", "ON A%", "ON B%"],
        &["2024-01-06", "100", "6", "4"],
    ));
    for code in ["RSV", "HPIV", "ADV", "HMPV", "EV/RV", "HCoV"] {
        let pct = format!("{code}%.3");
        tables.push(html_table(
            &["Week end", "ON Tests", pct.as_str()],
            &["2024-01-06", "80", "2.5"],
        ));
    }
    format!("<html><body>{}</body></html>", tables.concat())
}

#[tokio::test]
async fn unavailable_publisher_is_a_transient_status_error() {
    let addr = serve(HashMap::from([("/landing.html", (503, "busy".to_string()))])).await;
    let client = build_client().unwrap();

    let err = get_text(&client, &url(addr, "/landing.html"), TIMEOUT)
        .await
        .unwrap_err();
    match &err {
        PipelineError::HttpStatus { status, url } => {
            assert_eq!(status.as_u16(), 503);
            assert!(url.ends_with("/landing.html"), "{url}");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn missing_page_is_not_transient() {
    let addr = serve(HashMap::new()).await;
    let client = build_client().unwrap();

    let err = get_text(&client, &url(addr, "/gone.html"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::HttpStatus { .. }), "{err}");
    assert!(!err.is_transient());
}

#[tokio::test]
async fn refused_connection_is_a_fetch_error() {
    // Take a free port, then close it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = build_client().unwrap();
    let err = get_text(&client, &url(addr, "/landing.html"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Fetch { .. }), "{err}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn landing_page_without_badge_fails_the_locator() {
    let page = "<html><body><a href='/data.html'>Week 31</a></body></html>".to_string();
    let addr = serve(HashMap::from([("/landing.html", (200, page))])).await;
    let client = build_client().unwrap();

    let err = fetch_dataset_url(&client, &url(addr, "/landing.html"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::SourceLayoutChanged { .. }), "{err}");
    assert!(err.to_string().contains("badge"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn http_source_loads_dataset_behind_badge() {
    let addr = serve(HashMap::from([
        ("/landing.html", (200, landing_page("/data.html"))),
        ("/data.html", (200, ontario_dataset_document())),
    ]))
    .await;

    let variant = Variant::SingleRegion(Region::On);
    let source = HttpSource::new(variant, TIMEOUT, TIMEOUT)
        .unwrap()
        .with_landing(url(addr, "/landing.html"));
    let dataset = source.load().await.unwrap();

    assert_eq!(dataset.source_url, url(addr, "/data.html"));
    assert_eq!(dataset.variant, variant);
    assert_eq!(dataset.records.len(), 9);
    assert!(dataset.records.iter().all(|r| r.region == Region::On));
    let flu_a = dataset
        .records
        .iter()
        .find(|r| r.virus == "Influenza A")
        .unwrap();
    assert_eq!(flu_a.cases_detected, Some(60.0));
}

#[tokio::test]
async fn http_source_surfaces_dataset_status() {
    let addr = serve(HashMap::from([
        ("/landing.html", (200, landing_page("/data.html"))),
        ("/data.html", (502, "bad gateway".to_string())),
    ]))
    .await;

    let source = HttpSource::new(Variant::MultiRegion, TIMEOUT, TIMEOUT)
        .unwrap()
        .with_landing(url(addr, "/landing.html"));
    let err = source.load().await.unwrap_err();
    assert!(
        matches!(&err, PipelineError::HttpStatus { url, .. } if url.ends_with("/data.html")),
        "{err}"
    );
    assert!(err.is_transient());
}

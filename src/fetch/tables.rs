// src/fetch/tables.rs

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use super::get_text;
use crate::error::Result;
use crate::process::RawTable;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static CAPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("caption").expect("valid selector"));

/// Upper bound on a single cell's span; guards against malformed markup.
const MAX_SPAN: usize = 1_000;

/// Every `<table>` in `markup`, in document order.
pub fn parse_tables(markup: &str) -> Vec<RawTable> {
    let doc = Html::parse_document(markup);
    doc.select(&TABLE).map(parse_table).collect()
}

/// Fetch the dataset document and extract its tables.
#[instrument(level = "info", skip(client))]
pub async fn fetch_tables(client: &Client, url: &Url, timeout: Duration) -> Result<Vec<RawTable>> {
    let markup = get_text(client, url, timeout).await?;
    let tables = parse_tables(&markup);
    info!(count = tables.len(), bytes = markup.len(), "parsed dataset tables");
    Ok(tables)
}

fn parse_table(table: ElementRef) -> RawTable {
    let caption = table
        .select(&CAPTION)
        .find(|c| belongs_to(*c, table))
        .map(normalize_text)
        .filter(|c| !c.is_empty());

    let rows: Vec<ElementRef> = table
        .select(&ROW)
        .filter(|r| belongs_to(*r, table))
        .collect();

    let head_rows: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| in_thead(**r))
        .map(|(i, _)| i)
        .collect();
    let header_at = match head_rows.last() {
        Some(&i) => Some(i),
        None => rows
            .first()
            .filter(|r| is_header_row(**r))
            .map(|_| 0),
    };

    let mut grid = expand_spans(&rows);
    let labels = match header_at {
        Some(i) => disambiguate(std::mem::take(&mut grid[i])),
        None => {
            let width = grid.iter().map(Vec::len).max().unwrap_or(0);
            (0..width).map(|i| i.to_string()).collect()
        }
    };

    let body: Vec<Vec<String>> = grid
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !head_rows.contains(i) && Some(*i) != header_at)
        .map(|(_, row)| row)
        .filter(|row| !row.is_empty())
        .collect();

    debug!(
        columns = labels.len(),
        rows = body.len(),
        caption = caption.as_deref().unwrap_or(""),
        "parsed table"
    );
    let table = RawTable::new(labels, body);
    match caption {
        Some(c) => table.with_caption(c),
        None => table,
    }
}

/// Lay out cells on a grid, repeating spanned cells the way a rendered
/// table shows them.
fn expand_spans(rows: &[ElementRef]) -> Vec<Vec<String>> {
    // column -> (text, rows still covered)
    let mut carried: HashMap<usize, (String, usize)> = HashMap::new();
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let mut out: Vec<String> = Vec::new();
        let mut cells = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .peekable();

        loop {
            let col = out.len();
            if let Some((text, left)) = carried.get_mut(&col) {
                out.push(text.clone());
                *left -= 1;
                if *left == 0 {
                    carried.remove(&col);
                }
                continue;
            }
            let Some(cell) = cells.next() else {
                if carried.keys().any(|&c| c > col) {
                    out.push(String::new());
                    continue;
                }
                break;
            };
            let text = normalize_text(cell);
            let colspan = span(cell, "colspan");
            let rowspan = span(cell, "rowspan");
            for _ in 0..colspan {
                if rowspan > 1 {
                    carried.insert(out.len(), (text.clone(), rowspan - 1));
                }
                out.push(text.clone());
            }
        }
        grid.push(out);
    }
    grid
}

fn span(cell: ElementRef, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// Repeated labels become `X`, `X.1`, `X.2`, ... in source order.
fn disambiguate(labels: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    labels
        .into_iter()
        .map(|label| {
            let n = seen.entry(label.clone()).or_insert(0);
            let out = if *n == 0 {
                label
            } else {
                format!("{label}.{n}")
            };
            *n += 1;
            out
        })
        .collect()
}

fn normalize_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `table` is the nearest enclosing table of `el`.
fn belongs_to(el: ElementRef, table: ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
        .is_some_and(|a| a.id() == table.id())
}

fn in_thead(row: ElementRef) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|a| a.value().name() != "table")
        .any(|a| a.value().name() == "thead")
}

fn is_header_row(row: ElementRef) -> bool {
    let mut cells = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .peekable();
    cells.peek().is_some() && cells.all(|c| c.value().name() == "th")
}

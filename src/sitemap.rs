use anyhow::{Context, Result};
use quick_xml::events::Event;
use tracing::{debug, info, warn};

use crate::net::{ensure_on_host, Fetcher};

/// Fetch the sitemap and return its on-host `<loc>` URLs, in document order,
/// that pass the existence probe (or all of them when `probe` is off).
pub async fn resolve<F: Fetcher + ?Sized>(
    fetcher: &F,
    host: &str,
    sitemap_url: &str,
    probe: bool,
) -> Result<Vec<String>> {
    ensure_on_host(sitemap_url, host)?;

    info!("Scanning {}", sitemap_url);
    let xml = fetcher
        .get(sitemap_url)
        .await
        .with_context(|| format!("Failed to fetch sitemap {}", sitemap_url))?;

    let locs = parse_locs(&xml).context("Failed to parse sitemap")?;
    info!("Total URLs in sitemap: {}", locs.len());

    let mut known = Vec::new();
    for url in locs {
        info!("{}", url);
        if let Err(e) = ensure_on_host(&url, host) {
            warn!("Skipping: {}", e);
            continue;
        }
        if probe && !fetcher.exists(&url).await {
            debug!("Probe failed, dropping {}", url);
            continue;
        }
        known.push(url);
    }

    info!("Reachable product pages: {}", known.len());
    Ok(known)
}

/// Every `<loc>` text value in document order, for both `urlset` and
/// `sitemapindex` documents.
fn parse_locs(xml: &str) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut loc: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                loc = Some(String::new());
            }
            Ok(Event::Text(e)) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                if let Some(text) = loc.take() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        urls.push(trimmed.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(urls)
}

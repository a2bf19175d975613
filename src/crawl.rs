use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::net::Fetcher;
use crate::parser::extract_product;
use crate::parser::rules::CompiledRules;
use crate::product::Product;

/// Visit counts returned alongside the records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    pub visited: usize,
    pub extracted: usize,
    pub no_identifier: usize,
    pub errors: usize,
}

/// Visit each URL in order, one at a time, and collect a record for every
/// page that carries an identifier. Per-page failures are logged and skipped.
pub async fn extract_all<F: Fetcher + ?Sized>(
    fetcher: &F,
    urls: &[String],
    rules: &CompiledRules,
) -> Result<(Vec<Product>, CrawlStats)> {
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut products = Vec::new();
    let mut stats = CrawlStats::default();

    for url in urls {
        pb.suspend(|| info!("Visiting {}", url));
        stats.visited += 1;

        match fetcher.get(url).await {
            Ok(html) => match extract_product(&html, url, rules) {
                Some(product) => {
                    stats.extracted += 1;
                    products.push(product);
                }
                None => {
                    stats.no_identifier += 1;
                    debug!("No product identifier on {}", url);
                }
            },
            Err(e) => {
                stats.errors += 1;
                pb.suspend(|| warn!("Skipping {}: {:#}", url, e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Visited {} pages ({} products, {} without identifier, {} errors)",
        stats.visited, stats.extracted, stats.no_identifier, stats.errors
    );

    Ok((products, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::testing::StaticFetcher;
    use crate::parser::rules::FieldRules;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn pages_without_identifier_are_skipped() {
        let fetcher = StaticFetcher::default()
            .with("https://www.beko.com/a", 200, &fixture("category"))
            .with("https://www.beko.com/b", 200, &fixture("product"));
        let rules = FieldRules::default().compile().unwrap();

        let (products, stats) = extract_all(
            &fetcher,
            &urls(&["https://www.beko.com/a", "https://www.beko.com/b"]),
            &rules,
        )
        .await
        .unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].source_url, "https://www.beko.com/b");
        assert_eq!(stats.no_identifier, 1);
        assert_eq!(stats.visited, 2);
    }

    #[tokio::test]
    async fn fetch_failures_do_not_stop_the_batch() {
        let fetcher = StaticFetcher::default()
            .with("https://www.beko.com/gone", 404, "")
            .with("https://www.beko.com/ok", 200, &fixture("product"));
        let rules = FieldRules::default().compile().unwrap();

        let (products, stats) = extract_all(
            &fetcher,
            &urls(&[
                "https://www.beko.com/gone",
                "https://www.beko.com/down",
                "https://www.beko.com/ok",
            ]),
            &rules,
        )
        .await
        .unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.extracted, 1);
    }

    #[tokio::test]
    async fn visits_in_input_order() {
        let page = |id: &str| {
            format!(r#"<section class="ProductInfo__root" data-product-id="{}"></section>"#, id)
        };
        let fetcher = StaticFetcher::default()
            .with("https://www.beko.com/3", 200, &page("C"))
            .with("https://www.beko.com/1", 200, &page("A"))
            .with("https://www.beko.com/2", 200, &page("B"));
        let rules = FieldRules::default().compile().unwrap();
        let order = urls(&[
            "https://www.beko.com/1",
            "https://www.beko.com/2",
            "https://www.beko.com/3",
        ]);

        let (products, _) = extract_all(&fetcher, &order, &rules).await.unwrap();

        let ids: Vec<&str> = products.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        let gets: Vec<String> = order.iter().map(|u| format!("GET {}", u)).collect();
        assert_eq!(fetcher.requested(), gets);
    }

    #[tokio::test]
    async fn empty_input_yields_nothing() {
        let fetcher = StaticFetcher::default();
        let rules = FieldRules::default().compile().unwrap();
        let (products, stats) = extract_all(&fetcher, &[], &rules).await.unwrap();
        assert!(products.is_empty());
        assert_eq!(stats, CrawlStats::default());
    }
}

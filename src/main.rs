mod config;
mod crawl;
mod error;
mod net;
mod output;
mod parser;
mod product;
mod sitemap;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::config::{Locale, Settings};
use crate::net::{Fetcher, HttpFetcher};
use crate::parser::rules::{CompiledRules, FieldRules};

#[derive(Parser)]
#[command(name = "beko_scraper", about = "Beko product sitemap scraper (JSON + CSV export)")]
struct Cli {
    /// Country and language code, e.g. us-en (prompted for when omitted)
    #[arg(short, long)]
    locale: Option<String>,
    /// Directory for products_<locale>.json/.csv [env: BEKO_OUTPUT_DIR]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Per-request timeout in seconds [env: BEKO_TIMEOUT_SECS]
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Visit every sitemap entry without probing it first
    #[arg(long)]
    no_probe: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout_secs = secs;
        }
        if self.no_probe {
            settings.probe = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    cli.apply(&mut settings);
    settings.normalize()?;

    let raw = match &cli.locale {
        Some(l) => l.clone(),
        None => crate::config::prompt_locale(io::stdin().lock(), io::stdout())?,
    };
    let locale = Locale::parse(&raw)?;

    let result = async {
        let fetcher = HttpFetcher::new(&settings)?;
        let rules = FieldRules::default().compile()?;
        run(&fetcher, &settings, &locale, &rules).await
    }
    .await;

    info!("Scraping took {}", format_duration(t0.elapsed()));

    let summary = result?;
    summary.print();
    Ok(())
}

struct Summary {
    candidates: usize,
    visited: usize,
    extracted: usize,
    unique: usize,
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
}

impl Summary {
    fn print(&self) {
        println!(
            "{} product URLs, {} visited, {} extracted, {} unique.",
            self.candidates, self.visited, self.extracted, self.unique
        );
        for path in [&self.json, &self.csv].into_iter().flatten() {
            println!("  -> {}", path.display());
        }
    }
}

/// Sitemap -> pages -> deduplicated JSON and CSV for one locale.
async fn run<F: Fetcher + ?Sized>(
    fetcher: &F,
    settings: &Settings,
    locale: &Locale,
    rules: &CompiledRules,
) -> Result<Summary> {
    let sitemap_url = locale.sitemap_url(&settings.host);
    let urls = sitemap::resolve(fetcher, &settings.host, &sitemap_url, settings.probe).await?;

    let (products, stats) = crawl::extract_all(fetcher, &urls, rules).await?;
    let unique = output::consolidate(products);

    let written = output::write_all(
        &settings.json_path(locale),
        &settings.csv_path(locale),
        &unique,
    )?;

    Ok(Summary {
        candidates: urls.len(),
        visited: stats.visited,
        extracted: stats.extracted,
        unique: unique.len(),
        json: written.json,
        csv: written.csv,
    })
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

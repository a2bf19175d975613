use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::error::ScrapeError;
use crate::net::validate_host;

pub const DEFAULT_HOST: &str = "www.beko.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_USER_AGENT: &str = concat!("beko_scraper/", env!("CARGO_PKG_VERSION"));
const ENV_PREFIX: &str = "BEKO";
const LOCALE_PATTERN: &str = r"^[a-z]{2,3}-[a-z]{2,3}$";

/// Runtime settings: built-in defaults, overridden by `BEKO_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub timeout_secs: u64,
    /// HEAD-probe each sitemap entry before visiting it.
    pub probe: bool,
    pub output_dir: PathBuf,
    pub user_agent: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("probe", true)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Lower-case the host once and reject settings no run can use.
    pub fn normalize(&mut self) -> Result<()> {
        self.host = validate_host(&self.host)?;
        if self.timeout_secs == 0 {
            bail!(ScrapeError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn json_path(&self, locale: &Locale) -> PathBuf {
        output_file(&self.output_dir, locale, "json")
    }

    pub fn csv_path(&self, locale: &Locale) -> PathBuf {
        output_file(&self.output_dir, locale, "csv")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            probe: true,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn output_file(dir: &Path, locale: &Locale, ext: &str) -> PathBuf {
    dir.join(format!("products_{}.{}", locale.as_str(), ext))
}

/// Country/language pair such as `us-en`, always lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(String);

impl Locale {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();
        let re = Regex::new(LOCALE_PATTERN)?;
        if !re.is_match(&normalized) {
            bail!(ScrapeError::InvalidLocale(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn sitemap_url(&self, host: &str) -> String {
        format!("https://{}/{}/sitemap-products.xml", host, self.0)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ask for a locale and read the first whitespace-delimited token.
pub fn prompt_locale<R: BufRead, W: Write>(mut input: R, mut out: W) -> Result<String> {
    write!(out, "Enter Country and Language code. e.g. us-en\n> ")?;
    out.flush()?;

    let mut line = String::new();
    loop {
        line.clear();
        let n = input
            .read_line(&mut line)
            .context("Failed to read locale from stdin")?;
        if n == 0 {
            bail!("No locale given on stdin");
        }
        if let Some(token) = line.split_whitespace().next() {
            return Ok(token.to_string());
        }
    }
}

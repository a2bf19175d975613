use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("locale {0:?} rejected: only <letters>-<letters> tokens such as us-en are used in URLs and output file names")]
    InvalidLocale(String),

    #[error("timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("invalid allowed host {0:?}")]
    InvalidHost(String),

    #[error("refusing to fetch {url}: host is not {allowed}")]
    OffHost { url: String, allowed: String },

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid selector {0:?}")]
    Selector(String),

    #[error("no output written: json and csv both failed")]
    NoOutput,
}

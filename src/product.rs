use serde::{Deserialize, Serialize};

/// One scraped product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "sku")]
    pub identifier: String,
    #[serde(rename = "marketingCode")]
    pub marketing_code: String,
    #[serde(rename = "computedTitle")]
    pub title: String,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "imageUrls", default)]
    pub image_urls: Vec<String>,
}

impl Product {
    /// CSV columns: identifier, marketing code, title, source URL.
    pub fn csv_row(&self) -> [&str; 4] {
        [
            self.identifier.as_str(),
            self.marketing_code.as_str(),
            self.title.as_str(),
            self.source_url.as_str(),
        ]
    }
}

use anyhow::Result;
use scraper::{Html, Selector};

use crate::error::ScrapeError;

/// How to read one field out of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Trimmed text content of the matched elements.
    Text { selector: String },
    /// Trimmed attribute value of the matched elements that carry it.
    Attr { selector: String, attr: String },
}

impl Rule {
    pub fn text(selector: &str) -> Self {
        Rule::Text {
            selector: selector.to_string(),
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Rule::Attr {
            selector: selector.to_string(),
            attr: attr.to_string(),
        }
    }

    fn compile(&self) -> Result<CompiledRule> {
        let (selector, attr) = match self {
            Rule::Text { selector } => (selector, None),
            Rule::Attr { selector, attr } => (selector, Some(attr.clone())),
        };
        let compiled =
            Selector::parse(selector).map_err(|_| ScrapeError::Selector(selector.clone()))?;
        Ok(CompiledRule {
            selector: compiled,
            attr,
        })
    }
}

/// Field name -> extraction rule for a product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRules {
    pub identifier: Rule,
    pub marketing_code: Rule,
    pub title: Rule,
    pub image_urls: Rule,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            identifier: Rule::attr("section.ProductInfo__root", "data-product-id"),
            marketing_code: Rule::text(".socialShare .pageTitle"),
            title: Rule::text("h1.ProductInfo__title"),
            image_urls: Rule::attr(".imgcontainer", "data-image-url"),
        }
    }
}

impl FieldRules {
    /// Parse every selector up front; a bad selector is a configuration error.
    pub fn compile(&self) -> Result<CompiledRules> {
        Ok(CompiledRules {
            identifier: self.identifier.compile()?,
            marketing_code: self.marketing_code.compile()?,
            title: self.title.compile()?,
            image_urls: self.image_urls.compile()?,
        })
    }
}

pub struct CompiledRule {
    selector: Selector,
    attr: Option<String>,
}

impl CompiledRule {
    /// Single value. Text rules join the text of every match, attribute
    /// rules read the first match only.
    pub fn value(&self, doc: &Html) -> String {
        match &self.attr {
            None => doc
                .select(&self.selector)
                .flat_map(|el| el.text())
                .collect::<String>()
                .trim()
                .to_string(),
            Some(attr) => doc
                .select(&self.selector)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
        }
    }

    /// One value per match, in document order.
    pub fn values(&self, doc: &Html) -> Vec<String> {
        let matches = doc.select(&self.selector);
        match &self.attr {
            None => matches
                .map(|el| el.text().collect::<String>().trim().to_string())
                .collect(),
            Some(attr) => matches
                .filter_map(|el| el.value().attr(attr))
                .map(|v| v.trim().to_string())
                .collect(),
        }
    }
}

pub struct CompiledRules {
    pub identifier: CompiledRule,
    pub marketing_code: CompiledRule,
    pub title: CompiledRule,
    pub image_urls: CompiledRule,
}

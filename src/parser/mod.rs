pub mod rules;

use scraper::Html;

use crate::product::Product;
use rules::CompiledRules;

/// Parse one product page. Returns `None` when the page has no identifier.
pub fn extract_product(html: &str, source_url: &str, rules: &CompiledRules) -> Option<Product> {
    let doc = Html::parse_document(html);

    let identifier = rules.identifier.value(&doc);
    if identifier.is_empty() {
        return None;
    }

    Some(Product {
        identifier,
        marketing_code: rules.marketing_code.value(&doc),
        title: rules.title.value(&doc),
        source_url: source_url.to_string(),
        image_urls: rules.image_urls.values(&doc),
    })
}

use anyhow::{anyhow, Result};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::models::{Chapter, ImageRecord};

/// Collects `(title, url)` for every chapter anchor in page order
/// (newest-first on the listing page). Relative hrefs are resolved
/// against `page_url`; anchors without an href are skipped.
pub fn parse_chapter_list(html: &str, selector: &str, page_url: &str) -> Result<Vec<Chapter>> {
    let selector = Selector::parse(selector)
        .map_err(|e| anyhow!("Invalid chapter selector '{}': {}", selector, e))?;
    let base = Url::parse(page_url)
        .map_err(|e| anyhow!("Invalid listing url '{}': {}", page_url, e))?;

    let document = Html::parse_document(html);
    let mut chapters = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let url = base
            .join(href.trim())
            .map_err(|e| anyhow!("Failed to join chapter url {}: {}", href, e))?;
        let title = element.text().collect::<String>().trim().to_string();
        chapters.push(Chapter::new(title, url.to_string()));
    }

    debug!("Parsed {} chapter links", chapters.len());
    Ok(chapters)
}

/// A zero natural width means the image server failed to deliver.
pub fn needs_alternate_server(images: &[ImageRecord]) -> bool {
    images.iter().any(|image| image.natural_width == 0)
}

//! Turns raw element snapshots into the final card sequence.

use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::browser::RawCard;
use crate::models::CardRecord;
use crate::parsers::extract;

/// Cards plus the tallies of what was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub cards: Vec<CardRecord>,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Build records from `raw` in discovery order.
///
/// Elements without a name or image are rejected. Later elements whose image
/// was already accepted are dropped. Ids are the 1-based position among the
/// accepted cards.
pub fn normalize(raw: &[RawCard], page_url: &str) -> Normalized {
    let base = Url::parse(page_url).ok();
    let mut seen_images = HashSet::new();
    let mut result = Normalized::default();

    for (index, element) in raw.iter().enumerate() {
        let Some(parsed) = extract(&element.alt) else {
            debug!("Element {} rejected: no name in {:?}", index, element.alt);
            result.rejected += 1;
            continue;
        };

        let Some(image) = resolve_image(&element.src, base.as_ref()) else {
            debug!("Element {} ({}) rejected: no image", index, parsed.name);
            result.rejected += 1;
            continue;
        };

        if !seen_images.insert(image.clone()) {
            debug!("Element {} ({}) duplicates image {}", index, parsed.name, image);
            result.duplicates += 1;
            continue;
        }

        let id = result.cards.len() as u32 + 1;
        result.cards.push(CardRecord::new(
            id,
            parsed.name,
            image,
            element.alt.clone(),
            parsed.colors,
        ));
    }

    result
}

/// Absolute form of an image `src`, resolved against the page when relative.
pub fn resolve_image(src: &str, base: Option<&Url>) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(src) {
        return Some(url.to_string());
    }
    base.and_then(|b| b.join(src).ok()).map(|u| u.to_string())
}

//! Detail page extractor

use tracing::trace;

use crate::dom::{Document, Node};
use crate::models::{Detail, Episode, Info, InfoLabel};

use super::normalize::{canonical_label, non_empty, split_genres};

/// Fill the fixed [`Info`] record from the `div.infozingle` block
///
/// Each row reads "Label: value". The label is canonicalized and matched
/// against [`InfoLabel`]; rows with unknown labels are dropped. The value
/// keeps everything after the first colon, so titles containing colons
/// survive intact.
pub fn extract_info<D: Document>(document: &D) -> Info {
    let mut info = Info::default();

    for row in document.select_all("div.infozingle > p") {
        let text = row
            .find_first("span")
            .map(|span| span.text())
            .unwrap_or_else(|| row.text());

        let Some((raw_label, raw_value)) = text.split_once(':') else {
            continue;
        };
        let label = canonical_label(raw_label);
        let Some(key) = InfoLabel::from_canonical(&label) else {
            trace!("Dropping unknown info label {:?}", label);
            continue;
        };

        if key == InfoLabel::Genre {
            info.genre = Some(split_genres(raw_value));
        } else if let Some(value) = non_empty(raw_value) {
            info.set(key, value);
        }
    }

    info
}

/// Episode links in page order
pub fn extract_episodes<D: Document>(document: &D) -> Vec<Episode> {
    document
        .select_all("div.episodelist > ul > li")
        .iter()
        .map(|li| Episode {
            title: li.find_text("a").unwrap_or_default(),
            url: li.find_attr("a", "href").unwrap_or_default(),
            date: li.find_text("span.zeebr").and_then(non_empty),
        })
        .collect()
}

/// Extract an anime detail page
pub fn extract_detail<D: Document>(document: &D) -> Detail {
    Detail {
        info: extract_info(document),
        episodes: extract_episodes(document),
    }
}

//! Listing extractors
//!
//! Map repeated list-item nodes into [`Post`], [`GenreEntry`] and
//! [`AnimeIndexGroup`] records. A missing child node only blanks its own
//! field; sibling items are always extracted, in document order.

use crate::dom::{Document, Node};
use crate::models::{AnimeIndexEntry, AnimeIndexGroup, GenreEntry, Post};

use super::normalize::{extract_int, non_empty, parse_float, split_genres};

/// Items of the ongoing and complete listings
const POST_ITEM: &str = "div.venz > ul > li";

/// Cover image, preferring the lazy-load attribute when `src` is absent
fn image_of<N: Node>(item: &N, css: &str) -> Option<String> {
    item.find_first(css).and_then(|img| {
        img.attr("src")
            .or_else(|| img.attr("data-src"))
            .and_then(non_empty)
    })
}

/// Fields shared by the ongoing and complete listings
fn parse_post<N: Node>(item: &N) -> Post {
    Post {
        title: item.find_text("h2").unwrap_or_default(),
        episodes: item.find_text("div.epz").and_then(|t| extract_int(&t)),
        date: item.find_text("div.newnime").and_then(non_empty),
        day: None,
        rating: None,
        image: image_of(item, "img"),
        url: item.find_attr("a", "href").unwrap_or_default(),
    }
}

/// Extract posts from an ongoing listing page, with their release weekday
pub fn extract_ongoing<D: Document>(document: &D) -> Vec<Post> {
    document
        .select_all(POST_ITEM)
        .iter()
        .map(|item| Post {
            day: item.find_text("div.epztipe").and_then(non_empty),
            ..parse_post(item)
        })
        .collect()
}

/// Extract posts from a complete listing page, with their score
pub fn extract_complete<D: Document>(document: &D) -> Vec<Post> {
    document
        .select_all(POST_ITEM)
        .iter()
        .map(|item| Post {
            rating: item.find_text("div.epztipe").and_then(|t| parse_float(&t)),
            ..parse_post(item)
        })
        .collect()
}

/// Extract entries from a genre listing page (`/genres/{slug}/page/{n}`)
pub fn extract_genre_page<D: Document>(document: &D) -> Vec<GenreEntry> {
    document
        .select_all("div.page > div.col-md-4")
        .iter()
        .map(|item| GenreEntry {
            title: item.find_text("div.col-anime-title > a").unwrap_or_default(),
            url: item
                .find_attr("div.col-anime-title > a", "href")
                .unwrap_or_default(),
            episodes: item
                .find_text("div.col-anime-eps")
                .and_then(|t| extract_int(&t)),
            date: item.find_text("div.col-anime-date").and_then(non_empty),
            rating: item
                .find_text("div.col-anime-rating")
                .and_then(|t| parse_float(&t)),
            image: image_of(item, "div.col-anime-cover > img"),
            studio: item.find_text("div.col-anime-studio").and_then(non_empty),
            genre: item
                .find_first("div.col-anime-genre")
                .map(|el| split_genres(&el.text())),
        })
        .collect()
}

/// Extract the flat list of genres from `/genre-list/`
pub fn extract_genre_list<D: Document>(document: &D) -> Vec<GenreEntry> {
    document
        .select_all("ul.genres > li > a")
        .iter()
        .map(|link| {
            GenreEntry::link(
                link.text().trim(),
                link.attr("href").unwrap_or_default(),
            )
        })
        .collect()
}

/// Extract the alphabetic anime index from `/anime-list/`
///
/// Groups keep their page order. Rows without an anime link are skipped and
/// a heading with no linked rows is left out.
pub fn extract_anime_index<D: Document>(document: &D) -> Vec<AnimeIndexGroup> {
    document
        .select_all("div#abtext > div.bariskelom")
        .iter()
        .filter_map(|group| {
            let items: Vec<AnimeIndexEntry> = group
                .find("div.penzbar")
                .iter()
                .filter_map(|row| row.find_first("a.hodebgst"))
                .map(|link| AnimeIndexEntry {
                    title: link.text().trim().to_string(),
                    url: link.attr("href").unwrap_or_default().to_string(),
                })
                .collect();

            if items.is_empty() {
                return None;
            }
            Some(AnimeIndexGroup {
                name: group.find_text("div.barispenz").unwrap_or_default(),
                items,
            })
        })
        .collect()
}

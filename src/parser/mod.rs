//! Parser module for extracting structured data from Otakudesu pages
//!
//! Each `parse_*` function takes the raw HTML of one page type and returns
//! typed records. Parsing is synchronous and never performs I/O; the
//! extractors in the submodules are written against [`crate::dom`] so they
//! can be exercised on any document implementation.

pub mod detail;
pub mod listing;
pub mod normalize;
pub mod pagination;
pub mod video;

use thiserror::Error;

use crate::dom::parse;
use crate::models::{AnimeIndexGroup, Detail, GenreEntry, PagedResult, Post, VideoData};

pub use detail::{extract_detail, extract_episodes, extract_info};
pub use listing::{
    extract_anime_index, extract_complete, extract_genre_list, extract_genre_page,
    extract_ongoing,
};
pub use pagination::extract_total_page;
pub use video::{
    classify_download, decode_mirror_key, extract_action_tokens, extract_downloads,
    extract_mirrors, extract_video, ActionTokens, MirrorDecodeError, MirrorKey,
};

/// Errors raised when a page or response does not have the expected shape
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed page: {0}")]
    MalformedPage(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Parse the ongoing listing (`/ongoing-anime/page/{n}`)
pub fn parse_ongoing(html: &str, page: u32) -> PagedResult<Post> {
    let document = parse(html);
    PagedResult::new(extract_ongoing(&document), page, extract_total_page(&document))
}

/// Parse the complete listing (`/complete-anime/page/{n}`)
pub fn parse_complete(html: &str, page: u32) -> PagedResult<Post> {
    let document = parse(html);
    PagedResult::new(extract_complete(&document), page, extract_total_page(&document))
}

/// Parse one page of a genre listing
pub fn parse_genre_page(html: &str, page: u32) -> PagedResult<GenreEntry> {
    let document = parse(html);
    PagedResult::new(
        extract_genre_page(&document),
        page,
        extract_total_page(&document),
    )
}

/// Parse `/genre-list/`
pub fn parse_genre_list(html: &str) -> Vec<GenreEntry> {
    extract_genre_list(&parse(html))
}

/// Parse `/anime-list/`
pub fn parse_anime_index(html: &str) -> Vec<AnimeIndexGroup> {
    extract_anime_index(&parse(html))
}

/// Parse an anime detail page
pub fn parse_detail(html: &str) -> Detail {
    extract_detail(&parse(html))
}

/// Parse an episode page
///
/// Fails with [`ExtractError::MalformedPage`] when the action tokens are
/// missing, since none of the mirrors could be requested without them.
pub fn parse_video(html: &str) -> Result<VideoData, ExtractError> {
    extract_video(&parse(html))
}

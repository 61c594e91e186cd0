//! Constants module for the Otakudesu scraper
//!
//! Contains the default site address and path builders for every page the
//! extractors understand. Paths are relative to the configured base URL.

/// Site used when `BASE_URL` is not configured
pub const DEFAULT_BASE_URL: &str = "https://otakudesu.cloud";

/// Path builder functions for all endpoints
pub mod endpoints {
    /// WordPress AJAX endpoint used by the nonce/mirror protocol
    pub const ADMIN_AJAX: &str = "/wp-admin/admin-ajax.php";

    /// Ongoing anime listing page
    pub fn ongoing(page: u32) -> String {
        format!("/ongoing-anime/page/{}", page)
    }

    /// Complete anime listing page
    pub fn complete(page: u32) -> String {
        format!("/complete-anime/page/{}", page)
    }

    /// Alphabetic anime index
    pub fn anime_list() -> String {
        "/anime-list/".to_string()
    }

    /// Flat genre list
    pub fn genre_list() -> String {
        "/genre-list/".to_string()
    }

    /// Page of a genre listing
    ///
    /// Accepts a bare slug (`"action"`), a path (`"/genres/action/"`) or a
    /// full URL as returned by the genre list.
    pub fn genre(genre: &str, page: u32) -> String {
        let genre = genre_slug(genre);
        if genre.contains('/') {
            format!("/{}/page/{}", genre, page)
        } else {
            format!("/genres/{}/page/{}", genre, page)
        }
    }

    /// Genre path without scheme, host and surrounding slashes; empty when nothing is left
    pub fn genre_slug(genre: &str) -> &str {
        let genre = genre.trim();
        let genre = match genre.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
            None => genre,
        };
        genre.trim_matches('/')
    }

    /// Join a site-relative path onto the base URL; absolute URLs pass through
    pub fn absolute(base_url: &str, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

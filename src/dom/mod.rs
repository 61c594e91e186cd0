//! Document tree adapter
//!
//! Extractors never touch a concrete HTML library. They are written against
//! the narrow [`Document`] / [`Node`] pair below, which the `scraper` crate
//! implements through [`Html`] and [`ElementRef`].

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Compiled selectors keyed by their CSS source. Invalid selectors cache as `None`.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Get or compile a CSS selector
///
/// Returns `None` for selectors that fail to parse, so a typo in a selector
/// degrades to "no match" instead of a panic.
pub fn selector(css: &str) -> Option<Selector> {
    if let Ok(cache) = SELECTOR_CACHE.read() {
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    if compiled.is_none() {
        tracing::warn!("Invalid CSS selector: {}", css);
    }
    if let Ok(mut cache) = SELECTOR_CACHE.write() {
        cache
            .entry(css.to_string())
            .or_insert_with(|| compiled.clone());
    }
    compiled
}

/// A parsed document that can be queried with CSS selectors
pub trait Document {
    type Element<'a>: Node
    where
        Self: 'a;

    /// All nodes matching `css`, in document order
    fn select_all<'a>(&'a self, css: &str) -> Vec<Self::Element<'a>>;

    /// First node matching `css`
    fn select_first<'a>(&'a self, css: &str) -> Option<Self::Element<'a>> {
        self.select_all(css).into_iter().next()
    }
}

/// A single element inside a [`Document`]
pub trait Node: Sized {
    /// Descendants matching `css`, in document order
    fn find(&self, css: &str) -> Vec<Self>;

    /// Concatenated text of the node and its descendants, untrimmed
    fn text(&self) -> String;

    /// Raw attribute value
    fn attr(&self, name: &str) -> Option<&str>;

    /// First descendant matching `css`
    fn find_first(&self, css: &str) -> Option<Self> {
        self.find(css).into_iter().next()
    }

    /// Trimmed text of the first descendant matching `css`
    fn find_text(&self, css: &str) -> Option<String> {
        self.find_first(css).map(|el| el.text().trim().to_string())
    }

    /// Attribute of the first descendant matching `css`
    fn find_attr(&self, css: &str, name: &str) -> Option<String> {
        self.find_first(css)
            .and_then(|el| el.attr(name).map(|s| s.to_string()))
    }
}

/// Parse a full HTML page
pub fn parse(html: &str) -> Html {
    Html::parse_document(html)
}

impl Document for Html {
    type Element<'a> = ElementRef<'a>;

    fn select_all<'a>(&'a self, css: &str) -> Vec<ElementRef<'a>> {
        match selector(css) {
            Some(sel) => Html::select(self, &sel).collect(),
            None => Vec::new(),
        }
    }
}

impl<'a> Node for ElementRef<'a> {
    fn find(&self, css: &str) -> Vec<Self> {
        match selector(css) {
            Some(sel) => ElementRef::select(self, &sel).collect(),
            None => Vec::new(),
        }
    }

    fn text(&self) -> String {
        ElementRef::text(self).collect::<String>()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }
}

//! Otakudesu Scraper Library
//!
//! This library extracts anime listings, detail pages, episode mirrors and
//! downloads from Otakudesu, resolves streaming mirrors through the site's
//! two-phase AJAX protocol, and exposes it all through REST API endpoints.

pub mod ajax;
pub mod client;
pub mod config;
pub mod constants;
pub mod dom;
pub mod error;
pub mod models;
pub mod parser;
pub mod routes;
pub mod scraper;

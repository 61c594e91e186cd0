//! Episode page extractor: embed iframe, streaming mirrors and downloads
//!
//! Mirror keys are base64-encoded JSON objects (`{"id":..,"i":..,"q":".."}`)
//! that only become requestable once paired with the two action tokens the
//! page's inline script passes to its AJAX calls. [`decode_mirror_key`] is
//! the single place that touches the obfuscated format.

use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::dom::{Document, Node};
use crate::models::{
    DownloadBuckets, DownloadFormat, DownloadLink, MirrorBuckets, MirrorDecodeFailure,
    MirrorPayload, NoiceRequest, ResolutionTier, VideoData, VideoMirror, VideoRequest,
};

use super::normalize::{canonical_format, non_empty};
use super::ExtractError;

static ACTION_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"action:"([^"]*)""#).unwrap());

/// Why a mirror key could not be turned into a request
#[derive(Debug, Error)]
pub enum MirrorDecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid mirror descriptor: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request parameters hidden inside a mirror key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MirrorKey {
    pub id: u64,
    pub i: u32,
    pub q: String,
}

impl MirrorKey {
    /// Attach the action token of the mirror request
    pub fn into_request(self, action: impl Into<String>) -> VideoRequest {
        VideoRequest {
            id: self.id,
            i: self.i,
            q: self.q,
            action: action.into(),
        }
    }
}

/// The two action tokens embedded in an episode page's inline script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTokens {
    /// First occurrence, used for the mirror request
    pub video: String,
    /// Second occurrence, used for the nonce request
    pub nonce: String,
}

/// Decode one base64 mirror key
pub fn decode_mirror_key(key: &str) -> Result<MirrorKey, MirrorDecodeError> {
    let bytes = STANDARD.decode(key.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Find the action tokens in script text, in document order
///
/// The page must carry at least two; anything less means the player
/// script changed shape and mirrors cannot be resolved.
pub fn extract_action_tokens<D: Document>(document: &D) -> Result<ActionTokens, ExtractError> {
    let mut found = document
        .select_all("script")
        .into_iter()
        .flat_map(|script| {
            ACTION_TOKEN
                .captures_iter(&script.text())
                .map(|cap| cap[1].to_string())
                .collect::<Vec<_>>()
        })
        .take(2);

    match (found.next(), found.next()) {
        (Some(video), Some(nonce)) => Ok(ActionTokens { video, nonce }),
        (first, _) => Err(ExtractError::MalformedPage(format!(
            "expected 2 action tokens in page script, found {}",
            usize::from(first.is_some())
        ))),
    }
}

/// Decode every mirror of every tier
///
/// A missing key or one that fails to decode drops only its own item; it is
/// returned in the failure list instead.
pub fn extract_mirrors<D: Document>(
    document: &D,
    tokens: &ActionTokens,
) -> (MirrorBuckets, Vec<MirrorDecodeFailure>) {
    let mut buckets = MirrorBuckets::default();
    let mut failures = Vec::new();

    for tier in ResolutionTier::ALL {
        let css = format!(
            "div#embed_holder > div.mirrorstream ul.{} > li",
            tier.list_class()
        );
        for item in document.select_all(&css) {
            let Some(link) = item.find_first("a") else {
                continue;
            };
            let provider = link.text().trim().to_string();
            let Some(key) = link.attr("data-content").map(str::to_string) else {
                warn!("Skipping mirror {} ({}): missing key", provider, tier.as_str());
                failures.push(MirrorDecodeFailure {
                    tier,
                    provider,
                    key: String::new(),
                    reason: "missing key".to_string(),
                });
                continue;
            };

            match decode_mirror_key(&key) {
                Ok(decoded) => buckets.bucket_mut(tier).push(VideoMirror {
                    payload: MirrorPayload {
                        noice: NoiceRequest {
                            action: tokens.nonce.clone(),
                        },
                        video: decoded.into_request(tokens.video.clone()),
                    },
                    key,
                    tier,
                    provider,
                }),
                Err(e) => {
                    warn!("Skipping mirror {} ({}): {}", provider, tier.as_str(), e);
                    failures.push(MirrorDecodeFailure {
                        tier,
                        provider,
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    (buckets, failures)
}

/// Classify a raw download label such as "MP4 720p"
pub fn classify_download(label: &str) -> Option<DownloadFormat> {
    DownloadFormat::from_tag(&canonical_format(label))
}

/// Download links grouped by format tag
///
/// Rows whose label matches no known tag are left out of every bucket.
pub fn extract_downloads<D: Document>(document: &D) -> DownloadBuckets {
    let mut buckets = DownloadBuckets::default();

    for row in document.select_all("div.download > ul li") {
        let label = row.find_text("strong").unwrap_or_default();
        let Some(format) = classify_download(&label) else {
            debug!("Unclassified download label {:?}", label);
            continue;
        };
        let size = row.find_text("i").and_then(non_empty);

        for link in row.find("a") {
            buckets.bucket_mut(format).push(DownloadLink {
                format,
                provider: link.text().trim().to_string(),
                url: link.attr("href").unwrap_or_default().to_string(),
                size: size.clone(),
            });
        }
    }

    buckets
}

/// Extract an episode page
pub fn extract_video<D: Document>(document: &D) -> Result<VideoData, ExtractError> {
    let tokens = extract_action_tokens(document)?;
    let (mirror, decode_errors) = extract_mirrors(document, &tokens);

    Ok(VideoData {
        url: document
            .select_first("div#embed_holder iframe")
            .and_then(|iframe| iframe.attr("src").and_then(non_empty)),
        mirror,
        downloads: extract_downloads(document),
        decode_errors,
    })
}

//! Data models for the Otakudesu scraper
//!
//! Every record produced by the extractors lives here, together with the
//! closed tag sets (resolution tiers and download formats) and the JSON
//! envelopes used by the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An anime entry from the ongoing or complete listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// From h2
    pub title: String,
    /// From div.epz, `None` when no number can be read
    pub episodes: Option<u32>,
    /// From div.newnime
    pub date: Option<String>,
    /// Release weekday, ongoing listing only (div.epztipe)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    /// Score, complete listing only (div.epztipe)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// From img src
    pub image: Option<String>,
    /// From a href
    pub url: String,
}

/// An anime entry from a genre page or the flat genre list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenreEntry {
    pub title: String,
    pub url: String,
    pub episodes: Option<u32>,
    pub date: Option<String>,
    pub rating: Option<f64>,
    pub image: Option<String>,
    pub studio: Option<String>,
    /// Genre tags, absent on the flat genre list
    pub genre: Option<Vec<String>>,
}

impl GenreEntry {
    /// Entry carrying only a title and url, as found on `/genre-list/`
    pub fn link(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            episodes: None,
            date: None,
            rating: None,
            image: None,
            studio: None,
            genre: None,
        }
    }
}

/// Labels recognized in the info block of a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoLabel {
    Title,
    Japanese,
    Score,
    Producer,
    Type,
    Status,
    TotalEpisode,
    Duration,
    ReleaseDate,
    Studio,
    Genre,
}

impl InfoLabel {
    /// Map a canonical label (see `parser::normalize::canonical_label`) to a known key
    ///
    /// The site labels its info block in Indonesian; the English spellings are
    /// accepted as well.
    pub fn from_canonical(label: &str) -> Option<Self> {
        let label = match label {
            "judul" | "title" => Self::Title,
            "japanese" => Self::Japanese,
            "skor" | "score" => Self::Score,
            "produser" | "producer" | "producers" => Self::Producer,
            "tipe" | "type" => Self::Type,
            "status" => Self::Status,
            "total_episode" | "total_episodes" => Self::TotalEpisode,
            "durasi" | "duration" => Self::Duration,
            "tanggal_rilis" | "release_date" => Self::ReleaseDate,
            "studio" | "studios" => Self::Studio,
            "genre" | "genres" => Self::Genre,
            _ => return None,
        };
        Some(label)
    }
}

/// Fixed-shape metadata of an anime detail page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// Judul
    pub title: Option<String>,
    pub japanese: Option<String>,
    /// Skor
    pub score: Option<String>,
    /// Produser
    pub producer: Option<String>,
    /// Tipe
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub status: Option<String>,
    pub total_episode: Option<String>,
    /// Durasi
    pub duration: Option<String>,
    /// Tanggal Rilis
    pub release_date: Option<String>,
    pub studio: Option<String>,
    /// Genre tags, split from the comma separated value
    pub genre: Option<Vec<String>>,
}

impl Info {
    /// Store a scalar value under a known label
    ///
    /// Genre values are handled by the caller, which splits them into tags.
    pub fn set(&mut self, label: InfoLabel, value: String) {
        let slot = match label {
            InfoLabel::Title => &mut self.title,
            InfoLabel::Japanese => &mut self.japanese,
            InfoLabel::Score => &mut self.score,
            InfoLabel::Producer => &mut self.producer,
            InfoLabel::Type => &mut self.anime_type,
            InfoLabel::Status => &mut self.status,
            InfoLabel::TotalEpisode => &mut self.total_episode,
            InfoLabel::Duration => &mut self.duration,
            InfoLabel::ReleaseDate => &mut self.release_date,
            InfoLabel::Studio => &mut self.studio,
            InfoLabel::Genre => {
                self.genre = Some(vec![value]);
                return;
            }
        };
        *slot = Some(value);
    }
}

/// An episode link from a detail page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// From a text
    pub title: String,
    /// From a href
    pub url: String,
    /// From span.zeebr
    pub date: Option<String>,
}

/// Everything extracted from an anime detail page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Detail {
    pub info: Info,
    /// Episodes in page order (newest first on the live site)
    pub episodes: Vec<Episode>,
}

/// One link of the alphabetic anime index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimeIndexEntry {
    pub title: String,
    pub url: String,
}

/// A heading of the alphabetic anime index with its entries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimeIndexGroup {
    /// From div.barispenz (usually a single letter or "#")
    pub name: String,
    pub items: Vec<AnimeIndexEntry>,
}

/// Uniform envelope for paginated listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub data: Vec<T>,
    /// Requested page
    pub page: u32,
    /// Highest page number in the pagination control, `None` when undeterminable
    pub total_page: Option<u32>,
    /// Number of items on this page
    pub total: usize,
}

impl<T> PagedResult<T> {
    pub fn new(data: Vec<T>, page: u32, total_page: Option<u32>) -> Self {
        let total = data.len();
        Self {
            data,
            page,
            total_page,
            total,
        }
    }
}

/// Playback quality of a streaming mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ResolutionTier {
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
}

impl ResolutionTier {
    pub const ALL: [ResolutionTier; 3] = [Self::P360, Self::P480, Self::P720];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P360 => "360p",
            Self::P480 => "480p",
            Self::P720 => "720p",
        }
    }

    /// Class of the `ul` holding this tier's mirrors on an episode page
    pub fn list_class(&self) -> &'static str {
        match self {
            Self::P360 => "m360p",
            Self::P480 => "m480p",
            Self::P720 => "m720p",
        }
    }
}

/// Container and resolution of a download link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum DownloadFormat {
    #[serde(rename = "mp4-360p")]
    Mp4P360,
    #[serde(rename = "mp4-480p")]
    Mp4P480,
    #[serde(rename = "mp4-720p")]
    Mp4P720,
    #[serde(rename = "mkv-480p")]
    MkvP480,
    #[serde(rename = "mkv-720p")]
    MkvP720,
    #[serde(rename = "mkv-1080p")]
    MkvP1080,
}

impl DownloadFormat {
    pub const ALL: [DownloadFormat; 6] = [
        Self::Mp4P360,
        Self::Mp4P480,
        Self::Mp4P720,
        Self::MkvP480,
        Self::MkvP720,
        Self::MkvP1080,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4P360 => "mp4-360p",
            Self::Mp4P480 => "mp4-480p",
            Self::Mp4P720 => "mp4-720p",
            Self::MkvP480 => "mkv-480p",
            Self::MkvP720 => "mkv-720p",
            Self::MkvP1080 => "mkv-1080p",
        }
    }

    /// Exact match against a normalized tag such as `"mp4-720p"`
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == tag)
    }
}

/// Form fields for the nonce request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NoiceRequest {
    pub action: String,
}

/// Form fields for the mirror request, minus the nonce
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct VideoRequest {
    pub id: u64,
    pub i: u32,
    pub q: String,
    pub action: String,
}

/// Both sub-requests needed to resolve one mirror
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct MirrorPayload {
    pub noice: NoiceRequest,
    pub video: VideoRequest,
}

/// A streaming mirror of an episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoMirror {
    /// Raw base64 value of the data-content attribute
    pub key: String,
    pub tier: ResolutionTier,
    /// Mirror host name shown on the page
    pub provider: String,
    pub payload: MirrorPayload,
}

/// A mirror item whose key could not be decoded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MirrorDecodeFailure {
    pub tier: ResolutionTier,
    pub provider: String,
    pub key: String,
    pub reason: String,
}

/// Mirrors grouped by resolution tier
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct MirrorBuckets {
    #[serde(rename = "360p")]
    pub p360: Vec<VideoMirror>,
    #[serde(rename = "480p")]
    pub p480: Vec<VideoMirror>,
    #[serde(rename = "720p")]
    pub p720: Vec<VideoMirror>,
}

impl MirrorBuckets {
    pub fn get(&self, tier: ResolutionTier) -> &[VideoMirror] {
        match tier {
            ResolutionTier::P360 => &self.p360,
            ResolutionTier::P480 => &self.p480,
            ResolutionTier::P720 => &self.p720,
        }
    }

    pub fn bucket_mut(&mut self, tier: ResolutionTier) -> &mut Vec<VideoMirror> {
        match tier {
            ResolutionTier::P360 => &mut self.p360,
            ResolutionTier::P480 => &mut self.p480,
            ResolutionTier::P720 => &mut self.p720,
        }
    }

    pub fn len(&self) -> usize {
        ResolutionTier::ALL.iter().map(|t| self.get(*t).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A download link of an episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub format: DownloadFormat,
    /// Host name from the anchor text
    pub provider: String,
    pub url: String,
    /// Human readable size, e.g. "52.3 MB"
    pub size: Option<String>,
}

/// Download links grouped by format tag; every tag is always present
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DownloadBuckets {
    #[serde(rename = "mp4-360p")]
    pub mp4_360p: Vec<DownloadLink>,
    #[serde(rename = "mp4-480p")]
    pub mp4_480p: Vec<DownloadLink>,
    #[serde(rename = "mp4-720p")]
    pub mp4_720p: Vec<DownloadLink>,
    #[serde(rename = "mkv-480p")]
    pub mkv_480p: Vec<DownloadLink>,
    #[serde(rename = "mkv-720p")]
    pub mkv_720p: Vec<DownloadLink>,
    #[serde(rename = "mkv-1080p")]
    pub mkv_1080p: Vec<DownloadLink>,
}

impl DownloadBuckets {
    pub fn get(&self, format: DownloadFormat) -> &[DownloadLink] {
        match format {
            DownloadFormat::Mp4P360 => &self.mp4_360p,
            DownloadFormat::Mp4P480 => &self.mp4_480p,
            DownloadFormat::Mp4P720 => &self.mp4_720p,
            DownloadFormat::MkvP480 => &self.mkv_480p,
            DownloadFormat::MkvP720 => &self.mkv_720p,
            DownloadFormat::MkvP1080 => &self.mkv_1080p,
        }
    }

    pub fn bucket_mut(&mut self, format: DownloadFormat) -> &mut Vec<DownloadLink> {
        match format {
            DownloadFormat::Mp4P360 => &mut self.mp4_360p,
            DownloadFormat::Mp4P480 => &mut self.mp4_480p,
            DownloadFormat::Mp4P720 => &mut self.mp4_720p,
            DownloadFormat::MkvP480 => &mut self.mkv_480p,
            DownloadFormat::MkvP720 => &mut self.mkv_720p,
            DownloadFormat::MkvP1080 => &mut self.mkv_1080p,
        }
    }

    pub fn len(&self) -> usize {
        DownloadFormat::ALL.iter().map(|f| self.get(*f).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything extracted from an episode page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoData {
    /// Default player iframe from div#embed_holder
    pub url: Option<String>,
    pub mirror: MirrorBuckets,
    pub downloads: DownloadBuckets,
    /// Mirror items skipped because their key did not decode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decode_errors: Vec<MirrorDecodeFailure>,
}

/// Generic API response wrapper for successful responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the operation was successful (always true for this type)
    pub success: bool,
    /// The response payload
    pub data: T,
    /// ISO timestamp of when data was fetched
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Create a new successful API response with the current timestamp
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Create a new successful API response with a custom timestamp
    pub fn with_timestamp(data: T, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            data,
            timestamp: timestamp.to_rfc3339(),
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Whether the operation was successful (always false for errors)
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    /// ISO timestamp of when the error occurred
    pub timestamp: String,
}

impl ApiError {
    /// Create a new API error response with the current timestamp
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

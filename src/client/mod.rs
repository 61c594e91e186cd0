//! High-level client for the Otakudesu site
//!
//! [`OtakudesuClient`] pairs a [`Transport`] with the parsers: every method
//! fetches one page (or, for mirror resolution, two AJAX responses) and
//! returns typed records. Fetching is async; parsing runs synchronously on
//! the fetched body.

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use crate::ajax::{response_data, AjaxForm, MirrorResolution};
use crate::config::Config;
use crate::constants::endpoints;
use crate::error::{AppError, AppResult};
use crate::models::{
    AnimeIndexGroup, Detail, GenreEntry, NoiceRequest, PagedResult, Post, VideoData,
    VideoMirror, VideoRequest,
};
use crate::parser;
use crate::scraper::{FetchOptions, RequestOverrides, Scraper, ScraperError, Transport};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Client for listing, detail, episode and mirror operations
pub struct OtakudesuClient<T = Scraper> {
    transport: T,
}

impl OtakudesuClient<Scraper> {
    /// Build a client on the reqwest transport from application config
    pub fn from_config(config: &Config) -> Result<Self, ScraperError> {
        Ok(Self::new(Scraper::with_config(config.scraper_config())?))
    }
}

impl<T: Transport> OtakudesuClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URL of a site path
    pub fn url_for(&self, path: &str) -> String {
        endpoints::absolute(self.transport.base_url(), path)
    }

    async fn get(&self, path: &str) -> AppResult<String> {
        Ok(self.transport.fetch(path, FetchOptions::default()).await?)
    }

    /// Ongoing anime, one listing page
    pub async fn ongoing(&self, page: u32) -> AppResult<PagedResult<Post>> {
        let page = check_page(page)?;
        let html = self.get(&endpoints::ongoing(page)).await?;
        let result = parser::parse_ongoing(&html, page);
        debug!("Parsed {} ongoing posts on page {}", result.total, page);
        Ok(result)
    }

    /// Completed anime, one listing page
    pub async fn complete(&self, page: u32) -> AppResult<PagedResult<Post>> {
        let page = check_page(page)?;
        let html = self.get(&endpoints::complete(page)).await?;
        let result = parser::parse_complete(&html, page);
        debug!("Parsed {} complete posts on page {}", result.total, page);
        Ok(result)
    }

    /// Anime detail page: info block and episode list
    pub async fn detail(&self, path: &str) -> AppResult<Detail> {
        let path = check_path(path)?;
        let html = self.get(path).await?;
        Ok(parser::parse_detail(&html))
    }

    /// Episode page: iframe, mirrors and downloads
    pub async fn video(&self, path: &str) -> AppResult<VideoData> {
        let path = check_path(path)?;
        let html = self.get(path).await?;
        Ok(parser::parse_video(&html)?)
    }

    /// Alphabetic anime index
    pub async fn anime_list(&self) -> AppResult<Vec<AnimeIndexGroup>> {
        let html = self.get(&endpoints::anime_list()).await?;
        Ok(parser::parse_anime_index(&html))
    }

    /// All genres, unpaginated
    pub async fn genres(&self) -> AppResult<Vec<GenreEntry>> {
        let html = self.get(&endpoints::genre_list()).await?;
        Ok(parser::parse_genre_list(&html))
    }

    /// One page of a genre listing; `genre` is a slug or a genre path
    pub async fn genre(&self, genre: &str, page: u32) -> AppResult<PagedResult<GenreEntry>> {
        let genre = endpoints::genre_slug(genre);
        if genre.is_empty() {
            return Err(AppError::validation("genre is required"));
        }
        let page = check_page(page)?;
        let html = self.get(&endpoints::genre(genre, page)).await?;
        Ok(parser::parse_genre_page(&html, page))
    }

    /// POST a form to admin-ajax.php with the episode page as referer
    ///
    /// Returns the `data` field of the JSON response, untouched.
    pub async fn send_payload(&self, referer_path: &str, form: &AjaxForm) -> AppResult<Value> {
        let options = FetchOptions {
            agent: None,
            overrides: RequestOverrides {
                method: Some(Method::POST),
                url: Some(self.url_for(endpoints::ADMIN_AJAX)),
                headers: vec![
                    ("content-type".to_string(), FORM_CONTENT_TYPE.to_string()),
                    ("x-requested-with".to_string(), "XMLHttpRequest".to_string()),
                    ("referer".to_string(), self.url_for(referer_path)),
                ],
                body: Some(form.encode()),
            },
        };

        let body = self.transport.fetch(endpoints::ADMIN_AJAX, options).await?;
        Ok(response_data(&body)?)
    }

    /// First phase: ask for a nonce
    pub async fn request_nonce(&self, referer_path: &str, request: &NoiceRequest) -> AppResult<Value> {
        self.send_payload(referer_path, &AjaxForm::nonce(request))
            .await
    }

    /// Second phase: ask for the mirror with a nonce from [`Self::request_nonce`]
    pub async fn request_mirror(
        &self,
        referer_path: &str,
        request: &VideoRequest,
        nonce: &str,
    ) -> AppResult<Value> {
        self.send_payload(referer_path, &AjaxForm::mirror(request, nonce))
            .await
    }

    /// Run both phases for one mirror of the episode at `episode_path`
    ///
    /// A fresh nonce is requested every time. The mirror response's `data`
    /// is returned as-is.
    pub async fn resolve_mirror(&self, episode_path: &str, mirror: &VideoMirror) -> AppResult<Value> {
        let episode_path = check_path(episode_path)?;
        let pending = MirrorResolution::start(episode_path, mirror.payload.clone());

        let nonce = self
            .send_payload(pending.referer(), &pending.nonce_form())
            .await?;
        let ready = pending.accept_nonce(nonce)?;

        let data = self
            .send_payload(ready.referer(), &ready.mirror_form())
            .await?;
        info!(
            "Resolved mirror {} ({}) for {}",
            mirror.provider,
            mirror.tier.as_str(),
            episode_path
        );
        Ok(data)
    }
}

fn check_page(page: u32) -> AppResult<u32> {
    if page == 0 {
        return Err(AppError::validation("page must be 1 or greater"));
    }
    Ok(page)
}

fn check_path(path: &str) -> AppResult<&str> {
    let path = path.trim();
    if path.is_empty() {
        return Err(AppError::validation("path is required"));
    }
    Ok(path)
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingTransport;
    use super::*;
    use crate::models::{MirrorPayload, ResolutionTier};
    use crate::parser::video::fixtures::episode_html;
    use serde_json::json;

    fn mirror() -> VideoMirror {
        VideoMirror {
            key: "eyJpZCI6MTU3ODEyLCJpIjowLCJxIjoiNzIwcCJ9".to_string(),
            tier: ResolutionTier::P720,
            provider: "filedon".to_string(),
            payload: MirrorPayload {
                noice: NoiceRequest {
                    action: "NONCE_ACTION".to_string(),
                },
                video: VideoRequest {
                    id: 157812,
                    i: 0,
                    q: "720p".to_string(),
                    action: "VIDEO_ACTION".to_string(),
                },
            },
        }
    }

    #[tokio::test]
    async fn test_ongoing_fetches_listing_path() {
        let transport = RecordingTransport::ok(&[
            r#"<div class="venz"><ul><li><a href="/anime/a/"><h2>A</h2></a></li></ul></div>"#,
        ]);
        let client = OtakudesuClient::new(transport);

        let result = client.ongoing(2).await.unwrap();
        assert_eq!(result.page, 2);
        assert_eq!(result.data[0].title, "A");

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/ongoing-anime/page/2");
        assert!(calls[0].options.overrides.method.is_none());
    }

    #[tokio::test]
    async fn test_complete_rejects_page_zero_without_fetching() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&[]));
        let err = client.complete(0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_detail_rejects_blank_path() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&[]));
        assert!(matches!(
            client.detail("   ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_genre_path_from_genre_list_url() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&["<html></html>"]));
        let result = client.genre("/genres/action/", 3).await.unwrap();
        assert!(result.data.is_empty());
        assert_eq!(client.transport().calls()[0].path, "/genres/action/page/3");
    }

    #[tokio::test]
    async fn test_genre_without_slug_is_rejected() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&[]));
        for genre in ["/", "https://otakudesu.cloud", "  "] {
            assert!(matches!(
                client.genre(genre, 1).await,
                Err(AppError::Validation(_))
            ));
        }
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_propagates_unmodified() {
        let client = OtakudesuClient::new(RecordingTransport::new(vec![Err(
            ScraperError::http(503, "Service Unavailable"),
        )]));
        match client.genres().await {
            Err(AppError::Scraping(ScraperError::HttpError { status, message })) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("expected scraping error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_video_parses_episode_page() {
        let html = episode_html();
        let client = OtakudesuClient::new(RecordingTransport::ok(&[html.as_str()]));
        let video = client.video("/episode/skf-episode-10-sub-indo/").await.unwrap();
        assert_eq!(video.mirror.len(), 4);
        assert_eq!(video.decode_errors.len(), 1);
    }

    #[tokio::test]
    async fn test_video_malformed_page() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&["<html></html>"]));
        assert!(matches!(
            client.video("/episode/x/").await,
            Err(AppError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn test_send_payload_request_shape() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&[r#"{"data":"abc"}"#]));
        let form = AjaxForm::Nonce {
            action: "NONCE_ACTION".to_string(),
        };

        let data = client.send_payload("/episode/x/", &form).await.unwrap();
        assert_eq!(data, json!("abc"));

        let call = &client.transport().calls()[0];
        assert_eq!(call.path, endpoints::ADMIN_AJAX);
        assert_eq!(call.options.overrides.method, Some(Method::POST));
        assert_eq!(
            call.options.overrides.url.as_deref(),
            Some("https://otakudesu.test/wp-admin/admin-ajax.php")
        );
        assert_eq!(call.options.overrides.body.as_deref(), Some("action=NONCE_ACTION"));
        assert_eq!(call.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(call.header("x-requested-with"), Some("XMLHttpRequest"));
        assert_eq!(call.header("referer"), Some("https://otakudesu.test/episode/x/"));
    }

    #[tokio::test]
    async fn test_resolve_mirror_runs_both_phases() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&[
            r#"{"data":"f00d+nonce"}"#,
            r#"{"data":"PGlmcmFtZSBzcmM9J3gnPg=="}"#,
        ]));

        let data = client.resolve_mirror("/episode/x/", &mirror()).await.unwrap();
        assert_eq!(data, json!("PGlmcmFtZSBzcmM9J3gnPg=="));

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].options.overrides.body.as_deref(),
            Some("action=NONCE_ACTION")
        );
        assert_eq!(
            calls[1].options.overrides.body.as_deref(),
            Some("id=157812&i=0&q=720p&nonce=f00d%2Bnonce&action=VIDEO_ACTION")
        );
        assert_eq!(calls[1].header("referer"), Some("https://otakudesu.test/episode/x/"));
    }

    #[tokio::test]
    async fn test_resolve_mirror_stops_on_non_string_nonce() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&[r#"{"data":0}"#]));
        let err = client.resolve_mirror("/episode/x/", &mirror()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(parser::ExtractError::UnexpectedResponse(_))
        ));
        assert_eq!(client.transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_mirror_stops_on_empty_nonce() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&[r#"{"data":""}"#]));
        let err = client.resolve_mirror("/episode/x/", &mirror()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(parser::ExtractError::UnexpectedResponse(_))
        ));
        assert_eq!(client.transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_request_mirror_uses_given_nonce() {
        let client = OtakudesuClient::new(RecordingTransport::ok(&[r#"{"data":{"ok":true}}"#]));
        let data = client
            .request_mirror("/episode/x/", &mirror().payload.video, "n1")
            .await
            .unwrap();
        assert_eq!(data, json!({"ok": true}));
        assert!(client.transport().calls()[0]
            .options
            .overrides
            .body
            .as_deref()
            .unwrap()
            .contains("nonce=n1"));
    }
}

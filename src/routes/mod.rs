//! API Routes module for the Otakudesu scraper API
//!
//! This module contains all HTTP route handlers for the public API endpoints.
//! Handlers only translate HTTP into [`OtakudesuClient`] calls; every page
//! is fetched live.

use actix_web::{web, HttpResponse, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::client::OtakudesuClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{
    AnimeIndexEntry, AnimeIndexGroup, ApiError, ApiResponse, Detail, DownloadBuckets,
    DownloadFormat, DownloadLink, Episode, GenreEntry, Info, MirrorBuckets, MirrorDecodeFailure,
    MirrorPayload, NoiceRequest, PagedResult, Post, ResolutionTier, VideoData, VideoMirror,
    VideoRequest,
};

/// Application state shared across handlers
pub struct AppState {
    pub client: OtakudesuClient,
    pub config: Config,
}

/// Query parameters for paginated listings
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<u32>,
}

/// Query parameters for detail and episode pages
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PathQuery {
    /// Site path or full URL of the page, e.g. "/anime/skflower-sub-indo/"
    pub path: Option<String>,
}

/// Body of POST /api/nonce
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct NonceBody {
    /// Episode page the request is made from
    pub path: String,
    pub noice: NoiceRequest,
}

/// Body of POST /api/mirror
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MirrorBody {
    /// Episode page the request is made from
    pub path: String,
    pub video: VideoRequest,
    /// Nonce returned by POST /api/nonce
    pub nonce: String,
}

/// Body of POST /api/resolve
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ResolveBody {
    /// Episode page the mirror was listed on
    pub path: String,
    pub mirror: VideoMirror,
}

/// Render a client result in the API envelope
fn respond<T: Serialize>(result: AppResult<T>, what: &str) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(ApiResponse::new(value)),
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("Failed to fetch {}: {}", what, e);
            } else {
                warn!("Rejected {} request: {}", what, e);
            }
            e.error_response()
        }
    }
}

/// GET /api/ongoing - Get ongoing anime
#[utoipa::path(
    get,
    path = "/api/ongoing",
    tag = "anime",
    params(PageQuery),
    responses(
        (status = 200, description = "Ongoing anime retrieved successfully", body = PagedResult<Post>),
        (status = 400, description = "Invalid page number", body = ApiError),
        (status = 502, description = "Source site unavailable", body = ApiError)
    )
)]
pub async fn get_ongoing(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1);
    info!("Fetching ongoing anime page {}", page);
    respond(data.client.ongoing(page).await, "ongoing anime")
}

/// GET /api/complete - Get completed anime
#[utoipa::path(
    get,
    path = "/api/complete",
    tag = "anime",
    params(PageQuery),
    responses(
        (status = 200, description = "Completed anime retrieved successfully", body = PagedResult<Post>),
        (status = 400, description = "Invalid page number", body = ApiError),
        (status = 502, description = "Source site unavailable", body = ApiError)
    )
)]
pub async fn get_complete(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1);
    info!("Fetching complete anime page {}", page);
    respond(data.client.complete(page).await, "complete anime")
}

/// GET /api/anime - Get anime detail
///
/// Query parameter: path (required) - detail page path
#[utoipa::path(
    get,
    path = "/api/anime",
    tag = "anime",
    params(PathQuery),
    responses(
        (status = 200, description = "Anime detail retrieved successfully", body = Detail),
        (status = 400, description = "Bad request - path is required", body = ApiError),
        (status = 404, description = "Page not found on the source site", body = ApiError),
        (status = 502, description = "Source site unavailable", body = ApiError)
    )
)]
pub async fn get_anime(data: web::Data<AppState>, query: web::Query<PathQuery>) -> impl Responder {
    let path = query.path.as_deref().unwrap_or_default();
    info!("Fetching anime detail: {}", path);
    respond(data.client.detail(path).await, "anime detail")
}

/// GET /api/episode - Get episode mirrors and downloads
///
/// Query parameter: path (required) - episode page path
#[utoipa::path(
    get,
    path = "/api/episode",
    tag = "episode",
    params(PathQuery),
    responses(
        (status = 200, description = "Episode data retrieved successfully", body = VideoData),
        (status = 400, description = "Bad request - path is required", body = ApiError),
        (status = 422, description = "Episode page structure not recognized", body = ApiError),
        (status = 502, description = "Source site unavailable", body = ApiError)
    )
)]
pub async fn get_episode(
    data: web::Data<AppState>,
    query: web::Query<PathQuery>,
) -> impl Responder {
    let path = query.path.as_deref().unwrap_or_default();
    info!("Fetching episode: {}", path);
    respond(data.client.video(path).await, "episode")
}

/// GET /api/anime-list - Get the alphabetic anime index
#[utoipa::path(
    get,
    path = "/api/anime-list",
    tag = "anime",
    responses(
        (status = 200, description = "Anime index retrieved successfully", body = Vec<AnimeIndexGroup>),
        (status = 502, description = "Source site unavailable", body = ApiError)
    )
)]
pub async fn get_anime_list(data: web::Data<AppState>) -> impl Responder {
    respond(data.client.anime_list().await, "anime list")
}

/// GET /api/genres - Get all genres
#[utoipa::path(
    get,
    path = "/api/genres",
    tag = "genre",
    responses(
        (status = 200, description = "Genres retrieved successfully", body = Vec<GenreEntry>),
        (status = 502, description = "Source site unavailable", body = ApiError)
    )
)]
pub async fn get_genres(data: web::Data<AppState>) -> impl Responder {
    respond(data.client.genres().await, "genre list")
}

/// GET /api/genres/{genre} - Get anime of one genre
#[utoipa::path(
    get,
    path = "/api/genres/{genre}",
    tag = "genre",
    params(
        ("genre" = String, Path, description = "Genre slug, e.g. \"action\""),
        PageQuery
    ),
    responses(
        (status = 200, description = "Genre listing retrieved successfully", body = PagedResult<GenreEntry>),
        (status = 400, description = "Invalid page number", body = ApiError),
        (status = 404, description = "Unknown genre", body = ApiError),
        (status = 502, description = "Source site unavailable", body = ApiError)
    )
)]
pub async fn get_genre(
    data: web::Data<AppState>,
    genre: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1);
    info!("Fetching genre {} page {}", genre, page);
    respond(data.client.genre(&genre, page).await, "genre listing")
}

/// POST /api/nonce - Run the nonce request of a mirror
#[utoipa::path(
    post,
    path = "/api/nonce",
    tag = "episode",
    request_body = NonceBody,
    responses(
        (status = 200, description = "The data field of the nonce response"),
        (status = 400, description = "Bad request - path is required", body = ApiError),
        (status = 502, description = "Source site unavailable or answered unexpectedly", body = ApiError)
    )
)]
pub async fn post_nonce(data: web::Data<AppState>, body: web::Json<NonceBody>) -> impl Responder {
    if body.path.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("path is required"));
    }
    respond(
        data.client.request_nonce(&body.path, &body.noice).await,
        "nonce",
    )
}

/// POST /api/mirror - Run the mirror request with a nonce
#[utoipa::path(
    post,
    path = "/api/mirror",
    tag = "episode",
    request_body = MirrorBody,
    responses(
        (status = 200, description = "The data field of the mirror response"),
        (status = 400, description = "Bad request - path is required", body = ApiError),
        (status = 502, description = "Source site unavailable or answered unexpectedly", body = ApiError)
    )
)]
pub async fn post_mirror(data: web::Data<AppState>, body: web::Json<MirrorBody>) -> impl Responder {
    if body.path.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("path is required"));
    }
    respond(
        data.client
            .request_mirror(&body.path, &body.video, &body.nonce)
            .await,
        "mirror",
    )
}

/// POST /api/resolve - Run both requests for one mirror
#[utoipa::path(
    post,
    path = "/api/resolve",
    tag = "episode",
    request_body = ResolveBody,
    responses(
        (status = 200, description = "The data field of the mirror response"),
        (status = 400, description = "Bad request - path is required", body = ApiError),
        (status = 502, description = "Source site unavailable or answered unexpectedly", body = ApiError)
    )
)]
pub async fn post_resolve(data: web::Data<AppState>, body: web::Json<ResolveBody>) -> impl Responder {
    respond(
        data.client.resolve_mirror(&body.path, &body.mirror).await,
        "mirror resolution",
    )
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Otakudesu Scraper API",
        version = "0.1.0",
        description = "API for scraping anime listings, episodes and streaming mirrors from Otakudesu",
        license(
            name = "MIT"
        )
    ),
    paths(
        get_ongoing,
        get_complete,
        get_anime,
        get_episode,
        get_anime_list,
        get_genres,
        get_genre,
        post_nonce,
        post_mirror,
        post_resolve
    ),
    components(
        schemas(
            Post,
            GenreEntry,
            Info,
            Episode,
            Detail,
            AnimeIndexEntry,
            AnimeIndexGroup,
            ResolutionTier,
            DownloadFormat,
            NoiceRequest,
            VideoRequest,
            MirrorPayload,
            VideoMirror,
            MirrorDecodeFailure,
            MirrorBuckets,
            DownloadLink,
            DownloadBuckets,
            VideoData,
            ApiError,
            PageQuery,
            PathQuery,
            NonceBody,
            MirrorBody,
            ResolveBody
        )
    ),
    tags(
        (name = "anime", description = "Listings and anime detail pages"),
        (name = "genre", description = "Genre list and genre listings"),
        (name = "episode", description = "Episode pages and mirror resolution")
    )
)]
pub struct ApiDoc;

/// Configure API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/ongoing", web::get().to(get_ongoing))
            .route("/complete", web::get().to(get_complete))
            .route("/anime", web::get().to(get_anime))
            .route("/episode", web::get().to(get_episode))
            .route("/anime-list", web::get().to(get_anime_list))
            .route("/genres", web::get().to(get_genres))
            .route("/genres/{genre}", web::get().to(get_genre))
            .route("/nonce", web::post().to(post_nonce))
            .route("/mirror", web::post().to(post_mirror))
            .route("/resolve", web::post().to(post_resolve)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use httpmock::prelude::*;

    use crate::scraper::{Scraper, ScraperConfig};

    fn state_for(base_url: String) -> web::Data<AppState> {
        let client = OtakudesuClient::new(
            Scraper::with_config(ScraperConfig {
                base_url: base_url.clone(),
                ..Default::default()
            })
            .unwrap(),
        );
        web::Data::new(AppState {
            client,
            config: Config {
                base_url,
                ..Default::default()
            },
        })
    }

    #[actix_web::test]
    async fn test_anime_without_path_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(state_for("http://127.0.0.1:9".to_string()))
                .configure(configure_routes),
        )
        .await;

        for uri in ["/api/anime", "/api/anime?path=", "/api/episode?path=%20%20"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);

            let body: ApiError = test::read_body_json(resp).await;
            assert!(!body.success);
            assert_eq!(body.error, "path is required");
        }
    }

    #[actix_web::test]
    async fn test_ongoing_page_zero_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(state_for("http://127.0.0.1:9".to_string()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/ongoing?page=0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_ongoing_returns_envelope() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ongoing-anime/page/1");
            then.status(200).body(
                r#"<div class="venz"><ul>
                    <li><div class="epz">Episode 4</div><a href="/anime/a/"><h2>Alpha</h2></a></li>
                </ul></div>"#,
            );
        });

        let app = test::init_service(
            App::new()
                .app_data(state_for(server.base_url()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/ongoing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiResponse<PagedResult<Post>> = test::read_body_json(resp).await;
        assert!(body.success);
        assert_eq!(body.data.page, 1);
        assert_eq!(body.data.total, 1);
        assert_eq!(body.data.data[0].title, "Alpha");
        assert_eq!(body.data.data[0].episodes, Some(4));
    }

    #[actix_web::test]
    async fn test_upstream_404_maps_to_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/anime/missing/");
            then.status(404).body("<html>404</html>");
        });

        let app = test::init_service(
            App::new()
                .app_data(state_for(server.base_url()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/anime?path=/anime/missing/")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_genre_route_builds_genre_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/genres/action/page/2");
            then.status(200).body("<html><body></body></html>");
        });

        let app = test::init_service(
            App::new()
                .app_data(state_for(server.base_url()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/genres/action?page=2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        mock.assert();
    }

    #[actix_web::test]
    async fn test_nonce_blank_path_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(state_for("http://127.0.0.1:9".to_string()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/nonce")
            .set_json(NonceBody {
                path: " ".to_string(),
                noice: NoiceRequest {
                    action: "x".to_string(),
                },
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_nonce_returns_data_field() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/wp-admin/admin-ajax.php")
                .body("action=aa12");
            then.status(200).body(r#"{"data":"c0ffee"}"#);
        });

        let app = test::init_service(
            App::new()
                .app_data(state_for(server.base_url()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/nonce")
            .set_json(NonceBody {
                path: "/episode/x/".to_string(),
                noice: NoiceRequest {
                    action: "aa12".to_string(),
                },
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiResponse<serde_json::Value> = test::read_body_json(resp).await;
        assert_eq!(body.data, serde_json::json!("c0ffee"));
    }
}

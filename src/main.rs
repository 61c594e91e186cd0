//! Otakudesu Scraper API Server
//!
//! Main entry point for the Otakudesu scraper REST API service.

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use otakudesu_scraper::client::OtakudesuClient;
use otakudesu_scraper::config::Config;
use otakudesu_scraper::routes::{configure_routes, ApiDoc, AppState};

/// Health check endpoint
async fn health_check(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "source": data.config.base_url,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_address = format!("{}:{}", config.host, config.port);

    let client = OtakudesuClient::from_config(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let app_state = web::Data::new(AppState {
        client,
        config: config.clone(),
    });

    info!(
        "Starting Otakudesu Scraper API server on {} (source: {})",
        bind_address, config.base_url
    );

    let openapi = ApiDoc::openapi();

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .route("/health", web::get().to(health_check))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}

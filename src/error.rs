//! Global error handling module for the Otakudesu scraper API
//!
//! This module provides a unified error type that handles all application errors
//! and converts them to appropriate HTTP responses with consistent JSON structure.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiError;
use crate::parser::ExtractError;
use crate::scraper::ScraperError;

/// Application-wide error type that unifies all error sources
#[derive(Debug, Error)]
pub enum AppError {
    /// Transport errors (network, non-2xx, unreadable body)
    #[error("Scraping error: {0}")]
    Scraping(#[from] ScraperError),

    /// The page or AJAX response did not have the expected shape
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Validation errors (bad request)
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,

            // An upstream 404 means the requested page does not exist
            AppError::Scraping(ScraperError::HttpError { status: 404, .. }) => {
                StatusCode::NOT_FOUND
            }
            AppError::Scraping(ScraperError::InvalidRequest(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Scraping(_) => StatusCode::BAD_GATEWAY,

            AppError::Extraction(ExtractError::MalformedPage(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Extraction(ExtractError::UnexpectedResponse(_)) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),

            AppError::Scraping(scraper_err) => match scraper_err {
                ScraperError::NetworkError(msg) => format!("Failed to connect to server: {}", msg),
                ScraperError::HttpError { status: 404, .. } => {
                    "Page not found on the source site".to_string()
                }
                ScraperError::HttpError { status, message } => {
                    format!("Source site returned status {}: {}", status, message)
                }
                ScraperError::ResponseError(msg) => format!("Failed to read response: {}", msg),
                ScraperError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            },

            AppError::Extraction(extract_err) => match extract_err {
                ExtractError::MalformedPage(msg) => {
                    format!("Page structure not recognized: {}", msg)
                }
                ExtractError::UnexpectedResponse(msg) => {
                    format!("Unexpected response from source site: {}", msg)
                }
            },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_response = ApiError::new(self.user_message());

        HttpResponse::build(status).json(error_response)
    }
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

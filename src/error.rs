use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Db(String),

    #[error("Contract violation: {0}")]
    Contract(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "DB_ERROR",
            Self::Contract(_) => "CONTRACT_VIOLATION",
            Self::NotFound(_) => "NOT_FOUND",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Db(_) | Self::Contract(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Db(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({
                "error": {
                    "code": self.code(),
                    "message": self.to_string()
                }
            })),
        )
            .into_response()
    }
}

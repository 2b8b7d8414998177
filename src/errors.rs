use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use derive_more::derive::{Display, Error as DeriveMoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Cant bind to the Socket")]
    SocketBind,
    #[error("Cant connect to the DB")]
    DbConnect,
    #[error("Cant run the database migrations")]
    Migrate,
    #[error("{0} must be set")]
    MissingConfig(&'static str),
    #[error("Cant start the server")]
    ServerStart,
}

/// Domain error taxonomy. Every handler failure maps onto one of these and
/// serializes as the same `{"error": "..."}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotEligible(String),
    #[error("{0}")]
    Gateway(String),
    #[error("Internal Error")]
    Internal,
    #[error("Internal Error")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Display, DeriveMoreError, Serialize, Deserialize)]
#[display("error: {}", error)]
pub struct ErrorBody {
    pub error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotEligible(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        let cases = [
            (ApiError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("u".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("f".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("n".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("c".into()), StatusCode::CONFLICT),
            (ApiError::NotEligible("e".into()), StatusCode::BAD_REQUEST),
            (ApiError::Gateway("g".into()), StatusCode::BAD_GATEWAY),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected);
        }
    }

    #[test]
    fn database_errors_do_not_leak_details() {
        let err = ApiError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Error");
    }
}

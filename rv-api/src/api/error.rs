//! HTTP error mapping
//!
//! Every failure response is `{"message": ...}` in the request's language.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rv_common::i18n::{t, t_with};
use rv_common::Language;
use serde_json::json;
use tracing::{debug, error};

use crate::service::{ServiceError, UrlProblem};

/// A service error paired with the language to report it in
#[derive(Debug)]
pub struct ApiError {
    pub lang: Language,
    pub error: ServiceError,
}

impl ApiError {
    pub fn new(lang: Language, error: impl Into<ServiceError>) -> Self {
        Self {
            lang,
            error: error.into(),
        }
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        let lang = self.lang;
        match &self.error {
            ServiceError::InvalidUrl(UrlProblem::Missing) => {
                (StatusCode::BAD_REQUEST, t("urlRequired", lang))
            }
            ServiceError::InvalidUrl(UrlProblem::Malformed) => {
                (StatusCode::BAD_REQUEST, t("invalidUrl", lang))
            }
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, t("recipeNotFound", lang)),
            ServiceError::ScrapeFailed(reason) => (
                StatusCode::BAD_GATEWAY,
                t_with("scrapeFailed", lang, &[("reason", reason.as_str())]),
            ),
            ServiceError::DuplicateUrl(_) => (StatusCode::CONFLICT, t("recipeExists", lang)),
            ServiceError::InvalidBody(_) => (StatusCode::BAD_REQUEST, t("invalidRequest", lang)),
            ServiceError::Database(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}: {}", t("unexpectedError", lang), e),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self.error);
        } else {
            debug!(status = status.as_u16(), "Request rejected: {}", self.error);
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Attach the request language to a service result
pub trait Localized<T> {
    fn localized(self, lang: Language) -> Result<T, ApiError>;
}

impl<T, E: Into<ServiceError>> Localized<T> for Result<T, E> {
    fn localized(self, lang: Language) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(lang, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::InvalidUrl(UrlProblem::Missing), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidUrl(UrlProblem::Malformed), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("1".to_string()), StatusCode::NOT_FOUND),
            (ServiceError::ScrapeFailed("HTTP 404".to_string()), StatusCode::BAD_GATEWAY),
            (ServiceError::DuplicateUrl("u".to_string()), StatusCode::CONFLICT),
            (ServiceError::InvalidBody("bad json".to_string()), StatusCode::BAD_REQUEST),
            (ServiceError::Database(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            let (status, _) = ApiError::new(Language::En, error).status_and_message();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_messages_are_localized() {
        let (_, message) =
            ApiError::new(Language::Sv, ServiceError::NotFound("1".to_string())).status_and_message();
        assert_eq!(message, t("recipeNotFound", Language::Sv));

        let (_, message) = ApiError::new(
            Language::En,
            ServiceError::ScrapeFailed("HTTP 404".to_string()),
        )
        .status_and_message();
        assert!(message.contains("HTTP 404"));
    }
}

//! Error types shared by the request builders, the provider client and the
//! HTTP handlers.
//!
//! [`ValidationError`]s are caller mistakes and render as `400`; an
//! [`UpstreamError`] means the provider call failed and renders as `500` with
//! whatever the provider sent back attached.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::provider::request::IdentifierKind;
use crate::provider::target::Endpoint;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required parameters")]
    MissingParameters {
        missing: Vec<&'static str>,
        example: Value,
    },
    #[error("Provide only one identifier: phone, email, or profile")]
    ConflictingIdentifiers,
    #[error("Discount must be between 0 and 100")]
    DiscountOutOfRange(f64),
    #[error("Discount must be a number")]
    InvalidDiscount,
    #[error("Date must be in YYYY-MM-DD HH:MM format")]
    InvalidDateFormat(String),
    #[error("Date cannot be in the past")]
    DateNotInFuture(String),
    #[error("{endpoint} does not support the {kind} identifier, use phone or email")]
    UnsupportedIdentifier {
        endpoint: Endpoint,
        kind: IdentifierKind,
    },
    #[error("Invalid provider URL: {0:?}")]
    InvalidProviderUrl(String),
    #[error("Invalid request body: {0}")]
    MalformedBody(String),
}

/// The provider call failed, either at the transport level or with a non-2xx status.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub body: Option<Value>,
    pub message: String,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("provider request timed out: {error}")
        } else {
            error.to_string()
        };
        Self {
            status: error.status().map(|status| status.as_u16()),
            body: None,
            message,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("{0}")]
    Internal(String),
}

/// An [`Error`] on its way out of a handler.
///
/// `context` names the failed operation in upstream error envelopes.
/// `expose_internal` is off in production, hiding internal error messages.
#[derive(Debug)]
pub struct ApiError {
    pub context: &'static str,
    pub error: Error,
    pub expose_internal: bool,
}

impl ApiError {
    pub fn new(context: &'static str, error: impl Into<Error>, expose_internal: bool) -> Self {
        Self {
            context,
            error: error.into(),
            expose_internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(false));

        match self.error {
            Error::Validation(error) => {
                tracing::warn!(context = self.context, %error, "rejected invalid request");
                body.insert("error".into(), Value::String(error.to_string()));
                match error {
                    ValidationError::MissingParameters { missing, example } => {
                        body.insert("missing".into(), json!(missing));
                        body.insert("example".into(), example);
                    }
                    ValidationError::InvalidDateFormat(_) => {
                        body.insert("example".into(), json!("2025-12-31 23:59"));
                    }
                    _ => {}
                }
            }
            Error::Upstream(error) => {
                tracing::error!(
                    context = self.context,
                    status = ?error.status,
                    body = ?error.body,
                    message = %error.message,
                    "provider request failed"
                );
                body.insert("error".into(), Value::String(self.context.into()));
                body.insert("details".into(), Value::String(error.message));
                if let Some(status) = error.status {
                    body.insert("status".into(), json!(status));
                }
                if let Some(provider_body) = error.body {
                    body.insert("prodamusError".into(), provider_body);
                }
            }
            Error::Internal(message) => {
                tracing::error!(context = self.context, %message, "internal error");
                body.insert("error".into(), Value::String("Internal Server Error".into()));
                let message = if self.expose_internal {
                    message
                } else {
                    String::from("Something went wrong")
                };
                body.insert("message".into(), Value::String(message));
            }
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_returns_400() {
        let error = ApiError::new("ctx", ValidationError::DiscountOutOfRange(101.0), true);
        let (status, body) = render(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Discount must be between 0 and 100"));
    }

    #[tokio::test]
    async fn missing_parameters_lists_fields_and_example() {
        let error = ApiError::new(
            "ctx",
            ValidationError::MissingParameters {
                missing: vec!["secretKey", "discount"],
                example: json!({"discount": 25}),
            },
            true,
        );
        let (status, body) = render(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["missing"], json!(["secretKey", "discount"]));
        assert_eq!(body["example"], json!({"discount": 25}));
    }

    #[tokio::test]
    async fn upstream_error_returns_500_with_provider_body() {
        let error = ApiError::new(
            "Failed to update subscription discount",
            UpstreamError {
                status: Some(403),
                body: Some(json!({"error": "bad signature"})),
                message: "provider returned status 403 Forbidden".into(),
            },
            true,
        );
        let (status, body) = render(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Failed to update subscription discount"));
        assert_eq!(body["status"], json!(403));
        assert_eq!(body["prodamusError"], json!({"error": "bad signature"}));
    }

    #[tokio::test]
    async fn internal_error_message_hidden_in_production() {
        let error = ApiError::new("ctx", Error::Internal("db exploded".into()), false);
        let (status, body) = render(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], json!("Something went wrong"));
    }

    #[tokio::test]
    async fn internal_error_message_shown_in_development() {
        let error = ApiError::new("ctx", Error::Internal("db exploded".into()), true);
        let (_, body) = render(error).await;
        assert_eq!(body["message"], json!("db exploded"));
    }
}

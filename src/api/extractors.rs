//! Validated JSON extractor
//!
//! Extracts and validates JSON request bodies using the validator crate.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::domain::{AppError, ValidationError};

/// Validated JSON extractor
///
/// Extracts a JSON body and validates it using the `validator` crate.
/// Broken JSON is rejected as a bad request; well-formed JSON with missing
/// or mistyped fields, or failing validation rules, as unprocessable.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection_to_error)?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> AppError {
    let error = match rejection {
        JsonRejection::JsonDataError(e) => ValidationError::Multiple(e.body_text()),
        JsonRejection::JsonSyntaxError(e) => ValidationError::InvalidFormat(e.body_text()),
        JsonRejection::MissingJsonContentType(e) => ValidationError::InvalidFormat(e.body_text()),
        other => ValidationError::InvalidFormat(other.body_text()),
    };
    AppError::Validation(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::post};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(max = 5))]
        name: String,
    }

    async fn handler(ValidatedJson(payload): ValidatedJson<Payload>) -> String {
        payload.name
    }

    async fn send(body: &str, content_type: Option<&str>) -> StatusCode {
        let app = Router::new().route("/", post(handler));
        let mut request = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let response = app
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_valid_payload_passes() {
        let status = send(r#"{"name": "ok"}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_syntax_error_is_bad_request() {
        let status = send(r#"{"name": "#, Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let status = send(r#"{"name": "ok"}"#, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_field_is_unprocessable() {
        let status = send(r#"{"other": 1}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_validation_failure_is_unprocessable() {
        let status = send(r#"{"name": "far too long"}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

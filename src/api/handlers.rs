//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::app::AppState;
use crate::domain::{
    AppError, Currency, HealthResponse, HealthStatus, ListingStatus, Money, ServiceError,
    ServiceErrorCode, ValidationError,
};

use super::extractors::ValidatedJson;
use super::models::{
    AddressRequest, AddressResponse, CreateListingRequest, ErrorDetail, ErrorResponse,
    ListQuery, ListingResponse, RateLimitResponse, UpdateListingRequest,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Real Estate Listings API",
        version = "0.1.0",
        description = "Create, update, publish, archive, and delete real-estate listings",
        license(
            name = "MIT"
        )
    ),
    paths(
        list_listings_handler,
        get_listing_handler,
        create_listing_handler,
        update_listing_handler,
        publish_listing_handler,
        archive_listing_handler,
        reactivate_listing_handler,
        delete_listing_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
        metrics_handler,
    ),
    components(
        schemas(
            ListingResponse,
            AddressResponse,
            CreateListingRequest,
            UpdateListingRequest,
            AddressRequest,
            ListingStatus,
            Money,
            Currency,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            ErrorDetail,
            RateLimitResponse,
        )
    ),
    tags(
        (name = "listings", description = "Listing management endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Unparseable ids are reported exactly like unknown ones.
fn parse_listing_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| ServiceError::not_found("Listing", id).into())
}

/// List listings, newest first
#[utoipa::path(
    get,
    path = "/listings",
    tag = "listings",
    params(ListQuery),
    responses(
        (status = 200, description = "Listings, newest first", body = Vec<ListingResponse>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_listings_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<ListingResponse>>, AppError> {
    let Query(query) =
        query.map_err(|e| AppError::Validation(ValidationError::InvalidFormat(e.body_text())))?;
    let listings = state.service.list(query.status).await?;
    Ok(Json(listings.iter().map(ListingResponse::from).collect()))
}

/// Get a single listing by ID
#[utoipa::path(
    get,
    path = "/listings/{id}",
    tag = "listings",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing found", body = ListingResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_listing_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListingResponse>, AppError> {
    let id = parse_listing_id(&id)?;
    let listing = state
        .service
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::listing_not_found(id))?;
    Ok(Json(ListingResponse::from(&listing)))
}

/// Create a new draft listing
#[utoipa::path(
    post,
    path = "/listings",
    tag = "listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ListingResponse,
            headers(("Location" = String, description = "URL of the new listing"))),
        (status = 400, description = "Malformed JSON or business rule violation", body = ErrorResponse),
        (status = 422, description = "Request validation failed", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_listing_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateListingRequest>,
) -> Result<Response, AppError> {
    let listing = state.service.create(payload.into()).await?;
    let location = format!("/listings/{}", listing.id());
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ListingResponse::from(&listing)),
    )
        .into_response())
}

/// Replace a listing's details and optionally move it to another status
#[utoipa::path(
    put,
    path = "/listings/{id}",
    tag = "listings",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    request_body = UpdateListingRequest,
    responses(
        (status = 204, description = "Listing updated"),
        (status = 400, description = "Malformed JSON or business rule violation", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 422, description = "Request validation failed", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_listing_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateListingRequest>,
) -> Result<StatusCode, AppError> {
    let id = parse_listing_id(&id)?;
    state.service.update(id, payload.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Publish a draft listing
#[utoipa::path(
    patch,
    path = "/listings/{id}/publish",
    tag = "listings",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 204, description = "Listing published"),
        (status = 400, description = "Listing is not a draft", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn publish_listing_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.publish(parse_listing_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Archive a published listing
#[utoipa::path(
    patch,
    path = "/listings/{id}/archive",
    tag = "listings",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 204, description = "Listing archived"),
        (status = 400, description = "Listing is not published", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn archive_listing_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.archive(parse_listing_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Return an archived listing to draft
#[utoipa::path(
    patch,
    path = "/listings/{id}/reactivate",
    tag = "listings",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 204, description = "Listing reactivated as a draft"),
        (status = 400, description = "Listing is not archived", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn reactivate_listing_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.reactivate(parse_listing_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a listing
#[utoipa::path(
    delete,
    path = "/listings/{id}",
    tag = "listings",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn delete_listing_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.delete(parse_listing_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Prometheus scrape endpoint
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Prometheus text exposition", body = String),
        (status = 404, description = "Metrics are disabled")
    )
)]
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics_handle {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn status_for(code: ServiceErrorCode) -> StatusCode {
    match code {
        ServiceErrorCode::General | ServiceErrorCode::InvalidOperation => StatusCode::BAD_REQUEST,
        ServiceErrorCode::NotFound => StatusCode::NOT_FOUND,
        ServiceErrorCode::Conflict => StatusCode::CONFLICT,
        ServiceErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = status_for(code);
        let error_type = code.as_str();

        let message = if status.is_server_error() {
            error!(error_type = %error_type, error = %self, "Server error");
            "An unexpected error occurred".to_string()
        } else {
            warn!(status = status.as_u16(), error_type = %error_type, message = %self, "Request failed");
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

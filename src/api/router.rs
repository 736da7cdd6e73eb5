//! Route table, middleware stack, and optional per-client rate limiting.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, Response, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, patch},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter, clock::Clock};
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;

use super::handlers::{
    ApiDoc, archive_listing_handler, create_listing_handler, delete_listing_handler,
    get_listing_handler, health_check_handler, list_listings_handler, liveness_handler,
    metrics_handler, publish_listing_handler, reactivate_listing_handler, readiness_handler,
    update_listing_handler,
};
use super::models::{ErrorDetail, ErrorResponse, RateLimitResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second for listing endpoints
    pub general_rps: u32,
    /// Burst size for listing endpoints
    pub general_burst: u32,
    /// Requests per second for health endpoints
    pub health_rps: u32,
    /// Burst size for health endpoints
    pub health_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_rps: 10,
            general_burst: 20,
            health_rps: 100,
            health_burst: 100,
        }
    }
}

/// Per-client token buckets for listing and health routes
pub struct RateLimitState {
    listings_limiter: DefaultKeyedRateLimiter<IpAddr>,
    health_limiter: DefaultKeyedRateLimiter<IpAddr>,
    config: RateLimitConfig,
}

impl RateLimitState {
    /// Zero rates or bursts are raised to one.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            listings_limiter: RateLimiter::keyed(quota(config.general_rps, config.general_burst)),
            health_limiter: RateLimiter::keyed(quota(config.health_rps, config.health_burst)),
            config,
        }
    }
}

fn quota(rps: u32, burst: u32) -> Quota {
    let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
    Quota::per_second(rps).allow_burst(burst)
}

/// Client address for rate limiting: first X-Forwarded-For hop, then
/// X-Real-IP, then the socket peer.
/// Falls back to 0.0.0.0 when unknown; unknown clients share one bucket.
fn client_ip_from_request<B>(request: &Request<B>) -> IpAddr {
    let header_ip = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn seconds_until_retry(not_until: &governor::NotUntil<governor::clock::QuantaInstant>) -> u64 {
    let wait = not_until.wait_time_from(governor::clock::DefaultClock::default().now());
    // Round up so clients never retry early
    wait.as_secs() + u64::from(wait.subsec_nanos() > 0)
}

/// Rate limiting for listing routes, advertising the limit on every response
async fn rate_limit_listings_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip = client_ip_from_request(&request);
    let limit = HeaderValue::from(rate_limit.config.general_rps);

    match rate_limit.listings_limiter.check_key(&client_ip) {
        Ok(()) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert("X-RateLimit-Limit", limit);
            response
        }
        Err(not_until) => {
            let retry_after = seconds_until_retry(&not_until);

            let body = RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded. Please slow down your requests.".to_string(),
                },
                retry_after,
            };

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit);
            headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
            headers.insert("Retry-After", HeaderValue::from(retry_after));
            response
        }
    }
}

/// Rate limiting for probes; a plain error body, no limit headers
async fn rate_limit_health_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip = client_ip_from_request(&request);
    match rate_limit.health_limiter.check_key(&client_ip) {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let retry_after = seconds_until_retry(&not_until);

            let body = ErrorResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded".to_string(),
                },
            };

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(retry_after));
            response
        }
    }
}

fn listing_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/listings",
            get(list_listings_handler).post(create_listing_handler),
        )
        .route(
            "/listings/{id}",
            get(get_listing_handler)
                .put(update_listing_handler)
                .delete(delete_listing_handler),
        )
        .route("/listings/{id}/publish", patch(publish_listing_handler))
        .route("/listings/{id}/archive", patch(archive_listing_handler))
        .route("/listings/{id}/reactivate", patch(reactivate_listing_handler))
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
}

fn finish(routes: Router<Arc<AppState>>, app_state: Arc<AppState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ));

    routes
        .route("/metrics", get(metrics_handler))
        .layer(middleware)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Router with every route and no rate limiting
pub fn create_router(app_state: Arc<AppState>) -> Router {
    finish(listing_routes().merge(health_routes()), app_state)
}

/// Create router with per-client rate limiting on listing and health routes
pub fn create_router_with_rate_limit(app_state: Arc<AppState>, config: RateLimitConfig) -> Router {
    let rate_limit_state = Arc::new(RateLimitState::new(config));

    let listings = listing_routes().layer(middleware::from_fn_with_state(
        Arc::clone(&rate_limit_state),
        rate_limit_listings_middleware,
    ));
    let health = health_routes().layer(middleware::from_fn_with_state(
        rate_limit_state,
        rate_limit_health_middleware,
    ));

    finish(listings.merge(health), app_state)
}

//! HTTP/REST transport for tilescope server
//!
//! Endpoints:
//! - `POST   /v1/search`             - unified search (`SearchRequest` → `SearchResult`)
//! - `GET    /v1/stats`              - index statistics
//! - `POST   /v1/listings`           - queue a listing upsert
//! - `GET    /v1/listings/:id`       - fetch a listing
//! - `DELETE /v1/listings/:id`       - queue a listing removal
//! - `POST   /v1/index/rebuild`      - rebuild aggregates after queued writes
//!
//! Search failures are returned as the serialized `SearchError` with a
//! status derived from its class.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tilescope::Engine;
use tilescope_types::error::{ErrorClass, SearchError};
use tilescope_types::listing::Listing;
use tilescope_types::result::SearchRequest;
use tracing::info;

use crate::config::ServerOptions;
use crate::handler::Handler;

struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

fn search_status(err: &SearchError) -> StatusCode {
    match (err, err.class()) {
        (SearchError::Timeout, _) => StatusCode::GATEWAY_TIMEOUT,
        (_, ErrorClass::CallerBug) => StatusCode::BAD_REQUEST,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn search(State(handler): State<Handler>, Json(request): Json<SearchRequest>) -> Response {
    match handler.reader().search(request).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => (search_status(&err), Json(err)).into_response(),
    }
}

async fn stats(State(handler): State<Handler>) -> Response {
    Json(handler.reader().stats()).into_response()
}

async fn upsert_listing(
    State(handler): State<Handler>,
    Json(listing): Json<Listing>,
) -> Result<StatusCode, ApiError> {
    handler
        .enqueue_upsert(listing)
        .await
        .map(|_| StatusCode::ACCEPTED)
        .map_err(|e| ApiError(StatusCode::BAD_REQUEST, e))
}

async fn get_listing(
    State(handler): State<Handler>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match handler.reader().get_listing(&id) {
        Ok(Some(listing)) => Ok(Json(listing).into_response()),
        Ok(None) => Err(ApiError(StatusCode::NOT_FOUND, format!("No listing {}", id))),
        Err(e) => Err(ApiError(StatusCode::SERVICE_UNAVAILABLE, e)),
    }
}

async fn remove_listing(
    State(handler): State<Handler>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    handler
        .enqueue_remove(id)
        .await
        .map(|_| StatusCode::ACCEPTED)
        .map_err(|e| ApiError(StatusCode::SERVICE_UNAVAILABLE, e))
}

async fn rebuild(State(handler): State<Handler>) -> Result<Response, ApiError> {
    handler
        .request_rebuild()
        .await
        .map(|stats| Json(stats).into_response())
        .map_err(|e| ApiError(StatusCode::SERVICE_UNAVAILABLE, e))
}

/// Build the REST router over a handler.
pub fn router(handler: Handler) -> Router {
    Router::new()
        .route("/v1/search", post(search))
        .route("/v1/stats", get(stats))
        .route("/v1/listings", post(upsert_listing))
        .route("/v1/listings/:id", get(get_listing).delete(remove_listing))
        .route("/v1/index/rebuild", post(rebuild))
        .with_state(handler)
}

/// Run the HTTP server with default options.
pub async fn run_server(
    listener: tokio::net::TcpListener,
    engine: Arc<Engine>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let handler = crate::spawn_services(engine, &ServerOptions::default());
    serve(listener, handler, shutdown).await
}

/// Serve the REST API until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    handler: Handler,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("Tilescope HTTP Server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tilescope::{Config, ListingType};
    use tilescope_types::bbox::Bounds;
    use tilescope_types::filter::Filters;
    use tilescope_types::result::SearchResult;
    use tilescope_types::viewport::Viewport;
    use tower::ServiceExt;

    fn app() -> Router {
        let engine = Engine::with_listings(
            Config::default(),
            vec![Listing::new("a", 38.72, -9.14, 100.0, ListingType::Sale, "apartment")],
        )
        .unwrap();
        router(crate::spawn_services(Arc::new(engine), &ServerOptions::default()))
    }

    fn search_request(bounds: Bounds) -> Request<Body> {
        let body = SearchRequest::new(Viewport::from_bounds(bounds, 10.0), Filters::new());
        Request::post("/v1/search")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let response = app()
            .oneshot(search_request(Bounds::new(39.0, 38.0, -9.0, -10.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let result: SearchResult = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(result.total, 1);
    }

    #[tokio::test]
    async fn test_invalid_viewport_is_bad_request() {
        let response = app()
            .oneshot(search_request(Bounds::new(38.0, 39.0, -9.0, -10.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let err: SearchError = serde_json::from_slice(&bytes).unwrap();
        assert!(matches!(err, SearchError::InvalidViewport(_)));
    }

    #[tokio::test]
    async fn test_missing_listing_is_not_found() {
        let response = app()
            .oneshot(Request::get("/v1/listings/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

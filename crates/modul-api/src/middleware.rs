//! Response hardening shared by every route.
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::{body::Body, response::Response};
use tower_http::cors::CorsLayer;

pub fn cors() -> CorsLayer {
    CorsLayer::permissive()
}

/// Session documents carry teacher names; keep them out of shared caches.
pub async fn no_store(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store"));
    response
}

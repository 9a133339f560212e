use axum::{
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tag each request with an `x-request-id`, keeping one supplied by the caller
pub async fn request_id_middleware<B>(mut req: Request<B>, next: Next<B>) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        });

    req.headers_mut().insert(REQUEST_ID_HEADER, request_id.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    res
}

pub async fn logging_middleware<B>(req: Request<B>, next: Next<B>) -> Response {
    let path = req.uri().path().to_owned();
    let method = req.method().clone();
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    let start = Instant::now();
    info!(%request_id, "Request started: {} {}", method, path);

    let res = next.run(req).await;

    let duration = start.elapsed();
    info!(%request_id, status = res.status().as_u16(), "Request completed: {} {} - {:?}", method, path, duration);

    res
}

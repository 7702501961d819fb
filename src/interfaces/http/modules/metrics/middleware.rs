//! HTTP request metrics middleware

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

/// Label used for requests that matched no route.
const UNMATCHED_PATH: &str = "unmatched";

/// Prometheus scrapes are not counted.
const SCRAPE_PATH: &str = "/metrics";

/// Records `http_requests_total{method, path, status}` and
/// `http_request_duration_seconds{method, path}`.
///
/// `path` is the route template (`/api/v1/zones/{zone_id}/tariff`), never the
/// raw URI, so zone ids and probing requests stay out of the label set.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let path = route_label(&request);
    if path == SCRAPE_PATH {
        return next.run(request).await;
    }
    let method = request.method().as_str().to_owned();

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(elapsed);

    response
}

fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned())
}

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use propeller_app::infrastructure::security::{RateLimitError, RateLimitStatus, RateLimiter};
use propeller_app::AppContext;
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

pub async fn api_rate_limit(State(ctx): State<AppContext>, req: Request, next: Next) -> Response {
    enforce(&ctx.api_limiter, req, next).await
}

pub async fn chat_rate_limit(State(ctx): State<AppContext>, req: Request, next: Next) -> Response {
    enforce(&ctx.chat_limiter, req, next).await
}

pub async fn upload_rate_limit(State(ctx): State<AppContext>, req: Request, next: Next) -> Response {
    enforce(&ctx.upload_limiter, req, next).await
}

async fn enforce(limiter: &RateLimiter, req: Request, next: Next) -> Response {
    let ip = client_ip(&req);

    match limiter.check_rate_limit(ip) {
        Ok(status) => {
            let mut response = next.run(req).await;
            // an inner, stricter limiter has already set its own numbers
            let headers = response.headers_mut();
            for (name, value) in limit_headers(&status) {
                headers.entry(name).or_insert(value);
            }
            response
        }
        Err(err) => {
            tracing::warn!("Rate limit exceeded for {}: {}", ip, err.message);
            too_many_requests(&err)
        }
    }
}

fn limit_headers(status: &RateLimitStatus) -> [(HeaderName, HeaderValue); 3] {
    [
        (RATE_LIMIT_LIMIT, HeaderValue::from(status.limit)),
        (RATE_LIMIT_REMAINING, HeaderValue::from(status.remaining)),
        (
            RATE_LIMIT_RESET,
            HeaderValue::from(status.reset_after.as_secs()),
        ),
    ]
}

fn too_many_requests(err: &RateLimitError) -> Response {
    let retry_after = err.retry_after_secs();
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": err.message })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(err.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(0u32));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(retry_after));
    response
}

/// The peer address of the connection. Requests served without connection
/// info (tests, in-process calls) share one bucket.
fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

use crate::web::extractors::{request_id_from_headers, REQUEST_ID_HEADER};
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// 请求ID中间件：缺失时补上 `X-Request-ID`，并回写到响应头
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let request_id = request_id_from_headers(req.headers());
    let value = HeaderValue::from_str(&request_id).ok();

    if let Some(value) = &value {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let mut response = next.run(req).await;

    if let Some(value) = value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// 请求日志中间件
pub async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let start_time = Instant::now();

    let request_id = request_id_from_headers(req.headers());

    tracing::info!(
        "Request started: {} {} - User-Agent: {} - request_id={}",
        method,
        uri,
        user_agent,
        request_id
    );

    let response = next.run(req).await;

    tracing::info!(
        "Request completed: {} {} - {} - {:.3}ms - request_id={}",
        method,
        uri,
        response.status(),
        start_time.elapsed().as_secs_f64() * 1000.0,
        request_id
    );

    response
}

/// 安全头中间件
pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    response
}

use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

/// 记录每个请求命中的路由，服务端错误时连同响应内容一起记录
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    info!("current router path is {} {}", req.method(), req.uri().path());

    let response = next.run(req).await;

    if response.status().is_server_error() {
        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, 1024).await {
            Ok(b) => b,
            Err(e) => {
                error!("读取错误响应内容失败: {}", e);
                return Response::from_parts(parts, Body::empty());
            }
        };
        error!(
            "服务端错误 - Status: {}, Body: {}",
            parts.status,
            String::from_utf8_lossy(&bytes)
        );

        // 重新装回body后返回
        parts.headers.remove(axum::http::header::CONTENT_LENGTH);
        Response::from_parts(parts, Body::from(bytes))
    } else {
        response
    }
}

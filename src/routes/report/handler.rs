use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::middleware::{perm, require_permission};
use crate::utils::{Claims, error_to_api_response, status_codes, success_to_api_response};

use super::model::{ReportRow, build_report};

/// 获取数据报表
#[axum::debug_handler]
pub async fn get_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::REPORT_VIEW).await {
        return denied;
    }

    let rows = match ReportRow::load_all(&state.pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("查询报表数据出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "获取数据报表失败".to_string()),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        success_to_api_response(build_report(&rows), "获取数据报表成功".to_string()),
    )
        .into_response()
}

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::middleware::{perm, require_permission};
use crate::utils::{Claims, error_to_api_response, status_codes, success_to_api_response};

use super::model::{PermissionRow, build_rights_tree, flatten_rights};

/// 获取权限列表，type 为 list 时返回平铺结构，为 tree 时返回树形结构
#[axum::debug_handler]
pub async fn get_rights_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(display_type): Path<String>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::RIGHTS_LIST).await {
        return denied;
    }

    match display_type.as_str() {
        "list" => match PermissionRow::load_all(&state.pool).await {
            // 查不到记录时 data 输出 null，tree 形式则输出空数组
            Ok(rows) => {
                let rights = flatten_rights(&rows);
                (
                    StatusCode::OK,
                    success_to_api_response(
                        (!rights.is_empty()).then_some(rights),
                        "获取权限列表成功".to_string(),
                    ),
                )
                    .into_response()
            }
            Err(e) => {
                tracing::error!("查询权限列表出错: {}", e);
                (
                    StatusCode::OK,
                    error_to_api_response::<()>(
                        status_codes::BAD_REQUEST,
                        "查询执行错误".to_string(),
                    ),
                )
                    .into_response()
            }
        },
        "tree" => match PermissionRow::load_all(&state.pool).await {
            Ok(rows) => (
                StatusCode::OK,
                success_to_api_response(build_rights_tree(&rows), "获取权限列表成功".to_string()),
            )
                .into_response(),
            Err(e) => {
                tracing::error!("查询权限树出错: {}", e);
                (
                    StatusCode::OK,
                    error_to_api_response::<()>(
                        status_codes::BAD_REQUEST,
                        "查询执行错误".to_string(),
                    ),
                )
                    .into_response()
            }
        },
        _ => (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "显示类型参数错误".to_string()),
        )
            .into_response(),
    }
}

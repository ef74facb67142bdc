use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::utils::{error_to_api_response, status_codes, success_to_api_response};

use super::model::build_menus;

/// 获取当前用户的侧边菜单。登录后的用户都能访问，不做权限区分。
#[axum::debug_handler]
pub async fn get_menus(State(state): State<AppState>) -> Response {
    match build_menus(&state.pool).await {
        Ok(menus) => (
            StatusCode::OK,
            success_to_api_response(menus, "获取菜单列表成功".to_string()),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("查询菜单出错: {}", e);
            (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::INTERNAL_ERROR,
                    "查询数据库时出现错误".to_string(),
                ),
            )
                .into_response()
        }
    }
}

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::routes::user::model::Manager;
use crate::utils::{
    error_to_api_response, generate_token, parse_json_lenient, status_codes,
    success_to_api_response, verify_password,
};

use super::model::{LoginData, LoginParams};

/// 登录接口。请求体解析失败时按空参数处理，由格式校验拦下。
#[axum::debug_handler]
pub async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    let params: LoginParams = parse_json_lenient(&body);
    if !params.is_well_formed() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::UNPROCESSABLE,
                "用户名或密码格式错误".to_string(),
            ),
        )
            .into_response();
    }

    let manager = match Manager::find_by_name(&state.pool, &params.username).await {
        Ok(Some(manager)) => manager,
        Ok(None) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "用户不存在".to_string()),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("查询管理员 {} 出错: {}", params.username, e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "用户不存在".to_string()),
            )
                .into_response();
        }
    };

    // 校验过程出错与密码不匹配同样处理
    let password_ok = verify_password(&params.password, &manager.mg_pwd).unwrap_or(false);
    if !password_ok {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "密码错误".to_string()),
        )
            .into_response();
    }

    let token = match generate_token(&manager.mg_name, &state.config) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("为用户 {} 生成令牌出错: {}", manager.mg_name, e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::INTERNAL_ERROR,
                    "生成令牌失败".to_string(),
                ),
            )
                .into_response();
        }
    };

    tracing::info!("用户 {} 登录成功", manager.mg_name);
    (
        StatusCode::OK,
        success_to_api_response(
            LoginData {
                id: manager.mg_id,
                rid: manager.role_id,
                username: manager.mg_name,
                mobile: manager.mg_mobile,
                email: manager.mg_email,
                token: format!("Bearer {}", token),
            },
            "登陆成功".to_string(),
        ),
    )
        .into_response()
}

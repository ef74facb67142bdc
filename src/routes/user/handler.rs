use axum::{
    Extension,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::AppState;
use crate::middleware::{perm, require_permission};
use crate::routes::role::model::Role;
use crate::utils::{
    Claims, created_to_api_response, error_to_api_response, field_error, hash_password,
    parse_bool_param, parse_json_lenient, parse_json_strict, status_codes,
    success_to_api_response,
};

use super::model::{
    CreateUserParams, CreatedUserData, Manager, RoleIdParams, UpdateUserParams, UserInfoData,
    UserListData, UserStateData,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserListQuery {
    pub query: String,
    pub pagenum: Option<String>,
    pub pagesize: Option<String>,
}

/// 分页获取管理员列表，query 对用户名做模糊匹配
#[axum::debug_handler]
pub async fn get_users_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<UserListQuery>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::USER_LIST).await {
        return denied;
    }

    let pagenum = match params.pagenum.as_deref().unwrap_or("").parse::<i64>() {
        Ok(n) if n >= 1 => n,
        _ => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "pagenum 参数错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    let pagesize = match params.pagesize.as_deref().unwrap_or("").parse::<i64>() {
        Ok(n) if n >= 1 => n,
        _ => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "pagesize 参数错误".to_string(),
                ),
            )
                .into_response();
        }
    };

    let total = match Manager::count_filtered(&state.pool, &params.query).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!("查询管理员总数出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "查询总记录数出错".to_string(),
                ),
            )
                .into_response();
        }
    };
    let users = match Manager::list_page(&state.pool, &params.query, pagenum, pagesize).await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!("查询管理员列表出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "查询管理员列表出错".to_string(),
                ),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        success_to_api_response(
            UserListData {
                total,
                pagenum,
                users,
            },
            "获取管理员列表成功".to_string(),
        ),
    )
        .into_response()
}

/// 启用或停用管理员，type 段接受 1/0/t/f/true/false 等写法
#[axum::debug_handler]
pub async fn put_user_state(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((u_id, state_type)): Path<(String, String)>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::USER_STATE).await {
        return denied;
    }

    let Ok(mg_id) = u_id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "uId参数错误".to_string()),
        )
            .into_response();
    };
    let Some(enabled) = parse_bool_param(&state_type) else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "type参数错误".to_string()),
        )
            .into_response();
    };

    let manager = match Manager::find_by_id(&state.pool, mg_id).await {
        Ok(Some(manager)) => manager,
        Ok(None) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "管理员ID不存在".to_string(),
                ),
            )
                .into_response();
        }
    };

    let mg_state: i16 = if enabled { 1 } else { 0 };
    if let Err(e) = Manager::update_state(&state.pool, mg_id, mg_state).await {
        tracing::error!("修改管理员 {} 状态出错: {}", mg_id, e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "修改执行出错".to_string()),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response(
            UserStateData {
                id: manager.mg_id,
                rid: manager.role_id,
                username: manager.mg_name,
                mobile: manager.mg_mobile,
                email: manager.mg_email,
                mg_state,
            },
            "设置状态成功".to_string(),
        ),
    )
        .into_response()
}

/// 新增管理员。请求体解析失败时按零值处理，交给字段校验报错。
#[axum::debug_handler]
pub async fn add_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::USER_ADD).await {
        return denied;
    }

    let params: CreateUserParams = parse_json_lenient(&body);
    if let Err(msg) = params.validate() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, msg),
        )
            .into_response();
    }

    match Manager::exists_by_name(&state.pool, &params.username).await {
        Ok(true) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "用户名已存在".to_string()),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("查询用户名出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "添加执行出错".to_string()),
            )
                .into_response();
        }
    }

    let mg_pwd = match hash_password(&params.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("生成密码散列出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "添加执行出错".to_string()),
            )
                .into_response();
        }
    };

    match Manager::insert(
        &state.pool,
        &params.username,
        &mg_pwd,
        Utc::now().timestamp(),
        &params.mobile,
        &params.email,
    )
    .await
    {
        Ok(manager) => (
            StatusCode::OK,
            created_to_api_response(
                CreatedUserData {
                    id: manager.mg_id,
                    username: manager.mg_name,
                    mobile: manager.mg_mobile,
                    email: manager.mg_email,
                    role_id: manager.role_id,
                    create_time: manager.mg_time,
                },
                "创建成功".to_string(),
            ),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("插入管理员出错: {}", e);
            (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "添加执行出错".to_string()),
            )
                .into_response()
        }
    }
}

#[axum::debug_handler]
pub async fn get_user_info(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::USER_INFO).await {
        return denied;
    }

    let Ok(mg_id) = id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "请检查id参数".to_string()),
        )
            .into_response();
    };

    match Manager::find_by_id(&state.pool, mg_id).await {
        Ok(Some(manager)) => (
            StatusCode::OK,
            success_to_api_response(
                UserInfoData::from_manager(&manager),
                "获取用户信息成功".to_string(),
            ),
        )
            .into_response(),
        Ok(None) | Err(_) => (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "用户不存在".to_string()),
        )
            .into_response(),
    }
}

/// 修改管理员的邮箱和手机号
#[axum::debug_handler]
pub async fn update_user_info(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::USER_EDIT).await {
        return denied;
    }

    let Ok(mg_id) = id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "请检查id参数".to_string()),
        )
            .into_response();
    };

    let params: UpdateUserParams = parse_json_lenient(&body);
    if let Err(msg) = params.validate() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, msg),
        )
            .into_response();
    }

    if let Err(e) = Manager::update_contact(&state.pool, mg_id, &params.email, &params.mobile).await
    {
        tracing::error!("修改管理员 {} 信息出错: {}", mg_id, e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "修改用户信息失败".to_string()),
        )
            .into_response();
    }

    // 改完回读一次，返回数据库里的最新值
    match Manager::find_by_id(&state.pool, mg_id).await {
        Ok(Some(manager)) => (
            StatusCode::OK,
            success_to_api_response(UserInfoData::from_manager(&manager), "更新成功".to_string()),
        )
            .into_response(),
        Ok(None) | Err(_) => (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "查询用户信息失败".to_string()),
        )
            .into_response(),
    }
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::USER_DELETE).await {
        return denied;
    }

    let Ok(mg_id) = id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "请检查id参数".to_string()),
        )
            .into_response();
    };

    match Manager::delete(&state.pool, mg_id).await {
        Ok(0) => (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "用户id不存在".to_string()),
        )
            .into_response(),
        Ok(_) => (
            StatusCode::OK,
            success_to_api_response((), "删除成功".to_string()),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("删除管理员 {} 出错: {}", mg_id, e);
            (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "删除执行错误".to_string()),
            )
                .into_response()
        }
    }
}

/// 给管理员分配角色。rid 必须是已存在的角色 id。
#[axum::debug_handler]
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::USER_ASSIGN_ROLE).await {
        return denied;
    }

    let Ok(mg_id) = id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "管理员id格式错误".to_string()),
        )
            .into_response();
    };

    let manager = match Manager::find_by_id(&state.pool, mg_id).await {
        Ok(Some(manager)) => manager,
        Ok(None) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "管理员id不存在".to_string(),
                ),
            )
                .into_response();
        }
    };

    let params: RoleIdParams = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "请求体中不包含角色id或角色id不是整数".to_string(),
                ),
            )
                .into_response();
        }
    };
    if params.rid == 0 {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                field_error("Rid", "Can not be empty"),
            ),
        )
            .into_response();
    }
    match Role::find_by_id(&state.pool, params.rid).await {
        Ok(Some(_)) => {}
        Ok(None) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    field_error("Rid", "角色id不存在"),
                ),
            )
                .into_response();
        }
    }

    if let Err(e) = Manager::update_role(&state.pool, mg_id, params.rid).await {
        tracing::error!("更新管理员 {} 角色出错: {}", mg_id, e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "更新执行错误".to_string()),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response(
            UserInfoData {
                id: manager.mg_id,
                rid: params.rid,
                username: manager.mg_name,
                mobile: manager.mg_mobile,
                email: manager.mg_email,
            },
            "设置角色成功".to_string(),
        ),
    )
        .into_response()
}

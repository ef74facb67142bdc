use axum::{
    Extension,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::middleware::{perm, require_permission};
use crate::routes::rights::model::{PermissionRow, build_role_subtree, validate_rids};
use crate::utils::{
    Claims, error_to_api_response, parse_json_strict, status_codes, success_to_api_response,
};

use super::model::{AssignRightsParams, Role, RoleInfo, RoleListItem, RoleParams};

/// 获取角色列表，每个角色带上它拥有的权限树。
/// 权限串里没有根权限 0 的角色视为没有任何权限。
#[axum::debug_handler]
pub async fn get_roles_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ROLE_LIST).await {
        return denied;
    }

    let roles = match Role::list_all(&state.pool).await {
        Ok(roles) => roles,
        Err(e) => {
            tracing::error!("查询角色列表出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "查询执行失败".to_string()),
            )
                .into_response();
        }
    };
    let rows = match PermissionRow::load_all(&state.pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("查询权限记录出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "查询执行失败".to_string()),
            )
                .into_response();
        }
    };

    let list: Vec<RoleListItem> = roles
        .into_iter()
        .map(|role| {
            let rights = role.rights();
            let children = if rights.contains_id(0) {
                build_role_subtree(&rows, &rights)
            } else {
                Vec::new()
            };
            RoleListItem {
                id: role.role_id,
                role_name: role.role_name,
                role_desc: role.role_desc,
                children,
            }
        })
        .collect();

    // 一个角色都没有时 data 输出 null，children 为空输出的才是空数组
    (
        StatusCode::OK,
        success_to_api_response(
            (!list.is_empty()).then_some(list),
            "获取角色列表成功".to_string(),
        ),
    )
        .into_response()
}

#[axum::debug_handler]
pub async fn add_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ROLE_ADD).await {
        return denied;
    }

    let params: RoleParams = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "请求体中参数错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    if params.role_name.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色名称不能为空".to_string()),
        )
            .into_response();
    }

    match Role::exists_by_name(&state.pool, &params.role_name).await {
        Ok(true) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "角色名称已存在".to_string(),
                ),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("查询角色名称出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "添加执行错误".to_string()),
            )
                .into_response();
        }
    }

    match Role::insert(&state.pool, &params.role_name, &params.role_desc).await {
        Ok(role) => (
            StatusCode::OK,
            success_to_api_response(
                RoleInfo {
                    role_id: role.role_id,
                    role_name: role.role_name,
                    role_desc: role.role_desc,
                },
                "添加角色成功".to_string(),
            ),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("插入角色出错: {}", e);
            (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "添加执行错误".to_string()),
            )
                .into_response()
        }
    }
}

#[axum::debug_handler]
pub async fn update_role_info(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ROLE_EDIT).await {
        return denied;
    }

    let Ok(role_id) = id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色id错误".to_string()),
        )
            .into_response();
    };
    let params: RoleParams = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "请求体中参数错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    if params.role_name.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色名称不能为空".to_string()),
        )
            .into_response();
    }

    match Role::find_by_id(&state.pool, role_id).await {
        Ok(Some(_)) => {}
        Ok(None) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色id不存在".to_string()),
            )
                .into_response();
        }
    }

    if let Err(e) =
        Role::update_info(&state.pool, role_id, &params.role_name, &params.role_desc).await
    {
        tracing::error!("更新角色 {} 出错: {}", role_id, e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "更新执行出错".to_string()),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response(
            RoleInfo {
                role_id,
                role_name: params.role_name,
                role_desc: params.role_desc,
            },
            "更新角色信息成功".to_string(),
        ),
    )
        .into_response()
}

#[axum::debug_handler]
pub async fn delete_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ROLE_DELETE).await {
        return denied;
    }

    let Ok(role_id) = id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色id错误".to_string()),
        )
            .into_response();
    };

    match Role::delete(&state.pool, role_id).await {
        Ok(0) => (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色id不存在".to_string()),
        )
            .into_response(),
        Ok(_) => (
            StatusCode::OK,
            success_to_api_response((), "删除角色成功".to_string()),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("删除角色 {} 出错: {}", role_id, e);
            (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "删除执行失败".to_string()),
            )
                .into_response()
        }
    }
}

/// 删除角色的某个权限，成功后返回该角色剩余的权限树
#[axum::debug_handler]
pub async fn delete_role_right(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((role_id, right_id)): Path<(String, String)>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::RIGHT_DELETE).await {
        return denied;
    }

    let Ok(role_id) = role_id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "参数roleId错误".to_string()),
        )
            .into_response();
    };
    let Ok(right_id) = right_id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "参数rightId错误".to_string()),
        )
            .into_response();
    };

    let role = match Role::find_by_id(&state.pool, role_id).await {
        Ok(Some(role)) => role,
        Ok(None) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色不存在".to_string()),
            )
                .into_response();
        }
    };

    let mut rights = role.rights();
    if !rights.remove_id(right_id) {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "权限不存在".to_string()),
        )
            .into_response();
    }

    if let Err(e) = Role::update_rights(&state.pool, role_id, &rights.join()).await {
        tracing::error!("更新角色 {} 权限串出错: {}", role_id, e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                "更新数据库执行出错".to_string(),
            ),
        )
            .into_response();
    }

    // 删除本身已经成功，剩余权限树查不出来只影响返回的 data。
    // 角色不再拥有任何顶级权限时 data 输出 null
    match PermissionRow::load_all(&state.pool).await {
        Ok(rows) => {
            let remaining = build_role_subtree(&rows, &rights);
            (
                StatusCode::OK,
                success_to_api_response(
                    (!remaining.is_empty()).then_some(remaining),
                    "删除权限成功".to_string(),
                ),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("查询角色 {} 剩余权限出错: {}", role_id, e);
            (
                StatusCode::OK,
                success_to_api_response((), "删除权限成功".to_string()),
            )
                .into_response()
        }
    }
}

/// 重新给角色分配权限，持久化时会在权限串前面补上根权限 0
#[axum::debug_handler]
pub async fn update_role_rights(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(role_id): Path<String>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::RIGHTS_ASSIGN).await {
        return denied;
    }

    let Ok(role_id) = role_id.parse::<i32>() else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色id参数错误".to_string()),
        )
            .into_response();
    };

    let roles = match Role::list_all(&state.pool).await {
        Ok(roles) => roles,
        Err(e) => {
            tracing::error!("查询角色列表出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "查询执行出错".to_string()),
            )
                .into_response();
        }
    };
    if !roles.iter().any(|role| role.role_id == role_id) {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "角色不存在".to_string()),
        )
            .into_response();
    }

    let params: AssignRightsParams = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "json解析错误".to_string()),
            )
                .into_response();
        }
    };

    let known_ids = match PermissionRow::all_ids(&state.pool).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("查询权限id集合出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "数据校验时发生内部错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    if let Err(reason) = validate_rids(&params.rids, &known_ids) {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                format!("错误字段：Rids，错误信息：{}", reason),
            ),
        )
            .into_response();
    }

    match Role::find_by_id(&state.pool, role_id).await {
        Ok(Some(_)) => {}
        Ok(None) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "查询角色出错".to_string()),
            )
                .into_response();
        }
    }

    let ps_ids = format!("0,{}", params.rids);
    if let Err(e) = Role::update_rights(&state.pool, role_id, &ps_ids).await {
        tracing::error!("更新角色 {} 权限串出错: {}", role_id, e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "更新字段值出错".to_string()),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response((), "更新角色权限成功".to_string()),
    )
        .into_response()
}

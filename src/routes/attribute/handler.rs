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
use crate::routes::category::model::Category;
use crate::utils::{
    Claims, created_to_api_response, error_to_api_response, parse_json_lenient, parse_json_strict,
    status_codes, success_to_api_response,
};

use super::model::{AddAttrParams, Attribute, check_sel, vals_in_body};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AttrListQuery {
    pub sel: String,
}

/// 获取某分类下的动态参数或静态属性列表
#[axum::debug_handler]
pub async fn get_attr_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Query(params): Query<AttrListQuery>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ATTR_LIST).await {
        return denied;
    }

    let cat_id = match id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "分类id格式错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    match Category::exists_by_id(&state.pool, cat_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "分类id不存在".to_string()),
            )
                .into_response();
        }
    }

    if let Err(msg) = check_sel(&params.sel) {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, msg.to_string()),
        )
            .into_response();
    }

    let attrs = match Attribute::list_by_sel(&state.pool, cat_id, &params.sel).await {
        Ok(attrs) => attrs,
        Err(e) => {
            tracing::error!("查询参数列表出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "查询参数列表出错".to_string(),
                ),
            )
                .into_response();
        }
    };

    // 查不到记录时 data 输出 null
    (
        StatusCode::OK,
        success_to_api_response(
            (!attrs.is_empty()).then_some(attrs),
            "获取参数列表成功".to_string(),
        ),
    )
        .into_response()
}

/// 给分类添加动态参数或静态属性
#[axum::debug_handler]
pub async fn add_attr(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ATTR_ADD).await {
        return denied;
    }

    let cat_id = match id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "分类id格式错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    match Category::exists_by_id(&state.pool, cat_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "分类id不存在".to_string()),
            )
                .into_response();
        }
    }

    let params: AddAttrParams = parse_json_lenient(&body);
    if params.attr_name.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "参数名称不能为空".to_string()),
        )
            .into_response();
    }
    if let Err(msg) = check_sel(&params.attr_sel) {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, msg.to_string()),
        )
            .into_response();
    }

    match Attribute::name_taken(&state.pool, cat_id, &params.attr_name, &params.attr_sel).await {
        Ok(true) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "分类参数不可重复添加".to_string(),
                ),
            )
                .into_response();
        }
        Ok(false) | Err(_) => {}
    }

    let attr = match Attribute::insert(
        &state.pool,
        cat_id,
        &params.attr_name,
        &params.attr_sel,
        &params.attr_vals,
    )
    .await
    {
        Ok(attr) => attr,
        Err(e) => {
            tracing::error!("添加参数执行出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "添加参数执行出错".to_string(),
                ),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        created_to_api_response(attr, "添加参数成功".to_string()),
    )
        .into_response()
}

/// 修改动态参数或静态属性。权限表里没有对应的权限点，这里不做权限校验
#[axum::debug_handler]
pub async fn update_attr(
    State(state): State<AppState>,
    Path((id, attr_id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let cat_id = match id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "分类id格式错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    match Category::exists_by_id(&state.pool, cat_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "分类id不存在".to_string()),
            )
                .into_response();
        }
    }

    let attr_id = match attr_id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "属性id格式错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    match Attribute::exists_in_cate(&state.pool, cat_id, attr_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "属性id不存在".to_string()),
            )
                .into_response();
        }
    }

    let params: AddAttrParams = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(e) => {
            tracing::error!("解析修改参数请求体出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "参数解析错误".to_string()),
            )
                .into_response();
        }
    };
    let has_vals = vals_in_body(&body);

    if params.attr_name.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                "新属性的名称不能为空".to_string(),
            ),
        )
            .into_response();
    }
    if let Err(msg) = check_sel(&params.attr_sel) {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, msg.to_string()),
        )
            .into_response();
    }

    match Attribute::name_taken_by_other(
        &state.pool,
        cat_id,
        attr_id,
        &params.attr_name,
        &params.attr_sel,
    )
    .await
    {
        Ok(true) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "属性名称已经存在".to_string(),
                ),
            )
                .into_response();
        }
        Ok(false) | Err(_) => {}
    }

    // 类型不允许在修改时变更
    match Attribute::sel_matches(&state.pool, attr_id, &params.attr_sel).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "属性类型错误".to_string()),
            )
                .into_response();
        }
    }

    let vals = has_vals.then_some(params.attr_vals.as_str());
    let attr = match Attribute::update(&state.pool, attr_id, &params.attr_name, vals).await {
        Ok(attr) => attr,
        Err(e) => {
            tracing::error!("修改参数执行出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "修改参数执行出错".to_string(),
                ),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        success_to_api_response(attr, "修改参数成功".to_string()),
    )
        .into_response()
}

/// 删除动态参数或静态属性，实际执行的是记删除时间的假删
#[axum::debug_handler]
pub async fn delete_attr(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, attr_id)): Path<(String, String)>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ATTR_DELETE).await {
        return denied;
    }

    let cat_id = match id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "分类id格式错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    match Category::exists_by_id(&state.pool, cat_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "分类id不存在".to_string()),
            )
                .into_response();
        }
    }

    let attr_id = match attr_id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "属性id格式错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    match Attribute::exists_in_cate(&state.pool, cat_id, attr_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "属性id不存在".to_string()),
            )
                .into_response();
        }
    }

    if let Err(e) = Attribute::mark_deleted(&state.pool, attr_id, Utc::now().timestamp()).await {
        tracing::error!("删除参数执行出错: {}", e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "删除参数执行出错".to_string()),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response((), "删除参数成功".to_string()),
    )
        .into_response()
}

use axum::{
    Extension,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::AppState;
use crate::middleware::{perm, require_permission};
use crate::utils::{
    Claims, created_to_api_response, error_to_api_response, parse_json_lenient, parse_json_strict,
    status_codes, success_to_api_response,
};

use super::model::{AddCateParams, Category, UpdateCateParams, build_cate_page, build_cate_tree};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CateListQuery {
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub pagenum: Option<String>,
    pub pagesize: Option<String>,
}

/// 获取商品分类列表。pagenum 和 pagesize 有一个没传或为 0 时返回整棵树，
/// 否则按顶级分类分页返回
#[axum::debug_handler]
pub async fn get_cate_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<CateListQuery>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::CATE_LIST).await {
        return denied;
    }

    // 三个参数都允许缺省，缺省按 0 处理
    let ty = match params.ty.as_deref().unwrap_or("") {
        "" => 0,
        raw => match raw.parse::<i32>() {
            Ok(v) if (0..=3).contains(&v) => v,
            _ => {
                return (
                    StatusCode::OK,
                    error_to_api_response::<()>(
                        status_codes::BAD_REQUEST,
                        "type参数错误".to_string(),
                    ),
                )
                    .into_response();
            }
        },
    };
    let pagenum = match params.pagenum.as_deref().unwrap_or("") {
        "" => 0,
        raw => match raw.parse::<i64>() {
            Ok(v) if v >= 0 => v,
            _ => {
                return (
                    StatusCode::OK,
                    error_to_api_response::<()>(
                        status_codes::BAD_REQUEST,
                        "pagenum参数错误".to_string(),
                    ),
                )
                    .into_response();
            }
        },
    };
    let pagesize = match params.pagesize.as_deref().unwrap_or("") {
        "" => 0,
        raw => match raw.parse::<i64>() {
            Ok(v) if v >= 0 => v,
            _ => {
                return (
                    StatusCode::OK,
                    error_to_api_response::<()>(
                        status_codes::BAD_REQUEST,
                        "pagesize参数错误".to_string(),
                    ),
                )
                    .into_response();
            }
        },
    };

    if pagenum == 0 || pagesize == 0 {
        let rows = match Category::load_all(&state.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("查询分类列表出错: {}", e);
                return (
                    StatusCode::OK,
                    error_to_api_response::<()>(
                        status_codes::BAD_REQUEST,
                        "获取不带分页参数的商品分类列表时出错".to_string(),
                    ),
                )
                    .into_response();
            }
        };
        return (
            StatusCode::OK,
            success_to_api_response(
                build_cate_tree(&rows, 0, ty),
                "获取商品分类列表成功".to_string(),
            ),
        )
            .into_response();
    }

    let rows = match Category::load_all(&state.pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("查询分类列表出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "获取带分页参数的商品分类列表时出错".to_string(),
                ),
            )
                .into_response();
        }
    };
    (
        StatusCode::OK,
        success_to_api_response(
            build_cate_page(&rows, ty, pagenum, pagesize),
            "获取商品分类列表成功".to_string(),
        ),
    )
        .into_response()
}

/// 添加商品分类
#[axum::debug_handler]
pub async fn add_cate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::CATE_ADD).await {
        return denied;
    }

    let params: AddCateParams = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(e) => {
            tracing::error!("解析添加分类请求体出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "请求参数错误".to_string()),
            )
                .into_response();
        }
    };

    if let Err(msg) = params.validate_fields() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, msg),
        )
            .into_response();
    }
    if let Err(msg) = params.validate_refs(&state.pool).await {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, msg),
        )
            .into_response();
    }

    let cate = match Category::insert(
        &state.pool,
        &params.cat_name,
        params.cat_pid,
        params.cat_level,
    )
    .await
    {
        Ok(cate) => cate,
        Err(e) => {
            tracing::error!("插入分类出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "添加执行错误".to_string()),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        created_to_api_response(cate, "添加分类成功".to_string()),
    )
        .into_response()
}

/// 修改分类名称
#[axum::debug_handler]
pub async fn update_cate_name(
    State(state): State<AppState>,
    Path(id): Path<String>,
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

    let mut cate = match Category::find_by_id(&state.pool, cat_id).await {
        Ok(Some(cate)) => cate,
        Ok(None) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "分类id不存在".to_string()),
            )
                .into_response();
        }
    };

    let params: UpdateCateParams = parse_json_lenient(&body);
    if params.cat_name.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "分类名称不能为空".to_string()),
        )
            .into_response();
    }

    if let Err(e) = Category::update_name(&state.pool, cat_id, &params.cat_name).await {
        tracing::error!("修改分类名称出错: {}", e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "修改分类名称出错".to_string()),
        )
            .into_response();
    }

    cate.cat_name = params.cat_name;
    (
        StatusCode::OK,
        success_to_api_response(cate, "分类名称修改成功".to_string()),
    )
        .into_response()
}

/// 删除分类，实际执行的是改删除标记的假删
#[axum::debug_handler]
pub async fn delete_cate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::CATE_DELETE).await {
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

    match Category::find_by_id(&state.pool, cat_id).await {
        Ok(Some(_)) => {}
        Ok(None) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "分类id不存在".to_string()),
            )
                .into_response();
        }
    }

    if let Err(e) = Category::mark_deleted(&state.pool, cat_id).await {
        tracing::error!("修改分类删除标记出错: {}", e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "修改执行出错".to_string()),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response((), "删除分类成功".to_string()),
    )
        .into_response()
}

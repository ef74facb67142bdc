use axum::{
    Extension,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::middleware::{perm, require_permission};
use crate::utils::{
    Claims, error_to_api_response, parse_json_strict, status_codes, success_to_api_response,
};

use super::model::{
    AddGoodBody, Goods, GoodsInfoData, GoodsListData, UploadData, add_good, check_picture,
    disk_path,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GoodsListQuery {
    pub query: String,
    pub pagenum: Option<String>,
    pub pagesize: Option<String>,
}

/// 分页获取商品列表，query 对商品名做模糊匹配
#[axum::debug_handler]
pub async fn get_goods_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<GoodsListQuery>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::GOODS_LIST).await {
        return denied;
    }

    let pagenum = match params.pagenum.as_deref().unwrap_or("").parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "pagenum为空或类型错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    let pagesize = match params.pagesize.as_deref().unwrap_or("").parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    status_codes::BAD_REQUEST,
                    "pagesize为空或类型错误".to_string(),
                ),
            )
                .into_response();
        }
    };
    if pagenum <= 0 {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                "pagenum必须大于0".to_string(),
            ),
        )
            .into_response();
    }
    if pagesize <= 0 {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                "pagesize必须大于0".to_string(),
            ),
        )
            .into_response();
    }

    let total = match Goods::count_filtered(&state.pool, &params.query).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!("统计商品总数出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "查询执行出错".to_string()),
            )
                .into_response();
        }
    };
    let goods = match Goods::list_page(&state.pool, &params.query, pagenum, pagesize).await {
        Ok(goods) => goods,
        Err(e) => {
            tracing::error!("查询商品列表出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "查询执行出错".to_string()),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        success_to_api_response(
            GoodsListData {
                total,
                pagenum,
                goods,
            },
            "获取商品数据列表成功".to_string(),
        ),
    )
        .into_response()
}

/// 添加商品，图片和属性随主记录一起入库
#[axum::debug_handler]
pub async fn add_goods(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::GOODS_ADD).await {
        return denied;
    }

    let params: AddGoodBody = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(e) => {
            tracing::error!("解析添加商品请求体出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "参数解析错误".to_string()),
            )
                .into_response();
        }
    };

    let detail = match add_good(
        &state.pool,
        &state.config.static_dir,
        &state.config.public_base_url,
        params,
    )
    .await
    {
        Ok(detail) => detail,
        Err(e) => {
            tracing::error!("添加商品出错: {:?}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "添加商品失败".to_string()),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        success_to_api_response(detail, "添加商品成功".to_string()),
    )
        .into_response()
}

/// 修改商品信息
#[axum::debug_handler]
pub async fn update_good_info(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::GOODS_EDIT).await {
        return denied;
    }

    let goods_id = match id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "商品id错误".to_string()),
            )
                .into_response();
        }
    };
    match Goods::exists_by_id(&state.pool, goods_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "商品id不存在".to_string()),
            )
                .into_response();
        }
    }

    let params: Goods = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(e) => {
            tracing::error!("解析修改商品请求体出错: {}", e);
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
    if params.goods_name.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                "商品名称不能为空".to_string(),
            ),
        )
            .into_response();
    }

    let updated =
        match Goods::update_info(&state.pool, goods_id, &params, Utc::now().timestamp()).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!("修改商品出错: {}", e);
                return (
                    StatusCode::OK,
                    error_to_api_response::<()>(
                        status_codes::BAD_REQUEST,
                        "修改商品失败".to_string(),
                    ),
                )
                    .into_response();
            }
        };

    (
        StatusCode::OK,
        success_to_api_response(
            GoodsInfoData {
                goods_name: updated.goods_name,
                goods_price: updated.goods_price,
                goods_weight: updated.goods_weight,
            },
            "修改商品成功".to_string(),
        ),
    )
        .into_response()
}

/// 删除商品，实际是改删除标记的假删
#[axum::debug_handler]
pub async fn delete_good(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::GOODS_DELETE).await {
        return denied;
    }

    let goods_id = match id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "商品id错误".to_string()),
            )
                .into_response();
        }
    };
    match Goods::exists_by_id(&state.pool, goods_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "商品id不存在".to_string()),
            )
                .into_response();
        }
    }

    if let Err(e) = Goods::mark_deleted(&state.pool, goods_id, Utc::now().timestamp()).await {
        tracing::error!("删除商品出错: {}", e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(status_codes::BAD_REQUEST, "删除商品失败".to_string()),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response((), "删除商品成功".to_string()),
    )
        .into_response()
}

/// 上传图片。表单字段名固定为 uploadPicture，原图存进静态目录后
/// 返回临时路径，缩略图在添加商品时才生成
#[axum::debug_handler]
pub async fn upload_picture(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::UPLOAD).await {
        return denied;
    }

    let mut picture: Option<(String, Bytes)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("uploadPicture") {
                    continue;
                }
                let file_name = field.file_name().unwrap_or("").to_string();
                match field.bytes().await {
                    Ok(data) => {
                        picture = Some((file_name, data));
                        break;
                    }
                    Err(e) => {
                        tracing::error!("读取上传文件出错: {}", e);
                        return (
                            StatusCode::OK,
                            error_to_api_response::<()>(
                                status_codes::BAD_REQUEST,
                                "读取文件时出错".to_string(),
                            ),
                        )
                            .into_response();
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!("解析上传表单出错: {}", e);
                return (
                    StatusCode::OK,
                    error_to_api_response::<()>(
                        status_codes::BAD_REQUEST,
                        "获取文件头时出错".to_string(),
                    ),
                )
                    .into_response();
            }
        }
    }
    let Some((file_name, data)) = picture else {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                "获取文件头时出错".to_string(),
            ),
        )
            .into_response();
    };
    tracing::info!("上传文件 {} 大小：{}B", file_name, data.len());

    let ext = match check_picture(&file_name, data.len()) {
        Ok(ext) => ext,
        Err(msg) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, msg.to_string()),
            )
                .into_response();
        }
    };

    let tmp_path = format!("/static/img/{}{}", Uuid::new_v4().simple(), ext);
    let target = disk_path(&state.config.static_dir, &tmp_path);
    let save_result = async {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &data).await
    }
    .await;
    if let Err(e) = save_result {
        tracing::error!("存储上传文件出错: {}", e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                format!("存储文件错误：{}", e),
            ),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response(
            UploadData {
                url: format!("{}{}", state.config.public_base_url, tmp_path),
                tmp_path,
            },
            "上传图片成功".to_string(),
        ),
    )
        .into_response()
}

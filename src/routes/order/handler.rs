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
    Claims, error_to_api_response, parse_json_strict, status_codes, success_to_api_response,
};

use super::model::{AddrData, Order, OrderListData};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderListQuery {
    pub query: String,
    pub pagenum: Option<String>,
    pub pagesize: Option<String>,
}

/// 分页获取订单列表，query 对订单编号做模糊匹配
#[axum::debug_handler]
pub async fn get_orders_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<OrderListQuery>,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ORDER_LIST).await {
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

    let total = match Order::count_filtered(&state.pool, &params.query).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!("统计订单总数出错: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "查询执行出错".to_string()),
            )
                .into_response();
        }
    };
    let orders = match Order::list_page(&state.pool, &params.query, pagenum, pagesize).await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::error!("查询订单列表出错: {}", e);
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
            OrderListData {
                total,
                pagenum,
                orders,
            },
            "获取订单数据列表成功".to_string(),
        ),
    )
        .into_response()
}

/// 修改订单的收货地址
#[axum::debug_handler]
pub async fn update_order_addr(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<String>,
    body: Bytes,
) -> Response {
    if let Some(denied) = require_permission(&state, &claims, perm::ORDER_EDIT).await {
        return denied;
    }

    let order_id = match order_id.parse::<i32>() {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "订单id错误".to_string()),
            )
                .into_response();
        }
    };
    match Order::exists_by_id(&state.pool, order_id).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(status_codes::BAD_REQUEST, "订单id不存在".to_string()),
            )
                .into_response();
        }
    }

    let params: Order = match parse_json_strict(&body) {
        Ok(params) => params,
        Err(e) => {
            tracing::error!("解析修改订单请求体出错: {}", e);
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
    if params.consignee_addr.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                "订单地址不能为空".to_string(),
            ),
        )
            .into_response();
    }

    if let Err(e) = Order::update_addr(&state.pool, order_id, &params.consignee_addr).await {
        tracing::error!("修改订单地址出错: {}", e);
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                status_codes::BAD_REQUEST,
                "修改订单地址失败".to_string(),
            ),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        success_to_api_response(
            AddrData {
                order_id,
                consignee_addr: params.consignee_addr,
            },
            "修改订单地址成功".to_string(),
        ),
    )
        .into_response()
}

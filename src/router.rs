use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::AppState;
use crate::middleware::{auth_middleware, log_requests};
use crate::routes;

/// 组装全部路由：/login 公开，其余接口都挂在鉴权中间件后面，
/// 业务接口统一嵌在配置的基准路径下，上传的图片经 /static 对外
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/login", post(routes::login::login));

    let protected_routes = Router::new()
        // 左侧菜单
        .route("/menus", get(routes::menu::get_menus))
        // 用户管理
        .route(
            "/users",
            get(routes::user::get_users_list).post(routes::user::add_user),
        )
        .route("/users/{id}/state/{type}", put(routes::user::put_user_state))
        .route(
            "/users/{id}",
            get(routes::user::get_user_info)
                .put(routes::user::update_user_info)
                .delete(routes::user::delete_user),
        )
        .route("/users/{id}/role", put(routes::user::update_user_role))
        // 权限列表与角色管理
        .route("/rights/{type}", get(routes::rights::get_rights_list))
        .route(
            "/roles",
            get(routes::role::get_roles_list).post(routes::role::add_role),
        )
        .route(
            "/roles/{id}",
            put(routes::role::update_role_info).delete(routes::role::delete_role),
        )
        .route(
            "/roles/{id}/rights/{rightId}",
            delete(routes::role::delete_role_right),
        )
        .route("/roles/{id}/rights", post(routes::role::update_role_rights))
        // 商品分类
        .route(
            "/categories",
            get(routes::category::get_cate_list).post(routes::category::add_cate),
        )
        .route(
            "/categories/{id}",
            put(routes::category::update_cate_name).delete(routes::category::delete_cate),
        )
        // 分类下的动态、静态参数
        .route(
            "/categories/{id}/attributes",
            get(routes::attribute::get_attr_list).post(routes::attribute::add_attr),
        )
        .route(
            "/categories/{id}/attributes/{attrId}",
            put(routes::attribute::update_attr).delete(routes::attribute::delete_attr),
        )
        // 商品
        .route(
            "/goods",
            get(routes::goods::get_goods_list).post(routes::goods::add_goods),
        )
        .route(
            "/goods/{id}",
            put(routes::goods::update_good_info).delete(routes::goods::delete_good),
        )
        .route("/upload", post(routes::goods::upload_picture))
        // 订单
        .route("/orders", get(routes::order::get_orders_list))
        .route("/orders/{id}", put(routes::order::update_order_addr))
        // 数据报表
        .route("/reports/type/1", get(routes::report::get_report))
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest(
            &state.config.api_base_uri.clone(),
            Router::new().merge(public_routes).merge(protected_routes),
        )
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(state)
}

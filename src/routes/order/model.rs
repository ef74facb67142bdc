use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// sp_order 表实体，列表接口整行返回。
/// 修改地址时请求体也按这套字段解析
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Order {
    pub order_id: i32,
    pub user_id: i32,
    pub order_number: String,
    pub order_price: f64,
    pub order_pay: String,
    pub is_send: String,
    pub trade_no: String,
    pub order_fapiao_title: String,
    pub order_fapiao_content: String,
    pub consignee_addr: String,
    pub pay_status: String,
    pub create_time: i64,
    pub update_time: i64,
}

const ORDER_COLUMNS: &str = r#"
    order_id, user_id, order_number, order_price, order_pay, is_send, trade_no,
    order_fapiao_title, order_fapiao_content, consignee_addr, pay_status,
    create_time, update_time
"#;

impl Order {
    /// 统计订单数，query 非空时按订单编号模糊匹配
    pub async fn count_filtered(pool: &PgPool, query: &str) -> Result<i64, sqlx::Error> {
        if query.trim_matches(' ').is_empty() {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sp_order")
                .fetch_one(pool)
                .await
        } else {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sp_order WHERE order_number ILIKE $1",
            )
            .bind(format!("%{}%", query))
            .fetch_one(pool)
            .await
        }
    }

    /// 分页取订单，新订单排前面
    pub async fn list_page(
        pool: &PgPool,
        query: &str,
        pagenum: i64,
        pagesize: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let offset = (pagenum - 1) * pagesize;
        if query.trim_matches(' ').is_empty() {
            sqlx::query_as::<_, Order>(&format!(
                r#"
                SELECT {ORDER_COLUMNS}
                FROM sp_order
                ORDER BY order_id DESC
                LIMIT $1 OFFSET $2
                "#
            ))
            .bind(pagesize)
            .bind(offset)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as::<_, Order>(&format!(
                r#"
                SELECT {ORDER_COLUMNS}
                FROM sp_order
                WHERE order_number ILIKE $1
                ORDER BY order_id DESC
                LIMIT $2 OFFSET $3
                "#
            ))
            .bind(format!("%{}%", query))
            .bind(pagesize)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }

    pub async fn exists_by_id(pool: &PgPool, order_id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sp_order WHERE order_id = $1)",
        )
        .bind(order_id)
        .fetch_one(pool)
        .await
    }

    /// 只更新收货地址这一列
    pub async fn update_addr(
        pool: &PgPool,
        order_id: i32,
        consignee_addr: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sp_order SET consignee_addr = $1 WHERE order_id = $2")
            .bind(consignee_addr)
            .bind(order_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// 订单列表响应体
#[derive(Debug, Serialize)]
pub struct OrderListData {
    pub total: i64,
    pub pagenum: i64,
    pub orders: Vec<Order>,
}

/// 修改地址后回显的数据
#[derive(Debug, Serialize)]
pub struct AddrData {
    pub order_id: i32,
    pub consignee_addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_fills_missing_fields_with_defaults() {
        let order: Order =
            serde_json::from_slice(r#"{"consignee_addr":"北京市朝阳区"}"#.as_bytes()).unwrap();
        assert_eq!(order.consignee_addr, "北京市朝阳区");
        assert_eq!(order.order_id, 0);
        assert_eq!(order.order_number, "");
    }

    #[test]
    fn update_body_rejects_wrong_types() {
        let result = serde_json::from_slice::<Order>(br#"{"consignee_addr":123}"#);
        assert!(result.is_err());
    }

    #[test]
    fn order_serializes_every_column() {
        let order = Order {
            order_id: 55,
            order_number: "20170213-046".to_string(),
            ..Order::default()
        };
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["order_id"], 55);
        assert_eq!(value["order_number"], "20170213-046");
        assert!(value.get("pay_status").is_some());
        assert!(value.get("trade_no").is_some());
    }
}

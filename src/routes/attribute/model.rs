use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::utils::parse_json_strict;

/// sp_attribute 表实体。delete_time 只用作假删标记，不返回给前端
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Attribute {
    pub attr_id: i32,
    pub attr_name: String,
    pub cat_id: i32,
    pub attr_sel: String,
    pub attr_write: String,
    pub attr_vals: String,
    #[serde(skip)]
    pub delete_time: Option<i64>,
}

impl Attribute {
    /// 列出某分类下指定类型的参数，已假删的不算
    pub async fn list_by_sel(
        pool: &PgPool,
        cat_id: i32,
        attr_sel: &str,
    ) -> Result<Vec<Attribute>, sqlx::Error> {
        sqlx::query_as::<_, Attribute>(
            r#"
            SELECT attr_id, attr_name, cat_id, attr_sel, attr_write, attr_vals, delete_time
            FROM sp_attribute
            WHERE cat_id = $1 AND delete_time IS NULL AND attr_sel = $2
            ORDER BY attr_id
            "#,
        )
        .bind(cat_id)
        .bind(attr_sel)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, attr_id: i32) -> Result<Option<Attribute>, sqlx::Error> {
        sqlx::query_as::<_, Attribute>(
            r#"
            SELECT attr_id, attr_name, cat_id, attr_sel, attr_write, attr_vals, delete_time
            FROM sp_attribute
            WHERE attr_id = $1
            "#,
        )
        .bind(attr_id)
        .fetch_optional(pool)
        .await
    }

    /// 同一分类同一类型下的重名检查，已假删的参数也算占用名称
    pub async fn name_taken(
        pool: &PgPool,
        cat_id: i32,
        attr_name: &str,
        attr_sel: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sp_attribute
                WHERE attr_name = $1 AND cat_id = $2 AND attr_sel = $3
            )
            "#,
        )
        .bind(attr_name)
        .bind(cat_id)
        .bind(attr_sel)
        .fetch_one(pool)
        .await
    }

    /// 修改时的重名检查，排除自己
    pub async fn name_taken_by_other(
        pool: &PgPool,
        cat_id: i32,
        attr_id: i32,
        attr_name: &str,
        attr_sel: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sp_attribute
                WHERE attr_id <> $1 AND attr_name = $2 AND cat_id = $3 AND attr_sel = $4
            )
            "#,
        )
        .bind(attr_id)
        .bind(attr_name)
        .bind(cat_id)
        .bind(attr_sel)
        .fetch_one(pool)
        .await
    }

    /// 属性要挂在指定分类下才算存在
    pub async fn exists_in_cate(
        pool: &PgPool,
        cat_id: i32,
        attr_id: i32,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sp_attribute WHERE cat_id = $1 AND attr_id = $2)",
        )
        .bind(cat_id)
        .bind(attr_id)
        .fetch_one(pool)
        .await
    }

    /// 检查属性现存的类型和请求里的 sel 是否一致
    pub async fn sel_matches(
        pool: &PgPool,
        attr_id: i32,
        attr_sel: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sp_attribute WHERE attr_id = $1 AND attr_sel = $2)",
        )
        .bind(attr_id)
        .bind(attr_sel)
        .fetch_one(pool)
        .await
    }

    pub async fn insert(
        pool: &PgPool,
        cat_id: i32,
        attr_name: &str,
        attr_sel: &str,
        attr_vals: &str,
    ) -> Result<Attribute, sqlx::Error> {
        // 录入方式由类型决定：only 手工填写，many 从可选值列表里选
        let attr_write = if attr_sel == "only" { "manual" } else { "list" };
        sqlx::query_as::<_, Attribute>(
            r#"
            INSERT INTO sp_attribute (attr_name, cat_id, attr_sel, attr_write, attr_vals)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING attr_id, attr_name, cat_id, attr_sel, attr_write, attr_vals, delete_time
            "#,
        )
        .bind(attr_name)
        .bind(cat_id)
        .bind(attr_sel)
        .bind(attr_write)
        .bind(attr_vals)
        .fetch_one(pool)
        .await
    }

    /// 改名，attr_vals 只在请求体里带了这个字段时一并更新
    pub async fn update(
        pool: &PgPool,
        attr_id: i32,
        attr_name: &str,
        attr_vals: Option<&str>,
    ) -> Result<Attribute, sqlx::Error> {
        let mut attr = match Self::find_by_id(pool, attr_id).await? {
            Some(attr) => attr,
            None => return Err(sqlx::Error::RowNotFound),
        };
        attr.attr_name = attr_name.to_string();
        if let Some(vals) = attr_vals {
            attr.attr_vals = vals.to_string();
        }
        sqlx::query("UPDATE sp_attribute SET attr_name = $1, attr_vals = $2 WHERE attr_id = $3")
            .bind(&attr.attr_name)
            .bind(&attr.attr_vals)
            .bind(attr_id)
            .execute(pool)
            .await?;
        Ok(attr)
    }

    /// 假删，记下删除时间
    pub async fn mark_deleted(pool: &PgPool, attr_id: i32, now: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sp_attribute SET delete_time = $1 WHERE attr_id = $2")
            .bind(now)
            .bind(attr_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// 添加或修改参数的请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddAttrParams {
    pub attr_name: String,
    pub attr_sel: String,
    pub attr_vals: String,
}

/// 探测请求体里有没有 attr_vals 字段。字段存在时它是字符串，按整数解析必然失败；
/// 字段缺失时解析成功取到零值
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AttrValsProbe {
    #[allow(dead_code)]
    attr_vals: i64,
}

pub fn vals_in_body(body: &[u8]) -> bool {
    parse_json_strict::<AttrValsProbe>(body).is_err()
}

/// sel 必须是 only（静态属性）或 many（动态参数）
pub fn check_sel(sel: &str) -> Result<(), &'static str> {
    if sel.is_empty() {
        return Err("属性类型不能为空");
    }
    if sel != "only" && sel != "many" {
        return Err("属性类型必须是'only'或者'many'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sel_check_accepts_only_and_many() {
        assert!(check_sel("only").is_ok());
        assert!(check_sel("many").is_ok());
        assert_eq!(check_sel(""), Err("属性类型不能为空"));
        assert_eq!(check_sel("both"), Err("属性类型必须是'only'或者'many'"));
    }

    #[test]
    fn vals_probe_detects_string_field() {
        assert!(vals_in_body(r#"{"attr_name":"颜色","attr_vals":"金色,银色"}"#.as_bytes()));
        assert!(vals_in_body(br#"{"attr_vals":""}"#));
        assert!(!vals_in_body(r#"{"attr_name":"颜色"}"#.as_bytes()));
        assert!(!vals_in_body(b"{}"));
    }

    #[test]
    fn delete_time_never_serializes() {
        let attr = Attribute {
            attr_id: 1,
            attr_name: "颜色".to_string(),
            cat_id: 3,
            attr_sel: "many".to_string(),
            attr_write: "list".to_string(),
            attr_vals: "金色,银色".to_string(),
            delete_time: Some(1_600_000_000),
        };
        let value = serde_json::to_value(&attr).unwrap();
        assert!(value.get("delete_time").is_none());
        assert_eq!(value["attr_write"], "list");
    }
}

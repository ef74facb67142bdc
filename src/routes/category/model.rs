use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::utils::field_error;

/// sp_category 表实体。cat_icon、cat_src 由建表默认值维护，接口不返回
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub cat_id: i32,
    pub cat_name: String,
    pub cat_pid: i32,
    pub cat_level: i32,
    pub cat_deleted: bool,
}

impl Category {
    /// 一次取出全部分类，树在内存里组装
    pub async fn load_all(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT cat_id, cat_name, cat_pid, cat_level, cat_deleted
            FROM sp_category
            ORDER BY cat_id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, cat_id: i32) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT cat_id, cat_name, cat_pid, cat_level, cat_deleted
            FROM sp_category
            WHERE cat_id = $1
            "#,
        )
        .bind(cat_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists_by_id(pool: &PgPool, cat_id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sp_category WHERE cat_id = $1)")
            .bind(cat_id)
            .fetch_one(pool)
            .await
    }

    /// 重名检查不区分层级，已删除的分类也算占用名称
    pub async fn exists_by_name(pool: &PgPool, cat_name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sp_category WHERE cat_name = $1)",
        )
        .bind(cat_name)
        .fetch_one(pool)
        .await
    }

    pub async fn insert(
        pool: &PgPool,
        cat_name: &str,
        cat_pid: i32,
        cat_level: i32,
    ) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO sp_category (cat_name, cat_pid, cat_level)
            VALUES ($1, $2, $3)
            RETURNING cat_id, cat_name, cat_pid, cat_level, cat_deleted
            "#,
        )
        .bind(cat_name)
        .bind(cat_pid)
        .bind(cat_level)
        .fetch_one(pool)
        .await
    }

    pub async fn update_name(
        pool: &PgPool,
        cat_id: i32,
        cat_name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sp_category SET cat_name = $1 WHERE cat_id = $2")
            .bind(cat_name)
            .bind(cat_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// 假删，只改删除标记
    pub async fn mark_deleted(pool: &PgPool, cat_id: i32) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sp_category SET cat_deleted = TRUE WHERE cat_id = $1")
            .bind(cat_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// 分类树节点，没有子分类时 children 字段整个不输出
#[derive(Debug, Serialize)]
pub struct CateNode {
    pub cat_id: i32,
    pub cat_name: String,
    pub cat_pid: i32,
    pub cat_level: i32,
    pub cat_deleted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CateNode>,
}

/// 分页列表的响应体。total 统计全部顶级分类，翻过了末页时 result 输出 null
#[derive(Debug, Serialize)]
pub struct CatePageData {
    pub total: i64,
    pub pagenum: i64,
    pub pagesize: i64,
    pub result: Option<Vec<CateNode>>,
}

/// type 参数限制返回的层级：1 只要一级分类，2 到二级为止，0 和 3 不限制
pub fn level_allows(ty: i32, cat_level: i32) -> bool {
    match ty {
        1 => cat_level == 0,
        2 => cat_level != 2,
        _ => true,
    }
}

/// 从 pid 出发递归组装分类树，每一层都按 type 过滤。
/// 已删除的分类照常出现在列表里，前端靠 cat_deleted 标记展示
pub fn build_cate_tree(rows: &[Category], pid: i32, ty: i32) -> Vec<CateNode> {
    rows.iter()
        .filter(|c| c.cat_pid == pid && level_allows(ty, c.cat_level))
        .map(|c| CateNode {
            cat_id: c.cat_id,
            cat_name: c.cat_name.clone(),
            cat_pid: c.cat_pid,
            cat_level: c.cat_level,
            cat_deleted: c.cat_deleted,
            children: build_cate_tree(rows, c.cat_id, ty),
        })
        .collect()
}

/// 分页组装：顶级分类不做 type 过滤，只有子树按 type 过滤
pub fn build_cate_page(rows: &[Category], ty: i32, pagenum: i64, pagesize: i64) -> CatePageData {
    let tops: Vec<&Category> = rows.iter().filter(|c| c.cat_pid == 0).collect();
    let total = tops.len() as i64;

    let start = ((pagenum - 1) * pagesize) as usize;
    let page: Vec<CateNode> = tops
        .into_iter()
        .skip(start)
        .take(pagesize as usize)
        .map(|c| CateNode {
            cat_id: c.cat_id,
            cat_name: c.cat_name.clone(),
            cat_pid: c.cat_pid,
            cat_level: c.cat_level,
            cat_deleted: c.cat_deleted,
            children: build_cate_tree(rows, c.cat_id, ty),
        })
        .collect();

    CatePageData {
        total,
        pagenum,
        pagesize,
        result: (!page.is_empty()).then_some(page),
    }
}

/// 添加分类的请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddCateParams {
    pub cat_pid: i32,
    pub cat_name: String,
    pub cat_level: i32,
}

impl AddCateParams {
    /// 按字段声明顺序校验，返回第一条错误提示
    pub fn validate_fields(&self) -> Result<(), String> {
        if self.cat_name.is_empty() {
            return Err(field_error("Cat_name", "Can not be empty"));
        }
        if self.cat_level < 0 || self.cat_level > 2 {
            return Err(field_error("Cat_level", "Range is 0 to 2"));
        }
        Ok(())
    }

    /// 字段校验通过后再查库：父分类要存在，分类名不能重复
    pub async fn validate_refs(&self, pool: &PgPool) -> Result<(), String> {
        if self.cat_pid != 0 {
            match Category::find_by_id(pool, self.cat_pid).await {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => return Err(field_error("CatPid", "分类父ID不存在")),
            }
        }
        match Category::exists_by_name(pool, &self.cat_name).await {
            Ok(true) => Err(field_error("CatName", "分类名称已存在")),
            Ok(false) | Err(_) => Ok(()),
        }
    }
}

/// 修改分类名称的请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCateParams {
    pub cat_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cate(cat_id: i32, cat_name: &str, cat_pid: i32, cat_level: i32, deleted: bool) -> Category {
        Category {
            cat_id,
            cat_name: cat_name.to_string(),
            cat_pid,
            cat_level,
            cat_deleted: deleted,
        }
    }

    fn sample_rows() -> Vec<Category> {
        vec![
            cate(1, "家用电器", 0, 0, false),
            cate(2, "大家电", 1, 1, false),
            cate(3, "电视", 2, 2, false),
            cate(4, "手机通讯", 0, 0, true),
            cate(5, "手机790", 4, 1, false),
        ]
    }

    #[test]
    fn level_filter_matches_type_table() {
        assert!(level_allows(1, 0));
        assert!(!level_allows(1, 1));
        assert!(level_allows(2, 0));
        assert!(level_allows(2, 1));
        assert!(!level_allows(2, 2));
        assert!(level_allows(3, 2));
        assert!(level_allows(0, 2));
    }

    #[test]
    fn tree_cuts_levels_by_type() {
        let rows = sample_rows();

        let only_top = build_cate_tree(&rows, 0, 1);
        assert_eq!(only_top.len(), 2);
        assert!(only_top[0].children.is_empty());

        let two_levels = build_cate_tree(&rows, 0, 2);
        assert_eq!(two_levels[0].children.len(), 1);
        assert!(two_levels[0].children[0].children.is_empty());

        let full = build_cate_tree(&rows, 0, 3);
        assert_eq!(full[0].children[0].children[0].cat_name, "电视");
    }

    #[test]
    fn deleted_cates_stay_in_tree() {
        let rows = sample_rows();
        let full = build_cate_tree(&rows, 0, 3);
        assert!(full[1].cat_deleted);
        assert_eq!(full[1].children.len(), 1);
    }

    #[test]
    fn empty_children_key_is_omitted() {
        let rows = sample_rows();
        let only_top = build_cate_tree(&rows, 0, 1);
        let value = serde_json::to_value(&only_top).unwrap();
        assert!(value[0].get("children").is_none());
        assert_eq!(value[0]["cat_name"], "家用电器");
    }

    #[test]
    fn page_counts_all_top_cates_without_level_filter() {
        let rows = sample_rows();
        // type=1 只影响子树，顶级行原样返回
        let page = build_cate_page(&rows, 1, 1, 1);
        assert_eq!(page.total, 2);
        let result = page.result.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].cat_id, 1);
        assert!(result[0].children.is_empty());
    }

    #[test]
    fn page_past_end_serializes_null_result() {
        let rows = sample_rows();
        let page = build_cate_page(&rows, 3, 9, 10);
        assert!(page.result.is_none());
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["result"], serde_json::Value::Null);
        assert_eq!(value["total"], 2);
    }

    #[test]
    fn add_cate_checks_name_then_level() {
        let params = AddCateParams {
            cat_pid: 0,
            cat_name: String::new(),
            cat_level: 9,
        };
        assert_eq!(
            params.validate_fields(),
            Err("错误字段：Cat_name，错误信息：Can not be empty".to_string())
        );

        let params = AddCateParams {
            cat_pid: 0,
            cat_name: "图书".to_string(),
            cat_level: 3,
        };
        assert_eq!(
            params.validate_fields(),
            Err("错误字段：Cat_level，错误信息：Range is 0 to 2".to_string())
        );

        let params = AddCateParams {
            cat_pid: 0,
            cat_name: "图书".to_string(),
            cat_level: 0,
        };
        assert!(params.validate_fields().is_ok());
    }
}

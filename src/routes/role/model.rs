use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::routes::rights::model::RoleRightNode;

/// sp_role 表实体
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Role {
    pub role_id: i32,
    pub role_name: String,
    pub role_desc: String,
    pub ps_ids: String,
}

/// 角色权限串。数据库里存的是逗号分隔的权限 id 列表，首位的 0 是根权限标记。
/// 比较一律按字符串进行，和持久化格式保持一致。
#[derive(Debug, Clone, PartialEq)]
pub struct RightsList(Vec<String>);

impl RightsList {
    pub fn parse(raw: &str) -> Self {
        RightsList(raw.split(',').map(str::to_string).collect())
    }

    pub fn contains_id(&self, id: i32) -> bool {
        let target = id.to_string();
        self.0.iter().any(|item| *item == target)
    }

    /// 删除第一个匹配的权限 id，返回是否真的删掉了
    pub fn remove_id(&mut self, id: i32) -> bool {
        let target = id.to_string();
        match self.0.iter().position(|item| *item == target) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn join(&self) -> String {
        self.0.join(",")
    }
}

impl Role {
    pub fn rights(&self) -> RightsList {
        RightsList::parse(&self.ps_ids)
    }

    pub async fn find_by_id(pool: &PgPool, role_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT role_id, role_name, role_desc, ps_ids FROM sp_role WHERE role_id = $1",
        )
        .bind(role_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT role_id, role_name, role_desc, ps_ids FROM sp_role ORDER BY role_id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn exists_by_name(pool: &PgPool, role_name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sp_role WHERE role_name = $1)")
            .bind(role_name)
            .fetch_one(pool)
            .await
    }

    /// 新角色的权限串为空，要先通过分配权限接口授权
    pub async fn insert(
        pool: &PgPool,
        role_name: &str,
        role_desc: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO sp_role (role_name, role_desc, ps_ids)
            VALUES ($1, $2, '')
            RETURNING role_id, role_name, role_desc, ps_ids
            "#,
        )
        .bind(role_name)
        .bind(role_desc)
        .fetch_one(pool)
        .await
    }

    pub async fn update_info(
        pool: &PgPool,
        role_id: i32,
        role_name: &str,
        role_desc: &str,
    ) -> Result<u64, sqlx::Error> {
        let done = sqlx::query("UPDATE sp_role SET role_name = $1, role_desc = $2 WHERE role_id = $3")
            .bind(role_name)
            .bind(role_desc)
            .bind(role_id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn update_rights(
        pool: &PgPool,
        role_id: i32,
        ps_ids: &str,
    ) -> Result<u64, sqlx::Error> {
        let done = sqlx::query("UPDATE sp_role SET ps_ids = $1 WHERE role_id = $2")
            .bind(ps_ids)
            .bind(role_id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn delete(pool: &PgPool, role_id: i32) -> Result<u64, sqlx::Error> {
        let done = sqlx::query("DELETE FROM sp_role WHERE role_id = $1")
            .bind(role_id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }
}

/// 新建和修改角色的请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoleParams {
    #[serde(rename = "roleName")]
    pub role_name: String,
    #[serde(rename = "roleDesc")]
    pub role_desc: String,
}

/// 给角色分配权限的请求体，rids 是逗号分隔的权限 id 串
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssignRightsParams {
    #[serde(alias = "Rids")]
    pub rids: String,
}

/// 角色信息响应体
#[derive(Debug, Serialize)]
pub struct RoleInfo {
    #[serde(rename = "roleId")]
    pub role_id: i32,
    #[serde(rename = "roleName")]
    pub role_name: String,
    #[serde(rename = "roleDesc")]
    pub role_desc: String,
}

/// 角色列表条目，children 是该角色拥有的权限树
#[derive(Debug, Serialize)]
pub struct RoleListItem {
    pub id: i32,
    #[serde(rename = "roleName")]
    pub role_name: String,
    #[serde(rename = "roleDesc")]
    pub role_desc: String,
    pub children: Vec<RoleRightNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rights_list_matches_by_exact_string() {
        let rights = RightsList::parse("0,105,116");
        assert!(rights.contains_id(0));
        assert!(rights.contains_id(105));
        assert!(!rights.contains_id(10));
        assert!(!rights.contains_id(5));
    }

    #[test]
    fn empty_rights_string_contains_nothing() {
        let rights = RightsList::parse("");
        assert!(!rights.contains_id(0));
        assert_eq!(rights.join(), "");
    }

    #[test]
    fn remove_id_drops_first_match_and_rejoins() {
        let mut rights = RightsList::parse("0,5,9");
        assert!(rights.remove_id(5));
        assert_eq!(rights.join(), "0,9");
        assert!(!rights.remove_id(5));
        assert_eq!(rights.join(), "0,9");
    }

    #[test]
    fn remove_root_keeps_rest_intact() {
        let mut rights = RightsList::parse("0,5,9");
        assert!(rights.remove_id(0));
        assert_eq!(rights.join(), "5,9");
    }

    #[test]
    fn assign_params_accept_both_key_spellings() {
        let lower: AssignRightsParams = serde_json::from_str(r#"{"rids":"1,2"}"#).unwrap();
        assert_eq!(lower.rids, "1,2");
        let upper: AssignRightsParams = serde_json::from_str(r#"{"Rids":"3"}"#).unwrap();
        assert_eq!(upper.rids, "3");
        let missing: AssignRightsParams = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.rids, "");
    }

    #[test]
    fn role_params_use_camel_case_keys() {
        let params: RoleParams =
            serde_json::from_str(r#"{"roleName":"客服","roleDesc":"处理售后"}"#).unwrap();
        assert_eq!(params.role_name, "客服");
        assert_eq!(params.role_desc, "处理售后");
    }
}

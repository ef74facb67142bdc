use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;

use crate::routes::role::model::RightsList;

/// sp_permission 连接 sp_permission_api 之后的一行权限记录
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PermissionRow {
    pub ps_id: i32,
    pub ps_name: String,
    pub ps_level: String,
    pub ps_pid: i32,
    pub ps_api_path: String,
}

impl PermissionRow {
    /// 查询所有挂接了接口信息的权限记录，没有接口记录的权限不会出现在结果中。
    /// 按展示顺序排，同级节点保持前端期望的次序
    pub async fn load_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                t1.ps_id, t1.ps_name, t1.ps_level, t1.ps_pid,
                COALESCE(t2.ps_api_path, '') AS ps_api_path
            FROM sp_permission t1
            JOIN sp_permission_api t2 ON t1.ps_id = t2.ps_id
            ORDER BY t2.ps_api_order NULLS LAST, t1.ps_id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// sp_permission 表中的全部权限 id，校验 rids 参数时使用
    pub async fn all_ids(pool: &PgPool) -> Result<HashSet<i32>, sqlx::Error> {
        let ids: Vec<i32> = sqlx::query_scalar("SELECT ps_id FROM sp_permission")
            .fetch_all(pool)
            .await?;
        Ok(ids.into_iter().collect())
    }
}

/// list 形式的权限条目
#[derive(Debug, Serialize)]
pub struct RightItem {
    pub id: i32,
    #[serde(rename = "authName")]
    pub auth_name: String,
    pub level: String,
    pub pid: i32,
    pub path: String,
}

/// tree 形式的权限节点，叶子节点的 children 是空数组而不是 null
#[derive(Debug, Serialize)]
pub struct RightNode {
    pub id: i32,
    #[serde(rename = "authName")]
    pub auth_name: String,
    pub path: String,
    pub pid: i32,
    pub children: Vec<RightNode>,
}

/// 角色权限树节点，只包含角色实际拥有的权限
#[derive(Debug, Serialize)]
pub struct RoleRightNode {
    pub id: i32,
    #[serde(rename = "authName")]
    pub auth_name: String,
    pub path: String,
    pub children: Vec<RoleRightNode>,
}

pub fn flatten_rights(rows: &[PermissionRow]) -> Vec<RightItem> {
    rows.iter()
        .map(|row| RightItem {
            id: row.ps_id,
            auth_name: row.ps_name.clone(),
            level: row.ps_level.clone(),
            pid: row.ps_pid,
            path: row.ps_api_path.clone(),
        })
        .collect()
}

/// 按 ps_pid 递归构建完整的权限树
pub fn build_rights_tree(rows: &[PermissionRow]) -> Vec<RightNode> {
    subtree_of(rows, 0)
}

fn subtree_of(rows: &[PermissionRow], pid: i32) -> Vec<RightNode> {
    rows.iter()
        .filter(|row| row.ps_pid == pid)
        .map(|row| RightNode {
            id: row.ps_id,
            auth_name: row.ps_name.clone(),
            path: row.ps_api_path.clone(),
            pid: row.ps_pid,
            children: subtree_of(rows, row.ps_id),
        })
        .collect()
}

/// 从全量权限中筛出角色拥有的部分。未授权的节点连同整棵子树一起跳过，
/// 不会把子权限提升到上一层。
pub fn build_role_subtree(rows: &[PermissionRow], owned: &RightsList) -> Vec<RoleRightNode> {
    role_subtree_of(rows, owned, 0)
}

fn role_subtree_of(rows: &[PermissionRow], owned: &RightsList, pid: i32) -> Vec<RoleRightNode> {
    rows.iter()
        .filter(|row| row.ps_pid == pid && owned.contains_id(row.ps_id))
        .map(|row| RoleRightNode {
            id: row.ps_id,
            auth_name: row.ps_name.clone(),
            path: row.ps_api_path.clone(),
            children: role_subtree_of(rows, owned, row.ps_id),
        })
        .collect()
}

/// 校验逗号分隔的权限 id 串。空串直接通过，0 是根权限标记不做存在性校验，
/// 返回第一个校验失败的原因。
pub fn validate_rids(rids: &str, known_ids: &HashSet<i32>) -> Result<(), String> {
    if rids.is_empty() {
        return Ok(());
    }
    for part in rids.split(',') {
        let Ok(id) = part.parse::<i32>() else {
            return Err("权限格式错误".to_string());
        };
        if id != 0 && !known_ids.contains(&id) {
            return Err("包含不存在的权限".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ps_id: i32, ps_name: &str, ps_level: &str, ps_pid: i32) -> PermissionRow {
        PermissionRow {
            ps_id,
            ps_name: ps_name.to_string(),
            ps_level: ps_level.to_string(),
            ps_pid,
            ps_api_path: format!("path-{}", ps_id),
        }
    }

    fn fixture() -> Vec<PermissionRow> {
        vec![
            row(101, "商品管理", "0", 0),
            row(104, "商品列表", "1", 101),
            row(105, "添加商品", "2", 104),
            row(125, "用户管理", "0", 0),
            row(110, "用户列表", "1", 125),
        ]
    }

    #[test]
    fn tree_nests_by_pid_with_empty_leaf_children() {
        let tree = build_rights_tree(&fixture());
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, 101);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].id, 104);
        assert_eq!(tree[0].children[0].children[0].id, 105);
        assert!(tree[0].children[0].children[0].children.is_empty());
    }

    #[test]
    fn flat_list_keeps_every_row() {
        let rows = fixture();
        let flat = flatten_rights(&rows);
        assert_eq!(flat.len(), rows.len());
        assert_eq!(flat[0].auth_name, "商品管理");
        assert_eq!(flat[0].level, "0");
        assert_eq!(flat[0].path, "path-101");
    }

    #[test]
    fn role_subtree_skips_unowned_branch_entirely() {
        let owned = RightsList::parse("0,125,110");
        let tree = build_role_subtree(&fixture(), &owned);
        // 101 未授权，其子树 104/105 也不能出现
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, 125);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].id, 110);
    }

    #[test]
    fn role_subtree_without_mid_level_hides_leaf() {
        let owned = RightsList::parse("0,101,105");
        let tree = build_role_subtree(&fixture(), &owned);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, 101);
        // 104 未授权，105 虽然授权了也挂不上来
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn validate_rids_accepts_empty_and_root() {
        let known: HashSet<i32> = [101, 104, 105].into_iter().collect();
        assert!(validate_rids("", &known).is_ok());
        assert!(validate_rids("0", &known).is_ok());
        assert!(validate_rids("0,101,104", &known).is_ok());
    }

    #[test]
    fn validate_rids_rejects_malformed_element() {
        let known: HashSet<i32> = [101].into_iter().collect();
        assert_eq!(
            validate_rids("101,abc", &known),
            Err("权限格式错误".to_string())
        );
        assert_eq!(
            validate_rids(" 101", &known),
            Err("权限格式错误".to_string())
        );
    }

    #[test]
    fn validate_rids_rejects_unknown_id() {
        let known: HashSet<i32> = [101].into_iter().collect();
        assert_eq!(
            validate_rids("101,999", &known),
            Err("包含不存在的权限".to_string())
        );
    }
}

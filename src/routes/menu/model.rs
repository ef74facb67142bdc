use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
struct MenuRow {
    ps_id: i32,
    ps_name: String,
    ps_api_path: String,
    ps_api_order: Option<i32>,
}

/// 侧边菜单节点。一级菜单没有二级菜单时 children 输出 null，
/// 二级菜单的 children 恒为空数组，排序号缺失时 order 输出 null。
#[derive(Debug, Serialize)]
pub struct MenuNode {
    pub id: i32,
    #[serde(rename = "authName")]
    pub auth_name: String,
    pub path: String,
    pub children: Option<Vec<MenuNode>>,
    pub order: Option<i32>,
}

impl MenuNode {
    fn from_row(row: MenuRow) -> Self {
        MenuNode {
            id: row.ps_id,
            auth_name: row.ps_name,
            path: row.ps_api_path,
            children: None,
            order: row.ps_api_order,
        }
    }
}

async fn top_level(pool: &PgPool) -> Result<Vec<MenuRow>, sqlx::Error> {
    sqlx::query_as::<_, MenuRow>(
        r#"
        SELECT t1.ps_id, t1.ps_name,
               COALESCE(t2.ps_api_path, '') AS ps_api_path, t2.ps_api_order
        FROM sp_permission t1
        JOIN sp_permission_api t2 ON t1.ps_id = t2.ps_id
        WHERE t1.ps_pid = 0
        ORDER BY t2.ps_api_order
        "#,
    )
    .fetch_all(pool)
    .await
}

async fn children_of(pool: &PgPool, pid: i32) -> Result<Vec<MenuRow>, sqlx::Error> {
    sqlx::query_as::<_, MenuRow>(
        r#"
        SELECT t1.ps_id, t1.ps_name,
               COALESCE(t2.ps_api_path, '') AS ps_api_path, t2.ps_api_order
        FROM sp_permission t1
        JOIN sp_permission_api t2 ON t1.ps_id = t2.ps_id
        WHERE t1.ps_pid = $1 AND t1.ps_level = '1'
        ORDER BY t2.ps_api_order
        "#,
    )
    .bind(pid)
    .fetch_all(pool)
    .await
}

/// 组装两级菜单：一级是 ps_pid 为 0 的权限，二级是挂在其下的一级权限
pub async fn build_menus(pool: &PgPool) -> Result<Vec<MenuNode>, sqlx::Error> {
    let mut menus: Vec<MenuNode> = top_level(pool)
        .await?
        .into_iter()
        .map(MenuNode::from_row)
        .collect();

    for menu in &mut menus {
        let children: Vec<MenuNode> = children_of(pool, menu.id)
            .await?
            .into_iter()
            .map(|row| {
                let mut child = MenuNode::from_row(row);
                child.children = Some(Vec::new());
                child
            })
            .collect();
        if !children.is_empty() {
            menu.children = Some(children);
        }
    }

    Ok(menus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn childless_top_menu_serializes_null_children_and_order() {
        let node = MenuNode {
            id: 125,
            auth_name: "用户管理".to_string(),
            path: "users".to_string(),
            children: None,
            order: None,
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 125,
                "authName": "用户管理",
                "path": "users",
                "children": null,
                "order": null
            })
        );
    }

    #[test]
    fn second_level_menu_keeps_empty_children_array() {
        let node = MenuNode {
            id: 125,
            auth_name: "用户管理".to_string(),
            path: "users".to_string(),
            children: Some(vec![MenuNode {
                id: 110,
                auth_name: "用户列表".to_string(),
                path: "users".to_string(),
                children: Some(Vec::new()),
                order: Some(1),
            }]),
            order: Some(1),
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["children"][0]["id"], 110);
        assert_eq!(value["children"][0]["children"], serde_json::json!([]));
        assert_eq!(value["children"][0]["order"], 1);
    }
}

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::utils::field_error;

/// sp_manager 表实体
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Manager {
    pub mg_id: i32,
    pub mg_name: String,
    pub mg_pwd: String,
    pub mg_time: i64,
    pub role_id: i32,
    pub mg_mobile: String,
    pub mg_email: String,
    pub mg_state: i16,
}

/// role_id 为 0 的管理员是超级管理员，不走权限串校验
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoleBinding {
    SuperAdmin,
    Scoped(i32),
}

impl Manager {
    pub fn role_binding(&self) -> RoleBinding {
        if self.role_id == 0 {
            RoleBinding::SuperAdmin
        } else {
            RoleBinding::Scoped(self.role_id)
        }
    }

    pub async fn find_by_name(pool: &PgPool, mg_name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Manager>(
            r#"
            SELECT mg_id, mg_name, mg_pwd, mg_time, role_id, mg_mobile, mg_email, mg_state
            FROM sp_manager WHERE mg_name = $1
            "#,
        )
        .bind(mg_name)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, mg_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Manager>(
            r#"
            SELECT mg_id, mg_name, mg_pwd, mg_time, role_id, mg_mobile, mg_email, mg_state
            FROM sp_manager WHERE mg_id = $1
            "#,
        )
        .bind(mg_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists_by_name(pool: &PgPool, mg_name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sp_manager WHERE mg_name = $1)")
            .bind(mg_name)
            .fetch_one(pool)
            .await
    }

    /// 模糊匹配用户名的总记录数，query 为空串时统计全表
    pub async fn count_filtered(pool: &PgPool, query: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sp_manager WHERE mg_name LIKE $1")
            .bind(format!("%{}%", query))
            .fetch_one(pool)
            .await
    }

    /// 分页查询管理员列表，连表补出角色名。
    /// role_id 为 0 且没有角色记录的显示为超级管理员。
    pub async fn list_page(
        pool: &PgPool,
        query: &str,
        pagenum: i64,
        pagesize: i64,
    ) -> Result<Vec<UserListItem>, sqlx::Error> {
        sqlx::query_as::<_, UserListItem>(
            r#"
            SELECT
                t1.mg_id AS id,
                (CASE WHEN t2.role_name IS NULL AND t1.role_id = 0
                    THEN '超级管理员' ELSE COALESCE(t2.role_name, '') END) AS role_name,
                t1.mg_name AS username,
                t1.mg_time AS create_time,
                t1.mg_mobile AS mobile,
                t1.mg_email AS email,
                (t1.mg_state <> 0) AS mg_state
            FROM sp_manager t1
            LEFT JOIN sp_role t2 ON t1.role_id = t2.role_id
            WHERE t1.mg_name LIKE $1
            ORDER BY t1.mg_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(format!("%{}%", query))
        .bind(pagesize)
        .bind((pagenum - 1) * pagesize)
        .fetch_all(pool)
        .await
    }

    /// 新管理员默认停用，role_id 为 0
    pub async fn insert(
        pool: &PgPool,
        mg_name: &str,
        mg_pwd: &str,
        mg_time: i64,
        mg_mobile: &str,
        mg_email: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Manager>(
            r#"
            INSERT INTO sp_manager (mg_name, mg_pwd, mg_time, role_id, mg_mobile, mg_email, mg_state)
            VALUES ($1, $2, $3, 0, $4, $5, 0)
            RETURNING mg_id, mg_name, mg_pwd, mg_time, role_id, mg_mobile, mg_email, mg_state
            "#,
        )
        .bind(mg_name)
        .bind(mg_pwd)
        .bind(mg_time)
        .bind(mg_mobile)
        .bind(mg_email)
        .fetch_one(pool)
        .await
    }

    pub async fn update_state(pool: &PgPool, mg_id: i32, mg_state: i16) -> Result<u64, sqlx::Error> {
        let done = sqlx::query("UPDATE sp_manager SET mg_state = $1 WHERE mg_id = $2")
            .bind(mg_state)
            .bind(mg_id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn update_contact(
        pool: &PgPool,
        mg_id: i32,
        mg_email: &str,
        mg_mobile: &str,
    ) -> Result<u64, sqlx::Error> {
        let done = sqlx::query("UPDATE sp_manager SET mg_email = $1, mg_mobile = $2 WHERE mg_id = $3")
            .bind(mg_email)
            .bind(mg_mobile)
            .bind(mg_id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn update_role(pool: &PgPool, mg_id: i32, role_id: i32) -> Result<u64, sqlx::Error> {
        let done = sqlx::query("UPDATE sp_manager SET role_id = $1 WHERE mg_id = $2")
            .bind(role_id)
            .bind(mg_id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn delete(pool: &PgPool, mg_id: i32) -> Result<u64, sqlx::Error> {
        let done = sqlx::query("DELETE FROM sp_manager WHERE mg_id = $1")
            .bind(mg_id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }
}

/// 管理员列表条目，mg_state 在列表里是布尔值
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserListItem {
    pub id: i32,
    pub role_name: String,
    pub username: String,
    pub create_time: i64,
    pub mobile: String,
    pub email: String,
    pub mg_state: bool,
}

/// 管理员列表响应体，查不到记录时 users 输出空数组
#[derive(Debug, Serialize)]
pub struct UserListData {
    pub total: i64,
    pub pagenum: i64,
    pub users: Vec<UserListItem>,
}

/// 修改状态后返回的数据，mg_state 这里是 1/0
#[derive(Debug, Serialize)]
pub struct UserStateData {
    pub id: i32,
    pub rid: i32,
    pub username: String,
    pub mobile: String,
    pub email: String,
    pub mg_state: i16,
}

/// 新增管理员返回的数据
#[derive(Debug, Serialize)]
pub struct CreatedUserData {
    pub id: i32,
    pub username: String,
    pub mobile: String,
    pub email: String,
    pub role_id: i32,
    pub create_time: i64,
}

/// 单个管理员信息
#[derive(Debug, Serialize)]
pub struct UserInfoData {
    pub id: i32,
    pub rid: i32,
    pub username: String,
    pub mobile: String,
    pub email: String,
}

impl UserInfoData {
    pub fn from_manager(manager: &Manager) -> Self {
        UserInfoData {
            id: manager.mg_id,
            rid: manager.role_id,
            username: manager.mg_name.clone(),
            mobile: manager.mg_mobile.clone(),
            email: manager.mg_email.clone(),
        }
    }
}

/// 新增管理员的请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserParams {
    pub username: String,
    pub password: String,
    #[serde(rename = "confirmPwd")]
    pub confirm_pwd: String,
    pub email: String,
    pub mobile: String,
}

impl CreateUserParams {
    /// 按字段顺序校验，返回第一条格式化好的错误信息
    pub fn validate(&self) -> Result<(), String> {
        check_size("UserName", &self.username, 3, 10)?;
        check_size("PassWord", &self.password, 6, 15)?;
        if self.confirm_pwd.is_empty() {
            return Err(field_error("ConfirmPwd", "Can not be empty"));
        }
        if self.email.is_empty() {
            return Err(field_error("Email", "Can not be empty"));
        }
        if !is_valid_email(&self.email) {
            return Err(field_error("Email", "Must be a valid email address"));
        }
        if self.mobile.is_empty() {
            return Err(field_error("Mobile", "Can not be empty"));
        }
        if !is_valid_mobile(&self.mobile) {
            return Err(field_error("Mobile", "Must be valid mobile number"));
        }
        // 字段规则都通过后才做二次密码比对
        if self.confirm_pwd != self.password {
            return Err(field_error("ConfirmPwd", "两次密码输入不一致"));
        }
        Ok(())
    }
}

/// 修改管理员信息的请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserParams {
    pub email: String,
    pub mobile: String,
}

impl UpdateUserParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.is_empty() {
            return Err(field_error("Email", "Can not be empty"));
        }
        if !is_valid_email(&self.email) {
            return Err(field_error("Email", "Must be a valid email address"));
        }
        if self.mobile.is_empty() {
            return Err(field_error("Mobile", "Can not be empty"));
        }
        if !is_valid_mobile(&self.mobile) {
            return Err(field_error("Mobile", "Must be valid mobile number"));
        }
        Ok(())
    }
}

/// 分配角色的请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoleIdParams {
    pub rid: i32,
}

fn check_size(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    if value.is_empty() {
        return Err(field_error(field, "Can not be empty"));
    }
    let count = value.chars().count();
    if count < min {
        return Err(field_error(field, &format!("Minimum size is {}", min)));
    }
    if count > max {
        return Err(field_error(field, &format!("Maximum size is {}", max)));
    }
    Ok(())
}

/// 简化的邮箱格式校验：本地部分非空，域名带点且无空白
pub fn is_valid_email(value: &str) -> bool {
    if value.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return false;
    }
    domain.contains('.')
}

/// 大陆手机号校验：可带 +86/86 前缀，1 开头第二位 3-9，共 11 位数字
pub fn is_valid_mobile(value: &str) -> bool {
    let digits = value
        .strip_prefix("+86")
        .or_else(|| value.strip_prefix("86"))
        .unwrap_or(value);
    let bytes = digits.as_bytes();
    bytes.len() == 11
        && bytes[0] == b'1'
        && (b'3'..=b'9').contains(&bytes[1])
        && bytes.iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_params() -> CreateUserParams {
        CreateUserParams {
            username: "zhangsan".to_string(),
            password: "abc123".to_string(),
            confirm_pwd: "abc123".to_string(),
            email: "zhangsan@example.com".to_string(),
            mobile: "13812345678".to_string(),
        }
    }

    #[test]
    fn create_user_accepts_valid_params() {
        assert!(valid_params().validate().is_ok());
    }

    #[test]
    fn create_user_reports_first_field_error() {
        let mut params = valid_params();
        params.username = String::new();
        params.password = String::new();
        assert_eq!(
            params.validate(),
            Err("错误字段：UserName，错误信息：Can not be empty".to_string())
        );
    }

    #[test]
    fn create_user_checks_name_length_in_chars() {
        let mut params = valid_params();
        params.username = "管理".to_string();
        assert_eq!(
            params.validate(),
            Err("错误字段：UserName，错误信息：Minimum size is 3".to_string())
        );
        params.username = "管理员很多字符超过十个的名字".to_string();
        assert_eq!(
            params.validate(),
            Err("错误字段：UserName，错误信息：Maximum size is 10".to_string())
        );
    }

    #[test]
    fn create_user_rejects_mismatched_confirm() {
        let mut params = valid_params();
        params.confirm_pwd = "abc124".to_string();
        assert_eq!(
            params.validate(),
            Err("错误字段：ConfirmPwd，错误信息：两次密码输入不一致".to_string())
        );
    }

    #[test]
    fn create_user_rejects_bad_email_and_mobile() {
        let mut params = valid_params();
        params.email = "not-an-email".to_string();
        assert_eq!(
            params.validate(),
            Err("错误字段：Email，错误信息：Must be a valid email address".to_string())
        );
        params.email = "zhangsan@example.com".to_string();
        params.mobile = "12345".to_string();
        assert_eq!(
            params.validate(),
            Err("错误字段：Mobile，错误信息：Must be valid mobile number".to_string())
        );
    }

    #[test]
    fn email_checker_covers_common_shapes() {
        assert!(is_valid_email("a@b.cn"));
        assert!(is_valid_email("user.name@mail.example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.cn"));
        assert!(!is_valid_email("a@.cn"));
        assert!(!is_valid_email("a b@c.cn"));
    }

    #[test]
    fn mobile_checker_accepts_prefixes() {
        assert!(is_valid_mobile("13812345678"));
        assert!(is_valid_mobile("+8613812345678"));
        assert!(is_valid_mobile("8613812345678"));
        assert!(!is_valid_mobile("23812345678"));
        assert!(!is_valid_mobile("1381234567"));
        assert!(!is_valid_mobile("12812345678"));
    }

    #[test]
    fn role_binding_treats_zero_as_super_admin() {
        let mut manager = Manager {
            mg_id: 1,
            mg_name: "admin".to_string(),
            mg_pwd: String::new(),
            mg_time: 0,
            role_id: 0,
            mg_mobile: String::new(),
            mg_email: String::new(),
            mg_state: 1,
        };
        assert_eq!(manager.role_binding(), RoleBinding::SuperAdmin);
        manager.role_id = 30;
        assert_eq!(manager.role_binding(), RoleBinding::Scoped(30));
    }
}

use serde::{Deserialize, Serialize};

/// 登录请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
}

impl LoginParams {
    /// 用户名 3-10 个字符，密码 6-15 个字符，按字符数而不是字节数算
    pub fn is_well_formed(&self) -> bool {
        let name_len = self.username.chars().count();
        let pwd_len = self.password.chars().count();
        (3..=10).contains(&name_len) && (6..=15).contains(&pwd_len)
    }
}

/// 登录成功返回的数据，token 已经带上 Bearer 前缀
#[derive(Debug, Serialize)]
pub struct LoginData {
    pub id: i32,
    pub rid: i32,
    pub username: String,
    pub mobile: String,
    pub email: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(username: &str, password: &str) -> LoginParams {
        LoginParams {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn accepts_lengths_within_bounds() {
        assert!(params("admin", "123456").is_well_formed());
        assert!(params("abc", "123456789012345").is_well_formed());
    }

    #[test]
    fn rejects_lengths_outside_bounds() {
        assert!(!params("ab", "123456").is_well_formed());
        assert!(!params("admin", "12345").is_well_formed());
        assert!(!params("verylongusername", "123456").is_well_formed());
        assert!(!params("admin", "1234567890123456").is_well_formed());
    }

    #[test]
    fn counts_chars_not_bytes() {
        // 三个汉字是九个字节，但只算三个字符
        assert!(params("管理员", "123456").is_well_formed());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let parsed: LoginParams = serde_json::from_str("{}").unwrap();
        assert!(!parsed.is_well_formed());
    }
}

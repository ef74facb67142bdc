mod auth;
mod request_log;

pub use auth::{auth_middleware, check_permission, perm, require_permission};
pub use request_log::log_requests;

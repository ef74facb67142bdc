pub mod handler;
pub mod model;

pub use handler::{
    add_user, delete_user, get_user_info, get_users_list, put_user_state, update_user_info,
    update_user_role,
};

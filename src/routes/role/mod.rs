pub mod handler;
pub mod model;

pub use handler::{
    add_role, delete_role, delete_role_right, get_roles_list, update_role_info,
    update_role_rights,
};

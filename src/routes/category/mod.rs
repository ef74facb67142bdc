pub mod handler;
pub mod model;

pub use handler::{add_cate, delete_cate, get_cate_list, update_cate_name};

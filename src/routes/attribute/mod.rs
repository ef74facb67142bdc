pub mod handler;
pub mod model;

pub use handler::{add_attr, delete_attr, get_attr_list, update_attr};

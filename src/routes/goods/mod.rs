pub mod handler;
pub mod model;

pub use handler::{add_goods, delete_good, get_goods_list, update_good_info, upload_picture};

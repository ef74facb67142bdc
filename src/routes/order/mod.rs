pub mod handler;
pub mod model;

pub use handler::{get_orders_list, update_order_addr};

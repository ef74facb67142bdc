pub mod attribute;
pub mod category;
pub mod goods;
pub mod login;
pub mod menu;
pub mod order;
pub mod report;
pub mod rights;
pub mod role;
pub mod user;

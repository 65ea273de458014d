pub mod entity;
pub mod image;
pub mod server;

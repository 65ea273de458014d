pub mod context;
pub mod image;
pub mod memory_repo;
pub mod provider;
pub mod sqlx_repo;

pub mod extractors;
pub mod gallery;

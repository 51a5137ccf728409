pub mod converse;
pub mod models;
pub mod sessions;

pub mod auth_cmd;
pub mod collections;
pub mod common;
pub mod completions;
pub mod config;
pub mod export;
pub mod favorites;
pub mod quotes;
pub mod theme;

//! HTTP clients for the Supabase backend.

mod rest;
mod storage;

pub use rest::SupabaseRestClient;
pub(crate) use rest::parse_api_error;
pub use storage::{Backdrop, StorageClient};

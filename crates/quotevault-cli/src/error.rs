use std::io;

use quotevault_core::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quotevault_core::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Profile '{0}' has no Supabase config. Run `quotevault config init` or set SUPABASE_URL and SUPABASE_ANON_KEY."
    )]
    NotConfigured(String),
    #[error("Profile '{0}' is not signed in. Run `quotevault auth login` first.")]
    NotSignedIn(String),
    #[error("Quote not found: {0}")]
    QuoteNotFound(String),
    #[error("{0}")]
    InvalidInput(String),
}

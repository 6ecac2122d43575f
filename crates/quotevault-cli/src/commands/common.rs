use std::env;

use quotevault_core::{AppContext, AuthSession, ClientConfig, Quote, QuoteId, QuoteSummary};
use serde::Serialize;

use crate::auth::SupabaseAuthService;
use crate::config_profiles::{
    CliProfile, CliProfilesConfig, SUPABASE_ANON_KEY_ENV, SUPABASE_URL_ENV,
};
use crate::error::CliError;

const PREVIEW_CHARS: usize = 72;

/// Resolved profile with a usable backend config.
pub struct ProfileContext {
    pub name: String,
    pub profile: CliProfile,
    pub config: ClientConfig,
}

impl ProfileContext {
    pub fn load(global_profile: Option<&str>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let name = profiles.resolve_profile_name(global_profile);
        let profile = profiles.profile(&name).cloned().unwrap_or_default();
        let config = profile
            .client_config(env::var(SUPABASE_URL_ENV).ok(), env::var(SUPABASE_ANON_KEY_ENV).ok())
            .map_err(CliError::Config)?
            .ok_or_else(|| CliError::NotConfigured(name.clone()))?;
        Ok(Self {
            name,
            profile,
            config,
        })
    }

    pub fn auth_service(&self) -> Result<SupabaseAuthService, CliError> {
        Ok(SupabaseAuthService::new(&self.name, &self.config)?)
    }

    /// Stored session, refreshed when close to expiry.
    pub async fn restore_session(&self) -> Result<Option<AuthSession>, CliError> {
        Ok(self.auth_service()?.restore_session().await?)
    }

    pub fn app(&self, session: Option<AuthSession>) -> Result<AppContext, CliError> {
        Ok(AppContext::new(
            self.config.clone(),
            session,
            self.profile.theme(),
        )?)
    }
}

/// App context for commands that only need public reads; uses the session when one exists.
pub async fn open_app(global_profile: Option<&str>) -> Result<AppContext, CliError> {
    let context = ProfileContext::load(global_profile)?;
    let session = context.restore_session().await?;
    context.app(session)
}

/// App context for user-scoped commands; fails before any data call when signed out.
pub async fn open_signed_in_app(global_profile: Option<&str>) -> Result<AppContext, CliError> {
    let context = ProfileContext::load(global_profile)?;
    let session = context
        .restore_session()
        .await?
        .ok_or_else(|| CliError::NotSignedIn(context.name.clone()))?;
    context.app(Some(session))
}

pub fn parse_quote_id(raw: &str) -> Result<QuoteId, CliError> {
    QuoteId::new(raw).map_err(|_| CliError::InvalidInput("Quote ID cannot be empty".to_string()))
}

/// One-line preview, truncated on a character boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let mut truncated = single_line
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    truncated.push_str("...");
    truncated
}

pub fn format_quote_line(quote: &Quote, liked: bool) -> String {
    format!(
        "{} {}  \"{}\" \u{2014} {} [{}]",
        if liked { "\u{2665}" } else { " " },
        quote.id,
        preview(&quote.text, PREVIEW_CHARS),
        quote.author,
        quote.category
    )
}

pub fn format_summary_line(quote: &QuoteSummary) -> String {
    format!(
        "{}  \"{}\" \u{2014} {}",
        quote.id,
        preview(&quote.text, PREVIEW_CHARS),
        quote.author
    )
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Session and theme state shared by every screen or command.
//!
//! Each handle is the single owner of its value and publishes changes over a
//! `tokio::sync::watch` channel. Consumers receive handles explicitly through
//! [`AppContext`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::daily::DailyQuoteResolver;
use crate::error::{Error, Result};
use crate::models::{Quote, UserId};
use crate::remote::{StorageClient, SupabaseRestClient};
use crate::util::today_utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub const fn from_dark(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub const fn palette(self) -> Palette {
        match self {
            Self::Light => Palette::LIGHT,
            Self::Dark => Palette::DARK,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" | "off" | "false" => Ok(Self::Light),
            "dark" | "on" | "true" => Ok(Self::Dark),
            other => Err(Error::InvalidInput(format!("Unknown theme '{other}'"))),
        }
    }
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB`
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub const fn to_rgba(self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub primary: Color,
    pub card: Color,
}

impl Palette {
    pub const LIGHT: Self = Self {
        background: Color::rgb(0xFF, 0xFF, 0xFF),
        text: Color::rgb(0x11, 0x11, 0x11),
        primary: Color::rgb(0x63, 0x66, 0xF1),
        card: Color::rgb(0xF3, 0xF4, 0xF6),
    };

    pub const DARK: Self = Self {
        background: Color::rgb(0x0F, 0x17, 0x2A),
        text: Color::rgb(0xF8, 0xFA, 0xFC),
        primary: Color::rgb(0x81, 0x8C, 0xF8),
        card: Color::rgb(0x1E, 0x29, 0x3B),
    };
}

/// Current auth session, `None` when signed out.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: Arc<watch::Sender<Option<AuthSession>>>,
}

impl SessionHandle {
    pub fn new(initial: Option<AuthSession>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.sender.borrow().clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.sender
            .borrow()
            .as_ref()
            .map(|session| session.user_id().clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Publish a new session (sign-in or token refresh).
    pub fn set(&self, session: AuthSession) {
        self.sender.send_replace(Some(session));
    }

    pub fn clear(&self) {
        self.sender.send_if_modified(|current| current.take().is_some());
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.sender.subscribe()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug, Clone)]
pub struct ThemeHandle {
    sender: Arc<watch::Sender<ThemeMode>>,
}

impl ThemeHandle {
    pub fn new(mode: ThemeMode) -> Self {
        let (sender, _) = watch::channel(mode);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn mode(&self) -> ThemeMode {
        *self.sender.borrow()
    }

    pub fn palette(&self) -> Palette {
        self.mode().palette()
    }

    /// Returns `true` when the mode actually changed.
    pub fn set_mode(&self, mode: ThemeMode) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        })
    }

    pub fn toggle(&self) -> ThemeMode {
        let next = self.mode().toggled();
        self.set_mode(next);
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeMode> {
        self.sender.subscribe()
    }
}

impl Default for ThemeHandle {
    fn default() -> Self {
        Self::new(ThemeMode::default())
    }
}

/// Everything a front end needs, passed explicitly instead of held globally.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: ClientConfig,
    rest: SupabaseRestClient,
    storage: StorageClient,
    session: SessionHandle,
    theme: ThemeHandle,
}

impl AppContext {
    pub fn new(config: ClientConfig, session: Option<AuthSession>, theme: ThemeMode) -> Result<Self> {
        Ok(Self {
            rest: SupabaseRestClient::new(&config)?,
            storage: StorageClient::new(&config)?,
            config,
            session: SessionHandle::new(session),
            theme: ThemeHandle::new(theme),
        })
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub const fn theme(&self) -> &ThemeHandle {
        &self.theme
    }

    pub const fn storage(&self) -> &StorageClient {
        &self.storage
    }

    /// Client for public reads that need no user.
    pub const fn anonymous_client(&self) -> &SupabaseRestClient {
        &self.rest
    }

    /// REST client acting as the signed-in user, plus that user's id.
    pub fn user_client(&self) -> Result<(SupabaseRestClient, UserId)> {
        let session = self.session.current().ok_or(Error::NotSignedIn)?;
        let client = self.rest.with_access_token(&session.access_token);
        Ok((client, session.user.id))
    }

    /// Quote of the day for the signed-in user, using today's UTC date.
    pub async fn daily_quote(&self) -> Result<Quote> {
        let (client, user) = self.user_client()?;
        DailyQuoteResolver::new(client)
            .resolve(&user, today_utc())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;

    fn session(user: &str) -> AuthSession {
        AuthSession {
            access_token: format!("{user}-access"),
            refresh_token: format!("{user}-refresh"),
            expires_at: i64::MAX,
            user: AuthUser {
                id: UserId::new(user).unwrap(),
                email: None,
            },
        }
    }

    #[test]
    fn palettes_match_theme_colors() {
        assert_eq!(ThemeMode::Light.palette().background.to_hex(), "#FFFFFF");
        assert_eq!(ThemeMode::Light.palette().primary.to_hex(), "#6366F1");
        assert_eq!(ThemeMode::Dark.palette().background.to_hex(), "#0F172A");
        assert_eq!(ThemeMode::Dark.palette().card.to_hex(), "#1E293B");
    }

    #[test]
    fn theme_mode_parses_names_and_switches() {
        assert_eq!("Dark".parse::<ThemeMode>().unwrap(), ThemeMode::Dark);
        assert_eq!("off".parse::<ThemeMode>().unwrap(), ThemeMode::Light);
        assert!("sepia".parse::<ThemeMode>().is_err());
        assert_eq!(ThemeMode::from_dark(true), ThemeMode::Dark);
    }

    #[tokio::test]
    async fn theme_subscribers_see_changes_only() {
        let theme = ThemeHandle::default();
        let mut receiver = theme.subscribe();

        assert!(!theme.set_mode(ThemeMode::Light));
        assert!(!receiver.has_changed().unwrap());

        assert_eq!(theme.toggle(), ThemeMode::Dark);
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), ThemeMode::Dark);
        assert_eq!(theme.palette(), Palette::DARK);
    }

    #[tokio::test]
    async fn session_subscribers_observe_sign_in_and_out() {
        let handle = SessionHandle::default();
        let mut receiver = handle.subscribe();
        assert!(handle.user_id().is_none());

        handle.set(session("u1"));
        receiver.changed().await.unwrap();
        assert_eq!(
            receiver.borrow_and_update().as_ref().map(|s| s.user_id().as_str().to_string()),
            Some("u1".to_string())
        );

        handle.clear();
        receiver.changed().await.unwrap();
        assert!(receiver.borrow_and_update().is_none());

        handle.clear();
        assert!(!receiver.has_changed().unwrap());
    }

    #[test]
    fn user_client_requires_a_session() {
        let config = ClientConfig::new("https://demo.supabase.co", "anon").unwrap();
        let context = AppContext::new(config, None, ThemeMode::Dark).unwrap();
        assert!(matches!(context.user_client(), Err(Error::NotSignedIn)));

        context.session().set(session("u2"));
        let (_, user) = context.user_client().unwrap();
        assert_eq!(user.as_str(), "u2");
        assert!(context.theme().mode().is_dark());
    }
}

//! CLI Supabase auth/session helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use quotevault_core::auth::{AuthResult, SessionPersistence, SignUpOutcome, SupabaseAuthClient};
pub use quotevault_core::auth::{AuthError, AuthSession};
use quotevault_core::ClientConfig;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "quotevault-cli";

#[derive(Clone)]
pub(crate) struct SessionStore {
    username: String,
}

impl SessionStore {
    pub(crate) fn new(profile_name: &str) -> Self {
        Self {
            username: format!("supabase_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?
            .insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?
            .remove(&self.username);
        Ok(())
    }
}

/// Auth client bound to one profile's keychain slot.
#[derive(Clone)]
pub struct SupabaseAuthService {
    inner: SupabaseAuthClient<SessionStore>,
}

impl SupabaseAuthService {
    pub fn new(profile_name: &str, config: &ClientConfig) -> AuthResult<Self> {
        Ok(Self {
            inner: SupabaseAuthClient::new(config, SessionStore::new(profile_name))?,
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        self.inner.sign_up(email, password).await
    }

    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        self.inner.reset_password(email).await
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.restore_session().await
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        self.inner.sign_out(access_token).await
    }
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    SessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}

#[cfg(test)]
mod tests {
    use quotevault_core::auth::AuthUser;
    use quotevault_core::UserId;

    use super::*;

    fn session(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at,
            user: AuthUser {
                id: UserId::new("user").unwrap(),
                email: Some("reader@example.com".to_string()),
            },
        }
    }

    #[test]
    fn stored_session_is_scoped_per_profile() {
        let store = SessionStore::new("auth-test-a");
        store.save_session(&session(1_700_000_000)).unwrap();

        assert_eq!(
            load_stored_session("auth-test-a").unwrap(),
            Some(session(1_700_000_000))
        );
        assert!(load_stored_session("auth-test-b").unwrap().is_none());

        clear_stored_session("auth-test-a").unwrap();
        assert!(load_stored_session("auth-test-a").unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_returns_unexpired_session_without_network() {
        let config = ClientConfig::new("http://127.0.0.1:9", "anon").unwrap();
        let service = SupabaseAuthService::new("auth-test-restore", &config).unwrap();
        SessionStore::new("auth-test-restore")
            .save_session(&session(i64::MAX))
            .unwrap();

        let restored = service.restore_session().await.unwrap().unwrap();

        assert_eq!(restored.user_id().as_str(), "user");
        clear_stored_session("auth-test-restore").unwrap();
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn keychain_entries_use_platform_store() {
        let entry = keyring::Entry::new("quotevault-cli", "supabase_session:backend-check").unwrap();
        assert!(entry
            .get_credential()
            .downcast_ref::<keyring::mock::MockCredential>()
            .is_none());
    }

    #[test]
    #[ignore = "writes to the OS keychain"]
    fn keychain_session_survives_fresh_entry() {
        let raw = serde_json::to_string(&session(1_700_000_000)).unwrap();
        let entry = keyring::Entry::new("quotevault-cli", "supabase_session:round-trip").unwrap();
        entry.set_password(&raw).unwrap();

        let fresh = keyring::Entry::new("quotevault-cli", "supabase_session:round-trip").unwrap();
        let restored: AuthSession = serde_json::from_str(&fresh.get_password().unwrap()).unwrap();
        assert_eq!(restored, session(1_700_000_000));
        fresh.delete_credential().unwrap();
    }
}

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::info;

/// Source of the `POESESSID` cookie sent with trade requests.
pub trait CredentialProvider: Send + Sync {
    fn session_token(&self) -> Option<String>;
}

/// Payload of the login flow's completion event.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthComplete {
    pub poesessid: String,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    token: RwLock<Option<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_session(token);
        store
    }

    pub fn set_session(&self, token: impl Into<String>) {
        let token = token.into();
        info!(session = %redact(&token), "Session token updated");
        *self.token.write() = Some(token);
    }

    pub fn on_auth_complete(&self, event: AuthComplete) {
        self.set_session(event.poesessid);
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

impl CredentialProvider for SessionStore {
    fn session_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

/// Only the first five characters of a token are ever logged.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(5).collect();
    format!("{}...", prefix)
}

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::documents::DocumentService;
use crate::errors::{LoanError, Result, StoreError};
use crate::events::Event;
use crate::records::{DocumentOwner, User};
use crate::types::{DocumentType, RecordId};

pub const USER_ID: &str = "user_id";
pub const USERNAME: &str = "username";
pub const FULL_NAME: &str = "full_name";
pub const ROLE: &str = "role";
pub const PHOTO_URL: &str = "photo_url";
pub const DARK_MODE: &str = "user_selected_dark_mode";

/// checks a plaintext password against a stored salted hash
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, plain: &str, stored_hash: &str) -> bool;
}

/// local key-value storage for the signed-in session
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> std::result::Result<(), StoreError>;

    async fn remove(&self, key: &str) -> std::result::Result<(), StoreError>;

    async fn clear(&self) -> std::result::Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> std::result::Result<(), StoreError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> std::result::Result<(), StoreError> {
        self.values.lock().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> std::result::Result<(), StoreError> {
        self.values.lock().await.clear();
        Ok(())
    }
}

/// what is remembered about the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Option<RecordId>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub photo_url: Option<String>,
}

impl SessionData {
    pub fn is_active(&self) -> bool {
        self.user_id.is_some()
    }
}

/// typed view over a session store
pub struct Session<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self { store }
    }

    pub async fn save(&self, user: &User, photo_url: Option<&str>) -> Result<()> {
        let user_id = user.id.ok_or_else(|| LoanError::InconsistentState {
            message: format!("user {} has no id", user.username),
        })?;
        let role = serde_json::to_value(user.role)?
            .as_str()
            .unwrap_or_default()
            .to_string();

        self.set(USER_ID, user_id.to_string()).await?;
        self.set(USERNAME, user.username.clone()).await?;
        self.set(FULL_NAME, user.full_name()).await?;
        self.set(ROLE, role).await?;
        self.set(PHOTO_URL, photo_url.unwrap_or_default().to_string()).await
    }

    pub async fn load(&self) -> Result<SessionData> {
        Ok(SessionData {
            user_id: self.get(USER_ID).await?.and_then(|id| id.parse().ok()),
            username: self.get(USERNAME).await?,
            full_name: self.get(FULL_NAME).await?,
            role: self.get(ROLE).await?,
            photo_url: self.get(PHOTO_URL).await?,
        })
    }

    pub async fn update_photo_url(&self, url: &str) -> Result<()> {
        self.set(PHOTO_URL, url.to_string()).await
    }

    /// sign out; the theme preference is kept
    pub async fn clear(&self) -> Result<()> {
        let dark_mode = self.dark_mode().await?;
        self.store.clear().await.map_err(|source| LoanError::Session { source })?;
        if let Some(enabled) = dark_mode {
            self.set_dark_mode(enabled).await?;
        }
        Ok(())
    }

    /// explicit theme choice; `None` follows the system theme
    pub async fn dark_mode(&self) -> Result<Option<bool>> {
        Ok(self.get(DARK_MODE).await?.and_then(|v| v.parse().ok()))
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.set(DARK_MODE, enabled.to_string()).await
    }

    pub async fn reset_dark_mode(&self) -> Result<()> {
        self.store
            .remove(DARK_MODE)
            .await
            .map_err(|source| LoanError::Session { source })
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .store
            .get(key)
            .await
            .map_err(|source| LoanError::Session { source })?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.store
            .set(key, value)
            .await
            .map_err(|source| LoanError::Session { source })
    }
}

/// signs users in against the users table
pub struct Authenticator<'a> {
    ctx: &'a AppContext,
    verifier: &'a dyn PasswordVerifier,
    sessions: &'a dyn SessionStore,
}

impl<'a> Authenticator<'a> {
    pub fn new(ctx: &'a AppContext, verifier: &'a dyn PasswordVerifier, sessions: &'a dyn SessionStore) -> Self {
        Self { ctx, verifier, sessions }
    }

    /// the user when the credentials match an enabled account
    ///
    /// unknown users, wrong passwords and disabled accounts all return `None`
    /// and leave the session untouched
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let username = username.trim();
        let users: Vec<User> = self.ctx.repository().list_by("username", username).await?;

        let Some(user) = users.into_iter().next() else {
            info!(username, "sign-in refused: unknown user");
            return Ok(None);
        };

        if !self.verifier.verify(password, &user.password_hash) {
            info!(username, "sign-in refused: wrong password");
            return Ok(None);
        }

        if !user.is_enabled() {
            warn!(username, "sign-in refused: account disabled");
            return Ok(None);
        }

        let user_id = user.id.ok_or_else(|| LoanError::InconsistentState {
            message: format!("stored user {} has no id", username),
        })?;

        let photo_url = match DocumentService::new(self.ctx)
            .latest(DocumentOwner::User(user_id), DocumentType::Profile)
            .await
        {
            Ok(document) => document.map(|d| d.storage_url),
            Err(err) => {
                warn!(%user_id, error = %err, "profile photo lookup failed");
                None
            }
        };

        Session::new(self.sessions).save(&user, photo_url.as_deref()).await?;
        info!(%user_id, username, "signed in");

        self.ctx
            .emit(Event::UserAuthenticated {
                user_id,
                username: user.username.clone(),
                timestamp: self.ctx.now(),
            })
            .await;
        Ok(Some(user))
    }
}

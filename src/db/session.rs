//! Session token and user, as left in local storage by the login page.
//!
//! Tokens are passed through to the backend untouched; nothing here
//! validates them. A protected dashboard only checks that one exists.

use serde::{Deserialize, Serialize};

use super::{LocalStore, StorageError};
use crate::flow::PatientIdentity;
use crate::models::Role;

pub const TOKEN_KEY: &str = "session.token";
pub const USER_KEY: &str = "session.user";

/// The logged-in account, as cached by the login page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Set for patient accounts once reception has linked them.
    #[serde(default)]
    pub patient_id: Option<String>,
}

impl SessionUser {
    pub fn identity(&self) -> PatientIdentity<'_> {
        PatientIdentity {
            patient_id: self.patient_id.as_deref(),
            email: Some(&self.email),
            name: Some(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: Option<SessionUser>,
}

/// Where a protected view sends the user instead of rendering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Redirect {
    #[error("Login required")]
    Login,
}

impl Redirect {
    pub fn route(&self) -> &'static str {
        match self {
            Self::Login => "/login",
        }
    }
}

impl Session {
    /// Read the session; no token (or an unreadable store) means login.
    ///
    /// A malformed cached user is dropped rather than blocking access.
    pub fn load(local: &LocalStore) -> Result<Session, Redirect> {
        let token = match local.get_raw(TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => return Err(Redirect::Login),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read session token");
                return Err(Redirect::Login);
            }
        };
        let user = local.load_or(USER_KEY, || None);
        Ok(Session { token, user })
    }

    pub fn save(local: &LocalStore, token: &str, user: &SessionUser) -> Result<(), StorageError> {
        local.set_raw(TOKEN_KEY, token)?;
        local.set_json(USER_KEY, user)?;
        tracing::info!(user = %user.email, role = user.role.as_str(), "Session stored");
        Ok(())
    }

    pub fn clear(local: &LocalStore) -> Result<(), StorageError> {
        local.remove(TOKEN_KEY)?;
        local.remove(USER_KEY)?;
        Ok(())
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }
}

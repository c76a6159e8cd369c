//! Basic-auth credentials stored for each realm.

use serde::{Deserialize, Serialize};

/// Stored credential. The password is only ever held as a bcrypt hash.
#[derive(Debug, Clone)]
pub struct Credential {
    pub realm: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Credential listing for the admin console, without the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInfo {
    pub realm: String,
    pub username: String,
    pub created_at: String,
}

impl From<&Credential> for CredentialInfo {
    fn from(credential: &Credential) -> Self {
        Self {
            realm: credential.realm.clone(),
            username: credential.username.clone(),
            created_at: credential.created_at.clone(),
        }
    }
}

/// Form body for enrolling a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollRequest {
    pub realm: String,
    pub username: String,
    pub password: String,
}

//! HTTP basic authentication against credentials stored in the database.
//!
//! Passwords are hashed with bcrypt (salt embedded in the hash); plaintext is
//! never stored or compared.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;

use crate::db::Repository;
use crate::errors::{AppError, ErrorResponse};
use crate::models::{Credential, EnrollRequest};

pub const SURVEY_REALM: &str = "survey";
pub const ADMIN_REALM: &str = "admin";

/// Realms a credential can be enrolled in.
pub const REALMS: [&str; 2] = [SURVEY_REALM, ADMIN_REALM];

/// User that passed basic auth, attached to the request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub realm: String,
    pub username: String,
}

/// Hash a password with a fresh salt.
pub async fn hash_password(plain: &str, cost: u32) -> Result<String, AppError> {
    let plain = plain.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
    Ok(hash)
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub async fn verify_password(plain: &str, hash: &str) -> bool {
    let plain = plain.to_string();
    let hash = hash.to_string();
    match tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash)).await {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            tracing::warn!("Stored password hash is unusable: {}", e);
            false
        }
        Err(e) => {
            tracing::error!("Password verification task failed: {}", e);
            false
        }
    }
}

/// Verify a username and password for a realm.
pub async fn check_password_in_db(
    repo: &Repository,
    realm: &str,
    username: &str,
    password: &str,
) -> Result<bool, AppError> {
    match repo.find_credential(realm, username).await? {
        Some(credential) => Ok(verify_password(password, &credential.password_hash).await),
        None => Ok(false),
    }
}

/// Enroll a new credential. Usernames are unique across all realms.
pub async fn enroll_credential(
    repo: &Repository,
    request: &EnrollRequest,
    cost: u32,
) -> Result<Credential, AppError> {
    let username = request.username.trim();
    if username.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }
    if !REALMS.contains(&request.realm.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown realm {:?}",
            request.realm
        )));
    }

    if repo.username_exists(username).await? {
        tracing::warn!(username, "rejected enrollment of existing username");
        return Err(AppError::Conflict("Username already is taken!".to_string()));
    }

    let credential = Credential {
        realm: request.realm.clone(),
        username: username.to_string(),
        password_hash: hash_password(&request.password, cost).await?,
        created_at: Utc::now().to_rfc3339(),
    };
    repo.insert_credential(&credential).await?;
    tracing::info!(realm = %credential.realm, username, "enrolled credential");

    Ok(credential)
}

/// Decode an `Authorization: Basic` header value into username and password.
pub fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }
    let encoded = encoded.trim();
    let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Basic auth layer function that takes the repository and realm as parameters.
pub async fn basic_auth_layer(
    repo: Arc<Repository>,
    realm: &'static str,
    mut request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_auth);

    let Some((username, password)) = provided else {
        return unauthorized_response(realm, "Missing credentials");
    };

    match check_password_in_db(&repo, realm, &username, &password).await {
        Ok(true) => {
            request.extensions_mut().insert(AuthenticatedUser {
                realm: realm.to_string(),
                username,
            });
            next.run(request).await
        }
        Ok(false) => {
            tracing::debug!(realm, username = %username, "basic auth rejected");
            unauthorized_response(realm, "Invalid username or password")
        }
        Err(e) => e.into_response(),
    }
}

/// Create an unauthorized response carrying the basic auth challenge.
fn unauthorized_response(realm: &str, message: &str) -> Response {
    let body = ErrorResponse::new(&AppError::Unauthorized(message.to_string()));

    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    let challenge = format!("Basic realm=\"{}\", charset=\"UTF-8\"", realm);
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

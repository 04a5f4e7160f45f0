use std::sync::Arc;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::auth::{
    password::{verify_password, PasswordPolicy},
    repo::{CredentialStore, StoreError},
    repo_types::User,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Local part of an email, or the whole string when it has no `@`.
pub fn default_username(email: &str) -> &str {
    email.split_once('@').map_or(email, |(local, _)| local)
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User already exists")]
    DuplicateUser,
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            // Lost the race against a concurrent registration.
            StoreError::DuplicateEmail => AuthError::DuplicateUser,
            other => AuthError::Store(other),
        }
    }
}

/// Registration and login over a [`CredentialStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, policy: PasswordPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<User, AuthError> {
        if self.store.find_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::DuplicateUser);
        }

        let policy = self.policy.clone();
        let plain = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || policy.hash_password(&plain))
            .await
            .context("password hashing task failed")??;

        let username = match username {
            Some(name) if !name.is_empty() => name,
            _ => default_username(email),
        };

        let user = self.store.create(email, &hash, username).await?;
        info!(user_id = user.user_id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Returns the user only when the email exists and the password matches.
    /// Callers cannot tell an unknown email from a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            warn!(email = %email, "login unknown email");
            return Ok(None);
        };

        let plain = password.to_owned();
        let stored = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&plain, &stored))
            .await
            .context("password verification task failed")?;

        match verified {
            Ok(true) => {
                debug!(user_id = user.user_id, "password verified");
                Ok(Some(user))
            }
            Ok(false) => {
                warn!(user_id = user.user_id, "login invalid password");
                Ok(None)
            }
            Err(e) => {
                warn!(user_id = user.user_id, error = %e, "stored password hash is unreadable");
                Ok(None)
            }
        }
    }
}

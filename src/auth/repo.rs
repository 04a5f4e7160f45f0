use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::User;

/// SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("credential store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Persistence of user records keyed by email.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user and return it with `user_id` and `created_at` populated.
    /// Fails with [`StoreError::DuplicateEmail`] if the email is already taken.
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        username: &str,
    ) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, username, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        username: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING user_id, email, username, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) =>
            {
                StoreError::DuplicateEmail
            }
            other => StoreError::Unavailable(other),
        })
    }
}

#[cfg(test)]
pub use memory::MemoryUserStore;

#[cfg(test)]
mod memory {
    use super::*;
    use time::OffsetDateTime;
    use tokio::sync::Mutex;

    /// In-process store with the same uniqueness guarantee as the `users` table.
    #[derive(Default)]
    pub struct MemoryUserStore {
        users: Mutex<Vec<User>>,
    }

    impl MemoryUserStore {
        pub async fn len(&self) -> usize {
            self.users.lock().await.len()
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let users = self.users.lock().await;
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn create(
            &self,
            email: &str,
            password_hash: &str,
            username: &str,
        ) -> Result<User, StoreError> {
            let mut users = self.users.lock().await;
            if users.iter().any(|u| u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
            let user = User {
                user_id: users.len() as i64 + 1,
                email: email.to_string(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(user.clone());
            Ok(user)
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = MemoryUserStore::default();
        let a = store.create("a@x.io", "h", "a").await.unwrap();
        let b = store.create("b@x.io", "h", "b").await.unwrap();
        assert_eq!((a.user_id, b.user_id), (1, 2));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.create("a@x.io", "h", "a").await.unwrap();
        let err = store.create("a@x.io", "h2", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn lookup_is_exact_match() {
        let store = MemoryUserStore::default();
        store.create("Alice@x.io", "h", "Alice").await.unwrap();
        assert!(store.find_by_email("Alice@x.io").await.unwrap().is_some());
        assert!(store.find_by_email("alice@x.io").await.unwrap().is_none());
    }
}

use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub user_id: i64,               // assigned by the store
    pub email: String,              // unique, stored as provided
    pub username: String,           // display label
    pub password_hash: String,      // Argon2 PHC string, never sent to clients
    pub created_at: OffsetDateTime, // creation timestamp
}

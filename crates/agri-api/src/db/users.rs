//! User account persistence.

use agri_core::{User, UserId, UserRole, UserStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, username, full_name, email, role, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(user.id.0)
    .bind(&user.username)
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(user.role.as_str())
    .bind(user.status.as_str())
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns `false` if no row matched.
pub async fn update_status(pool: &PgPool, id: UserId, status: UserStatus) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(id.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, full_name, email, role, status, created_at
         FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UserRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    full_name: String,
    email: Option<String>,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    /// Unknown enum names fall back to the least-privileged value and are
    /// logged at ERROR.
    fn into_record(self) -> User {
        let role = UserRole::from_name(&self.role).unwrap_or_else(|e| {
            tracing::error!(id = %self.id, error = %e, "unknown user role in database, treating as FARMER");
            UserRole::Farmer
        });
        let status = UserStatus::from_name(&self.status).unwrap_or_else(|e| {
            tracing::error!(id = %self.id, error = %e, "unknown user status in database, treating as INACTIVE");
            UserStatus::Inactive
        });

        User {
            id: UserId::from_uuid(self.id),
            username: self.username,
            full_name: self.full_name,
            email: self.email,
            role,
            status,
            created_at: self.created_at,
        }
    }
}

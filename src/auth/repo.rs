use std::sync::atomic::{AtomicBool, Ordering};

use axum::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, ProfileUpdate, User, UserRow};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("mobile already registered")]
    Conflict,
    #[error("user storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistent store of users, keyed by unique mobile number.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<User>, DirectoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError>;
    /// Fails with `Conflict` if the mobile exists; the storage constraint is the final word.
    async fn create(&self, user: NewUser) -> Result<User, DirectoryError>;
    /// Returns `None` when no user has this id.
    async fn update(&self, id: Uuid, changes: ProfileUpdate)
        -> Result<Option<User>, DirectoryError>;

    /// `false` while answers may come from a degraded, non-authoritative source.
    fn is_authoritative(&self) -> bool {
        true
    }
}

const USER_COLUMNS: &str = "id, mobile, password_hash, role, name, email, age, alternate_phone, \
     aadhar_number, state, district, village, pincode, soil_type, land_area, primary_crops, \
     created_at, updated_at";

pub struct PgUserDirectory {
    db: PgPool,
    reachable: AtomicBool,
}

impl PgUserDirectory {
    /// `reachable` is the connectivity observed at startup.
    pub fn new(db: PgPool, reachable: bool) -> Self {
        Self {
            db,
            reachable: AtomicBool::new(reachable),
        }
    }

    fn observe<T>(&self, res: Result<T, sqlx::Error>) -> Result<T, DirectoryError> {
        match res {
            Ok(v) => {
                self.reachable.store(true, Ordering::Relaxed);
                Ok(v)
            }
            Err(e) => {
                let err = classify(e);
                if let DirectoryError::Unavailable(msg) = &err {
                    if self.reachable.swap(false, Ordering::Relaxed) {
                        warn!(error = %msg, "user storage became unreachable");
                    }
                } else {
                    // the server answered, so the connection itself is fine
                    self.reachable.store(true, Ordering::Relaxed);
                }
                Err(err)
            }
        }
    }
}

/// SQLSTATEs the server sends when it cannot serve us at all: class 08
/// (connection exception), shutdown/recovery and connection limits.
fn is_connection_failure(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03" | "53300")
}

fn classify(e: sqlx::Error) -> DirectoryError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => DirectoryError::Conflict,
        sqlx::Error::Database(ref db)
            if db.code().as_deref().is_some_and(is_connection_failure) =>
        {
            DirectoryError::Unavailable(e.to_string())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => DirectoryError::Unavailable(e.to_string()),
        other => DirectoryError::Other(anyhow::Error::new(other).context("user storage query")),
    }
}

fn into_user(row: Option<UserRow>) -> Result<Option<User>, DirectoryError> {
    row.map(User::try_from).transpose().map_err(DirectoryError::Other)
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<User>, DirectoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE mobile = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(mobile)
            .fetch_optional(&self.db)
            .await;
        into_user(self.observe(row)?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await;
        into_user(self.observe(row)?)
    }

    async fn create(&self, u: NewUser) -> Result<User, DirectoryError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, mobile, password_hash, role, name, email, age,
                               alternate_phone, aadhar_number, state, district, village,
                               pincode, soil_type, land_area, primary_crops)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&u.mobile)
            .bind(&u.password_hash)
            .bind(u.role.as_str())
            .bind(&u.name)
            .bind(&u.email)
            .bind(u.age)
            .bind(&u.alternate_phone)
            .bind(&u.aadhar_number)
            .bind(&u.state)
            .bind(&u.district)
            .bind(&u.village)
            .bind(&u.pincode)
            .bind(&u.farm.soil_type)
            .bind(&u.farm.land_area)
            .bind(&u.farm.primary_crops)
            .fetch_one(&self.db)
            .await;
        let row = self.observe(row)?;
        User::try_from(row).map_err(DirectoryError::Other)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProfileUpdate,
    ) -> Result<Option<User>, DirectoryError> {
        let sql = format!(
            r#"
            UPDATE users
               SET name       = COALESCE($2, name),
                   email      = COALESCE($3, email),
                   state      = COALESCE($4, state),
                   district   = COALESCE($5, district),
                   village    = COALESCE($6, village),
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.email)
            .bind(&changes.state)
            .bind(&changes.district)
            .bind(&changes.village)
            .fetch_optional(&self.db)
            .await;
        into_user(self.observe(row)?)
    }

    fn is_authoritative(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }
}

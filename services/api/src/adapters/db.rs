//! services/api/src/adapters/db.rs
//!
//! PostgreSQL adapter backing both the `DreamStore` and `AuthStore` ports.
//! All queries go through one `PgPool`; row structs stay private to this
//! module and convert into the core domain types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dream_journal_core::domain::{Dream, Interpretation, PerspectiveText, User, UserCredentials};
use dream_journal_core::ports::{AuthStore, DreamStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DreamStore` and `AuthStore` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations; called once at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DreamRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    emotions: Vec<String>,
    created_at: DateTime<Utc>,
    has_interpretation: bool,
}
impl DreamRecord {
    fn to_domain(self) -> Dream {
        Dream {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            emotions: self.emotions,
            created_at: self.created_at,
            has_interpretation: self.has_interpretation,
        }
    }
}

#[derive(FromRow)]
struct InterpretationRecord {
    id: Uuid,
    dream_id: Uuid,
    islamic_title: String,
    islamic_content: String,
    spiritual_title: String,
    spiritual_content: String,
    scientific_title: String,
    scientific_content: String,
    created_at: DateTime<Utc>,
}
impl InterpretationRecord {
    fn to_domain(self) -> Interpretation {
        Interpretation {
            id: self.id,
            dream_id: self.dream_id,
            islamic: PerspectiveText {
                title: self.islamic_title,
                content: self.islamic_content,
            },
            spiritual: PerspectiveText {
                title: self.spiritual_title,
                content: self.spiritual_content,
            },
            scientific: PerspectiveText {
                title: self.scientific_title,
                content: self.scientific_content,
            },
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

const DREAM_COLUMNS: &str = "id, user_id, title, content, emotions, created_at, has_interpretation";
const INTERPRETATION_COLUMNS: &str = "id, dream_id, islamic_title, islamic_content, \
     spiritual_title, spiritual_content, scientific_title, scientific_content, created_at";

//=========================================================================================
// `DreamStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DreamStore for DbAdapter {
    async fn create_dream(
        &self,
        user_id: Uuid,
        title: &str,
        content: &str,
        emotions: &[String],
    ) -> PortResult<Dream> {
        let record = sqlx::query_as::<_, DreamRecord>(&format!(
            "INSERT INTO dreams (id, user_id, title, content, emotions) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {DREAM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(emotions.to_vec())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_dream_by_id(&self, dream_id: Uuid) -> PortResult<Dream> {
        let record = sqlx::query_as::<_, DreamRecord>(&format!(
            "SELECT {DREAM_COLUMNS} FROM dreams WHERE id = $1"
        ))
        .bind(dream_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Dream {} not found", dream_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_dreams_for_user(&self, user_id: Uuid) -> PortResult<Vec<Dream>> {
        let records = sqlx::query_as::<_, DreamRecord>(&format!(
            "SELECT {DREAM_COLUMNS} FROM dreams WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_interpretation(&self, dream_id: Uuid) -> PortResult<Option<Interpretation>> {
        let record = sqlx::query_as::<_, InterpretationRecord>(&format!(
            "SELECT {INTERPRETATION_COLUMNS} FROM interpretations WHERE dream_id = $1"
        ))
        .bind(dream_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert_interpretation(
        &self,
        dream_id: Uuid,
        islamic: PerspectiveText,
        spiritual: PerspectiveText,
        scientific: PerspectiveText,
    ) -> PortResult<Interpretation> {
        // The UNIQUE constraint on dream_id makes this idempotent: when a
        // concurrent request already inserted a row, fall through to that row
        // instead of creating a duplicate.
        let inserted = sqlx::query_as::<_, InterpretationRecord>(&format!(
            "INSERT INTO interpretations \
             (id, dream_id, islamic_title, islamic_content, spiritual_title, \
              spiritual_content, scientific_title, scientific_content) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (dream_id) DO NOTHING \
             RETURNING {INTERPRETATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(dream_id)
        .bind(islamic.title)
        .bind(islamic.content)
        .bind(spiritual.title)
        .bind(spiritual.content)
        .bind(scientific.title)
        .bind(scientific.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match inserted {
            Some(record) => Ok(record.to_domain()),
            None => self.find_interpretation(dream_id).await?.ok_or_else(|| {
                PortError::Unexpected(format!(
                    "Interpretation for dream {} missing after conflicting insert",
                    dream_id
                ))
            }),
        }
    }

    async fn update_dream_flag(&self, dream_id: Uuid, has_interpretation: bool) -> PortResult<()> {
        sqlx::query("UPDATE dreams SET has_interpretation = $1 WHERE id = $2")
            .bind(has_interpretation)
            .bind(dream_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `AuthStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthStore for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) \
             VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

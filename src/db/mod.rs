pub mod models;
pub mod users;
pub mod sessions;
pub mod profiles;
pub mod companies;
pub mod jobs;
pub mod applications;
pub mod conversations;
pub mod messages;

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

pub use models::{
    Application, Company, Conversation, Job, JobListing, JobQuestion, JobStatus, Message,
    Profile, Role, Session, User,
};
pub use users::UserRepository;
pub use sessions::SessionRepository;
pub use profiles::ProfileRepository;
pub use companies::CompanyRepository;
pub use jobs::JobRepository;
pub use applications::ApplicationRepository;
pub use conversations::{ConversationRepository, ConversationScope};
pub use messages::MessageRepository;

use crate::config::Config;
use crate::error::AppError;

/// Current wall-clock time in unix milliseconds, the unit every timestamp column uses.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Open the pool described by `config` and apply embedded migrations.
pub async fn connect(config: &Config) -> Result<Pool<Sqlite>, AppError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Single-connection in-memory pool with migrations applied.
#[cfg(test)]
pub(crate) async fn test_pool() -> Pool<Sqlite> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}

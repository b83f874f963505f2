//! Portable (SQLite + PostgreSQL) schema migrations, run through `cetane`.

mod m0001_initial;

use cetane::prelude::*;
use diesel::Connection;

use crate::db::{DbError, DbPool};

/// All migrations in application order.
pub fn all() -> Vec<Migration> {
    vec![m0001_initial::migration()]
}

fn to_diesel_error<E: std::fmt::Display>(e: E) -> DbError {
    DbError::DatabaseError(
        diesel::result::DatabaseErrorKind::UnableToSendCommand,
        Box::new(e.to_string()),
    )
}

/// Apply every pending migration to `pool`'s backend. Safe to call on every
/// startup: already-applied migrations are tracked by `cetane` and skipped.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    match pool {
        DbPool::Sqlite(sqlite_pool) => {
            let url = sqlite_pool.database_url().to_string();
            let migrations = all();
            tokio::task::spawn_blocking(move || {
                let mut conn = diesel::sqlite::SqliteConnection::establish(&url)
                    .map_err(to_diesel_error)?;
                Runner::new(Backend::Sqlite)
                    .apply_all(&mut conn, &migrations)
                    .map_err(to_diesel_error)
            })
            .await
            .map_err(to_diesel_error)?
        }
        #[cfg(feature = "postgres")]
        DbPool::Postgres(pg_pool) => {
            let url = pg_pool.database_url().to_string();
            let migrations = all();
            tokio::task::spawn_blocking(move || {
                let mut conn =
                    diesel::pg::PgConnection::establish(&url).map_err(to_diesel_error)?;
                Runner::new(Backend::Postgres)
                    .apply_all(&mut conn, &migrations)
                    .map_err(to_diesel_error)
            })
            .await
            .map_err(to_diesel_error)?
        }
    }
}

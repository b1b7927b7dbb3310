use thiserror::Error;

use crate::model::{Genre, Movie};

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds the database lock
    #[error("The catalog database is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all surface as these messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

// ============================================================================
// Row Types
// ============================================================================

/// Separator used when a movie's genre list is flattened into one column.
pub(crate) const GENRE_SEPARATOR: &str = ",";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct GenreRow {
    pub name: String,
    pub count: i64,
}

impl GenreRow {
    pub(crate) fn into_genre(self) -> Genre {
        Genre {
            name: self.name,
            // Only non-negative u32 counts are ever written.
            count: u32::try_from(self.count).unwrap_or(0),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MovieRow {
    pub id: String,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub genres: String,
    pub url: String,
}

impl MovieRow {
    pub(crate) fn into_movie(self) -> Movie {
        Movie {
            id: self.id,
            title: self.title,
            overview: self.overview,
            release_date: self.release_date,
            genres: split_genres(&self.genres),
            url: self.url,
        }
    }
}

pub(crate) fn join_genres(genres: &[String]) -> String {
    genres.join(GENRE_SEPARATOR)
}

pub(crate) fn split_genres(field: &str) -> Vec<String> {
    field
        .split(GENRE_SEPARATOR)
        .filter(|g| !g.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Row counts for the two cached tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub genres: i64,
    pub movies: i64,
}

use async_trait::async_trait;

use super::schema::Database;
use super::types::DatabaseError;
use crate::model::{Genre, Movie};

/// Persistent keyed table of genres and movies used as the catalog cache.
///
/// Writes are idempotent upserts keyed by genre name and movie id, so they
/// may be applied repeatedly and out of order.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Every cached genre.
    async fn read_genres(&self) -> Result<Vec<Genre>, DatabaseError>;

    /// Upsert genres, replacing rows with the same name.
    async fn write_genres(&self, genres: &[Genre]) -> Result<(), DatabaseError>;

    /// A title-ordered window of movies whose genre field contains `genre`.
    async fn read_movies(
        &self,
        genre: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Movie>, DatabaseError>;

    /// Upsert movies, replacing rows with the same id.
    async fn write_movies(&self, movies: &[Movie]) -> Result<(), DatabaseError>;
}

#[async_trait]
impl LocalStore for Database {
    async fn read_genres(&self) -> Result<Vec<Genre>, DatabaseError> {
        self.get_genres().await
    }

    async fn write_genres(&self, genres: &[Genre]) -> Result<(), DatabaseError> {
        self.upsert_genres(genres).await
    }

    async fn read_movies(
        &self,
        genre: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Movie>, DatabaseError> {
        self.get_movies(genre, limit, offset).await
    }

    async fn write_movies(&self, movies: &[Movie]) -> Result<(), DatabaseError> {
        self.upsert_movies(movies).await
    }
}

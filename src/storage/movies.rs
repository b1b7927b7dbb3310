use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{join_genres, DatabaseError, MovieRow};
use crate::model::Movie;

impl Database {
    // ========================================================================
    // Movie Operations
    // ========================================================================

    /// One window of cached movies ordered by title.
    ///
    /// `genre` filters by case-sensitive containment against the comma-joined
    /// genre column, so `"Fi"` matches both "Fiction" and "Film-Noir".
    pub async fn get_movies(
        &self,
        genre: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Movie>, DatabaseError> {
        let rows = sqlx::query_as::<_, MovieRow>(
            r#"
            SELECT id, title, overview, release_date, genres, url
            FROM movies
            WHERE (? IS NULL OR instr(genres, ?) > 0)
            ORDER BY title, id
            LIMIT ? OFFSET ?
        "#,
        )
        .bind(genre)
        .bind(genre)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MovieRow::into_movie).collect())
    }

    /// Upsert movies keyed by id. Every column of an existing row is overwritten.
    ///
    /// Batched in chunks of 100 rows inside a single transaction, so an
    /// interrupted write leaves no partial page behind.
    pub async fn upsert_movies(&self, movies: &[Movie]) -> Result<(), DatabaseError> {
        if movies.is_empty() {
            return Ok(());
        }

        const BATCH_SIZE: usize = 100;
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for chunk in movies.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT INTO movies (id, title, overview, release_date, genres, url, fetched_at) ",
            );

            builder.push_values(chunk, |mut b, movie| {
                b.push_bind(&movie.id)
                    .push_bind(&movie.title)
                    .push_bind(&movie.overview)
                    .push_bind(&movie.release_date)
                    .push_bind(join_genres(&movie.genres))
                    .push_bind(&movie.url)
                    .push_bind(now);
            });

            builder.push(
                r#" ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    overview = excluded.overview,
                    release_date = excluded.release_date,
                    genres = excluded.genres,
                    url = excluded.url,
                    fetched_at = excluded.fetched_at"#,
            );

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::debug!(count = movies.len(), "Movies upserted");
        Ok(())
    }
}

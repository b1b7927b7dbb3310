use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{DatabaseError, GenreRow};
use crate::model::Genre;

impl Database {
    // ========================================================================
    // Genre Operations
    // ========================================================================

    /// All cached genres, ordered by name.
    pub async fn get_genres(&self) -> Result<Vec<Genre>, DatabaseError> {
        let rows = sqlx::query_as::<_, GenreRow>("SELECT name, count FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(GenreRow::into_genre).collect())
    }

    /// Upsert genres keyed by name, replacing the count of existing rows.
    ///
    /// The whole slice is written in one transaction.
    pub async fn upsert_genres(&self, genres: &[Genre]) -> Result<(), DatabaseError> {
        if genres.is_empty() {
            return Ok(());
        }

        const BATCH_SIZE: usize = 100;
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for chunk in genres.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new("INSERT INTO genres (name, count, fetched_at) ");

            builder.push_values(chunk, |mut b, genre| {
                b.push_bind(&genre.name)
                    .push_bind(i64::from(genre.count))
                    .push_bind(now);
            });

            builder.push(
                " ON CONFLICT(name) DO UPDATE SET count = excluded.count, fetched_at = excluded.fetched_at",
            );

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::debug!(count = genres.len(), "Genres upserted");
        Ok(())
    }
}

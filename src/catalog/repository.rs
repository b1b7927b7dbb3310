use async_trait::async_trait;

use super::{Catalog, CatalogError};
use crate::model::{Genre, Movie, PAGE_SIZE};
use crate::remote::RemoteSource;
use crate::storage::LocalStore;

/// Cache-or-fetch policy over a remote source and a local store.
///
/// Pagination state is just the integer `offset` owned by the caller; the
/// repository passes it through to the store and the remote verbatim.
pub struct CatalogRepository<R, S> {
    remote: R,
    store: S,
}

impl<R, S> CatalogRepository<R, S>
where
    R: RemoteSource,
    S: LocalStore,
{
    pub fn new(remote: R, store: S) -> Self {
        Self { remote, store }
    }

    /// The genre list: the whole cached table if non-empty, otherwise a remote
    /// fetch written through to the store.
    ///
    /// # Errors
    ///
    /// A remote failure on an empty cache is returned as
    /// [`CatalogError::Upstream`]; it never degrades into an empty list.
    pub async fn get_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        let cached = self.store.read_genres().await?;
        if !cached.is_empty() {
            tracing::debug!(count = cached.len(), "Genres served from cache");
            return Ok(cached);
        }

        let fetched = self.remote.fetch_genres().await?;
        self.store.write_genres(&fetched).await?;
        tracing::info!(count = fetched.len(), "Genres fetched and cached");
        Ok(fetched)
    }

    /// One page of movies for `(genre, offset)`.
    ///
    /// Any non-empty local result is returned as is, even when shorter than
    /// [`PAGE_SIZE`]: the remote is only consulted when the store has nothing
    /// at this offset. A non-empty remote page is persisted before it is
    /// returned; an empty one is returned without touching the store.
    pub async fn get_movies(
        &self,
        genre: Option<&str>,
        offset: u32,
    ) -> Result<Vec<Movie>, CatalogError> {
        let local = self.store.read_movies(genre, PAGE_SIZE, offset).await?;
        if !local.is_empty() {
            tracing::debug!(
                genre = ?genre,
                offset,
                count = local.len(),
                "Movie page served from cache"
            );
            return Ok(local);
        }

        let remote = self.remote.fetch_movies(PAGE_SIZE, offset, genre).await?;
        if !remote.is_empty() {
            self.store.write_movies(&remote).await?;
        }
        tracing::info!(
            genre = ?genre,
            offset,
            count = remote.len(),
            "Movie page fetched from remote"
        );
        Ok(remote)
    }
}

#[async_trait]
impl<R, S> Catalog for CatalogRepository<R, S>
where
    R: RemoteSource,
    S: LocalStore,
{
    async fn get_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        CatalogRepository::get_genres(self).await
    }

    async fn get_movies(
        &self,
        genre: Option<&str>,
        offset: u32,
    ) -> Result<Vec<Movie>, CatalogError> {
        CatalogRepository::get_movies(self, genre, offset).await
    }
}

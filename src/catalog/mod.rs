//! Cache-first catalog access.
//!
//! [`CatalogRepository`] composes a [`RemoteSource`](crate::remote::RemoteSource)
//! and a [`LocalStore`](crate::storage::LocalStore): reads are served from
//! the store when it has anything for the request, otherwise fetched
//! remotely and written through before being returned. The store is the
//! only place fetched data lands; nothing is ever deleted or expired.
//!
//! [`GenresQuery`] and [`PageQuery`] are the thin adapters the view state
//! uses to call into a [`Catalog`].

mod query;
mod repository;

pub use query::{GenresQuery, PageQuery};
pub use repository::CatalogRepository;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Genre, Movie};
use crate::remote::FetchError;
use crate::storage::DatabaseError;

/// Failure of a catalog read. Neither variant is retried anywhere.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The remote source failed (transport or decode)
    #[error("{0}")]
    Upstream(#[from] FetchError),
    /// The local store failed to read or write
    #[error("{0}")]
    Storage(#[from] DatabaseError),
}

/// Read access to the movie catalog as seen by the view state.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// The complete genre list.
    async fn get_genres(&self) -> Result<Vec<Genre>, CatalogError>;

    /// At most [`PAGE_SIZE`](crate::model::PAGE_SIZE) movies starting at `offset`.
    async fn get_movies(&self, genre: Option<&str>, offset: u32)
        -> Result<Vec<Movie>, CatalogError>;
}

use std::sync::Arc;

use super::{Catalog, CatalogError};
use crate::model::{Genre, Page};

/// Loads the complete genre list.
#[derive(Clone)]
pub struct GenresQuery {
    catalog: Arc<dyn Catalog>,
}

impl GenresQuery {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    pub async fn run(&self) -> Result<Vec<Genre>, CatalogError> {
        self.catalog.get_genres().await
    }
}

/// Loads one page of movies for a genre filter.
#[derive(Clone)]
pub struct PageQuery {
    catalog: Arc<dyn Catalog>,
}

impl PageQuery {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Fetch the page at `offset`, tagged with the request it answers.
    pub async fn run(&self, genre: Option<String>, offset: u32) -> Result<Page, CatalogError> {
        let movies = self.catalog.get_movies(genre.as_deref(), offset).await?;
        Ok(Page {
            genre,
            offset,
            movies,
        })
    }
}

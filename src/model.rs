//! Domain types shared by the remote source, the local store and the view state.

use serde::{Deserialize, Serialize};

/// Number of movies requested per page, locally and remotely.
pub const PAGE_SIZE: u32 = 100;

/// A genre summary as reported by the catalog backend.
///
/// `name` is the identity; a later fetch replaces `count` wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
    pub count: u32,
}

impl Genre {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// A movie record. `id` is the identity; re-fetching the same id overwrites every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub genres: Vec<String>,
    pub url: String,
}

impl Movie {
    /// True if any of this movie's genres contains `needle` (case-sensitive).
    ///
    /// Mirrors the store's filter, which tests containment against the
    /// comma-joined genre field rather than set membership.
    pub fn matches_genre(&self, needle: &str) -> bool {
        self.genres.join(",").contains(needle)
    }
}

/// One page of movies and the `(genre, offset)` request it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub genre: Option<String>,
    pub offset: u32,
    pub movies: Vec<Movie>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }
}

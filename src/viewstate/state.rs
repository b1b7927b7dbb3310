use crate::model::{Genre, Movie};

/// Snapshot of the catalog screen published to subscribers.
///
/// `movies` accumulates page by page within one session and is cleared when
/// a refresh or genre switch starts a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub genres: Vec<Genre>,
    pub selected_genre: Option<String>,
    pub movies: Vec<Movie>,
    pub has_more: bool,
    pub is_loading_more: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            is_loading: true,
            error: None,
            genres: Vec::new(),
            selected_genre: None,
            movies: Vec::new(),
            has_more: true,
            is_loading_more: false,
        }
    }
}

impl ViewState {
    /// Neither a refresh nor a load-more is in flight.
    pub fn is_idle(&self) -> bool {
        !self.is_loading && !self.is_loading_more
    }

    /// Whether a `load_more` issued now would start a fetch.
    pub fn can_load_more(&self) -> bool {
        self.has_more && self.is_idle()
    }
}

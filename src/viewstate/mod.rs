//! Single-writer state machine driving the catalog screen.
//!
//! [`CatalogViewState`] owns a background task (the runner) that holds the
//! only mutable [`ViewState`]. Commands arrive on a mailbox; fetches run as
//! child tasks and report back tagged with the session token that started
//! them. A refresh or genre switch bumps the token and aborts every child
//! task, so a slow result from a superseded session is never applied.

mod events;
mod handle;
mod helpers;
mod runner;
mod state;

pub use events::Command;
pub use handle::{CatalogViewState, ViewStateError};
pub use state::ViewState;

#[cfg(test)]
mod tests {
    use super::events::SessionEvent;
    use super::runner::Runner;
    use super::*;
    use crate::catalog::{Catalog, CatalogError, GenresQuery, PageQuery};
    use crate::model::{Genre, Movie, Page};
    use crate::remote::FetchError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::{watch, Notify};

    type GateKey = (Option<String>, u32);

    /// Catalog serving `movies` in pages of `page_size`, with optional failures and gates.
    struct FakeCatalog {
        genres: Vec<Genre>,
        genre_error: Option<String>,
        movies: Vec<Movie>,
        page_size: usize,
        fail_at: Option<u32>,
        panic_at: Option<u32>,
        gates: Mutex<HashMap<GateKey, Arc<Notify>>>,
        calls: Mutex<Vec<GateKey>>,
    }

    impl Default for FakeCatalog {
        fn default() -> Self {
            Self {
                genres: Vec::new(),
                genre_error: None,
                movies: Vec::new(),
                page_size: 100,
                fail_at: None,
                panic_at: None,
                gates: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl FakeCatalog {
        /// Block fetches for `(genre, offset)` until the returned gate is notified.
        fn gate(&self, genre: Option<&str>, offset: u32) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert((genre.map(str::to_string), offset), Arc::clone(&notify));
            notify
        }

        fn calls(&self) -> Vec<GateKey> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Catalog for FakeCatalog {
        async fn get_genres(&self) -> Result<Vec<Genre>, CatalogError> {
            match &self.genre_error {
                Some(body) => Err(CatalogError::Upstream(FetchError::HttpStatus {
                    status: 500,
                    body: body.clone(),
                })),
                None => Ok(self.genres.clone()),
            }
        }

        async fn get_movies(
            &self,
            genre: Option<&str>,
            offset: u32,
        ) -> Result<Vec<Movie>, CatalogError> {
            let key = (genre.map(str::to_string), offset);
            self.calls.lock().unwrap().push(key.clone());
            let gate = self.gates.lock().unwrap().get(&key).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.panic_at == Some(offset) {
                panic!("page {} exploded", offset);
            }
            if self.fail_at == Some(offset) {
                return Err(CatalogError::Upstream(FetchError::Timeout(
                    Duration::from_secs(10),
                )));
            }
            Ok(self
                .movies
                .iter()
                .filter(|m| genre.map_or(true, |g| m.matches_genre(g)))
                .skip(offset as usize)
                .take(self.page_size)
                .cloned()
                .collect())
        }
    }

    fn movie(id: &str, title: &str, genres: &[&str]) -> Movie {
        Movie {
            id: id.to_string(),
            title: title.to_string(),
            overview: "overview".to_string(),
            release_date: "2020".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            url: "https://example.com".to_string(),
        }
    }

    fn titles(state: &ViewState) -> Vec<&str> {
        state.movies.iter().map(|m| m.title.as_str()).collect()
    }

    async fn wait(vs: &CatalogViewState, predicate: impl FnMut(&ViewState) -> bool) -> ViewState {
        tokio::time::timeout(Duration::from_secs(5), vs.wait_until(predicate))
            .await
            .expect("state never reached")
            .unwrap()
    }

    async fn settled(vs: &CatalogViewState) -> ViewState {
        wait(vs, |s| s.is_idle()).await
    }

    #[tokio::test]
    async fn test_initial_refresh_loads_genres_and_first_page() {
        let catalog = FakeCatalog {
            genres: vec![Genre::new("Fantasy", 1)],
            movies: vec![movie("1", "Fantasy Movie", &["Fantasy"])],
            ..FakeCatalog::default()
        };
        let vs = CatalogViewState::spawn(Arc::new(catalog));

        let state = settled(&vs).await;
        assert_eq!(state.genres, vec![Genre::new("Fantasy", 1)]);
        assert_eq!(titles(&state), vec!["Fantasy Movie"]);
        assert!(state.has_more);
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_select_genre_filters_and_reads_back() {
        let catalog = FakeCatalog {
            movies: vec![
                movie("1", "Fantasy Movie", &["Fantasy"]),
                movie("2", "Drama Movie", &["Drama"]),
                movie("3", "Epic", &["Adventure", "Fantasy"]),
            ],
            ..FakeCatalog::default()
        };
        let vs = CatalogViewState::spawn(Arc::new(catalog));
        assert_eq!(settled(&vs).await.movies.len(), 3);

        vs.select_genre(Some("Fantasy".into())).await.unwrap();
        let state = settled(&vs).await;
        assert_eq!(state.selected_genre.as_deref(), Some("Fantasy"));
        assert_eq!(titles(&state), vec!["Fantasy Movie", "Epic"]);
        assert!(state.movies.iter().all(|m| m.matches_genre("Fantasy")));
    }

    #[tokio::test]
    async fn test_load_more_appends_in_order() {
        let catalog = FakeCatalog {
            movies: vec![movie("1", "Movie 1", &["Drama"]), movie("2", "Movie 2", &["Drama"])],
            page_size: 1,
            ..FakeCatalog::default()
        };
        let vs = CatalogViewState::spawn(Arc::new(catalog));
        assert_eq!(titles(&settled(&vs).await), vec!["Movie 1"]);

        vs.load_more().await.unwrap();
        let state = settled(&vs).await;
        assert_eq!(titles(&state), vec!["Movie 1", "Movie 2"]);
        assert!(state.has_more);
    }

    #[tokio::test]
    async fn test_genre_failure_surfaces_message() {
        let catalog = FakeCatalog {
            genre_error: Some("boom".into()),
            ..FakeCatalog::default()
        };
        let vs = CatalogViewState::spawn(Arc::new(catalog));

        let state = settled(&vs).await;
        assert!(state.error.as_deref().unwrap().contains("boom"));
        assert!(state.movies.is_empty());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_genre_failure_ends_loading_while_page_in_flight() {
        let catalog = Arc::new(FakeCatalog {
            genre_error: Some("boom".into()),
            movies: vec![movie("1", "Movie 1", &["Drama"])],
            ..FakeCatalog::default()
        });
        let gate = catalog.gate(None, 0);
        let vs = CatalogViewState::spawn(catalog.clone());

        let state = wait(&vs, |s| s.error.is_some()).await;
        assert_eq!(state.error.as_deref(), Some("HTTP 500: boom"));
        assert!(!state.is_loading);
        assert!(state.movies.is_empty());

        vs.load_more().await.unwrap();
        assert!(!vs.state().is_loading_more);

        gate.notify_one();
        let state = wait(&vs, |s| !s.movies.is_empty()).await;
        assert_eq!(titles(&state), vec!["Movie 1"]);
        assert_eq!(catalog.calls(), vec![(None, 0)]);
        assert_eq!(state.error.as_deref(), Some("HTTP 500: boom"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_short_pages_do_not_end_pagination() {
        let catalog = Arc::new(FakeCatalog {
            movies: vec![movie("1", "Movie 1", &["Drama"]), movie("2", "Movie 2", &["Drama"])],
            page_size: 1,
            ..FakeCatalog::default()
        });
        let vs = CatalogViewState::spawn(catalog.clone());

        assert!(settled(&vs).await.has_more);
        vs.load_more().await.unwrap();
        assert!(settled(&vs).await.has_more);

        // Only an empty page ends pagination.
        vs.load_more().await.unwrap();
        let state = settled(&vs).await;
        assert!(!state.has_more);
        assert_eq!(state.movies.len(), 2);

        vs.load_more().await.unwrap();
        assert_eq!(settled(&vs).await.movies.len(), 2);
        assert_eq!(catalog.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_load_more_ignored_while_loading_more() {
        let catalog = Arc::new(FakeCatalog {
            movies: vec![movie("1", "Movie 1", &["Drama"]), movie("2", "Movie 2", &["Drama"])],
            page_size: 1,
            ..FakeCatalog::default()
        });
        let gate = catalog.gate(None, 1);
        let vs = CatalogViewState::spawn(catalog.clone());
        settled(&vs).await;

        vs.load_more().await.unwrap();
        assert!(vs.state().is_loading_more);
        vs.load_more().await.unwrap();

        gate.notify_one();
        let state = settled(&vs).await;
        assert_eq!(titles(&state), vec!["Movie 1", "Movie 2"]);
        assert_eq!(catalog.calls(), vec![(None, 0), (None, 1)]);
    }

    #[tokio::test]
    async fn test_load_more_ignored_during_initial_load() {
        let catalog = Arc::new(FakeCatalog {
            movies: vec![movie("1", "Movie 1", &["Drama"])],
            ..FakeCatalog::default()
        });
        let gate = catalog.gate(None, 0);
        let vs = CatalogViewState::spawn(catalog.clone());

        vs.load_more().await.unwrap();
        assert!(vs.state().is_loading);
        assert!(!vs.state().is_loading_more);

        gate.notify_one();
        settled(&vs).await;
        assert_eq!(catalog.calls(), vec![(None, 0)]);
    }

    #[tokio::test]
    async fn test_select_genre_cancels_load_more() {
        let catalog = Arc::new(FakeCatalog {
            movies: vec![
                movie("1", "Movie 1", &["Drama"]),
                movie("2", "Movie 2", &["Comedy"]),
                movie("3", "Movie 3", &["Drama"]),
            ],
            page_size: 1,
            ..FakeCatalog::default()
        });
        let gate = catalog.gate(None, 1);
        let vs = CatalogViewState::spawn(catalog.clone());
        settled(&vs).await;

        vs.load_more().await.unwrap();
        assert!(vs.state().is_loading_more);

        let drama = catalog.gate(Some("Drama"), 0);
        vs.select_genre(Some("Drama".into())).await.unwrap();
        let state = vs.state();
        assert!(!state.is_loading_more);
        assert!(state.movies.is_empty());

        // Releasing the superseded fetch must not leak "Movie 2" into the new session.
        gate.notify_one();
        drama.notify_one();
        let state = settled(&vs).await;
        assert_eq!(titles(&state), vec!["Movie 1"]);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(titles(&vs.state()), vec!["Movie 1"]);
    }

    #[tokio::test]
    async fn test_refresh_supersedes_slow_session() {
        let catalog = Arc::new(FakeCatalog {
            movies: vec![movie("1", "Drama Movie", &["Drama"]), movie("2", "Comedy Movie", &["Comedy"])],
            ..FakeCatalog::default()
        });
        let slow = catalog.gate(None, 0);
        let vs = CatalogViewState::spawn(catalog.clone());

        vs.select_genre(Some("Comedy".into())).await.unwrap();
        let state = settled(&vs).await;
        assert_eq!(titles(&state), vec!["Comedy Movie"]);

        slow.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(titles(&vs.state()), vec!["Comedy Movie"]);
    }

    #[tokio::test]
    async fn test_load_more_failure_keeps_items() {
        let catalog = FakeCatalog {
            movies: vec![movie("1", "Movie 1", &["Drama"]), movie("2", "Movie 2", &["Drama"])],
            page_size: 1,
            fail_at: Some(1),
            ..FakeCatalog::default()
        };
        let vs = CatalogViewState::spawn(Arc::new(catalog));
        settled(&vs).await;

        vs.load_more().await.unwrap();
        let state = wait(&vs, |s| s.error.is_some()).await;
        assert!(!state.is_loading_more);
        assert_eq!(titles(&state), vec!["Movie 1"]);
        assert!(state.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_refresh_clears_error_and_items() {
        let catalog = FakeCatalog {
            movies: vec![movie("1", "Movie 1", &["Drama"]), movie("2", "Movie 2", &["Drama"])],
            page_size: 1,
            fail_at: Some(1),
            ..FakeCatalog::default()
        };
        let catalog = Arc::new(catalog);
        let vs = CatalogViewState::spawn(catalog.clone());
        settled(&vs).await;
        vs.load_more().await.unwrap();
        wait(&vs, |s| s.error.is_some()).await;

        let gate = catalog.gate(None, 0);
        vs.refresh().await.unwrap();
        let started = vs.state();
        assert!(started.is_loading);
        assert!(started.error.is_none());
        assert!(started.movies.is_empty());
        assert!(started.has_more);

        gate.notify_one();
        let state = settled(&vs).await;
        assert_eq!(titles(&state), vec!["Movie 1"]);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_panicking_fetch_becomes_error() {
        let catalog = FakeCatalog {
            panic_at: Some(0),
            ..FakeCatalog::default()
        };
        let vs = CatalogViewState::spawn(Arc::new(catalog));

        let state = settled(&vs).await;
        let error = state.error.unwrap();
        assert!(error.contains("first_page"));
        assert!(error.contains("page 0 exploded"));
    }

    #[tokio::test]
    async fn test_shutdown_closes_state_stream() {
        let vs = CatalogViewState::spawn(Arc::new(FakeCatalog::default()));
        settled(&vs).await;
        let mut rx = vs.subscribe();
        let _ = rx.borrow_and_update();

        vs.shutdown().await;
        assert!(rx.changed().await.is_err());
    }

    fn runner(catalog: Arc<FakeCatalog>) -> Runner {
        let (state_tx, _) = watch::channel(ViewState::default());
        Runner::new(
            GenresQuery::new(catalog.clone()),
            PageQuery::new(catalog),
            state_tx,
        )
    }

    fn page(offset: u32, movies: Vec<Movie>) -> Result<Page, String> {
        Ok(Page {
            genre: None,
            offset,
            movies,
        })
    }

    #[tokio::test]
    async fn test_stale_results_are_discarded() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.gate(None, 0);
        catalog.gate(Some("Drama"), 0);
        let mut runner = runner(catalog);

        runner.start_session();
        runner.handle_command(Command::SelectGenre(Some("Drama".into())));

        runner.handle_event(SessionEvent::FirstPageLoaded {
            session: 1,
            result: page(0, vec![movie("9", "Old", &["Comedy"])]),
        });
        runner.handle_event(SessionEvent::MoreLoaded {
            session: 1,
            result: page(100, vec![movie("8", "Older", &["Comedy"])]),
        });
        assert!(runner.state().movies.is_empty());
        assert!(runner.state().is_loading);

        runner.handle_event(SessionEvent::GenresLoaded {
            session: 2,
            result: Ok(vec![Genre::new("Drama", 1)]),
        });
        assert!(runner.state().is_loading);
        runner.handle_event(SessionEvent::FirstPageLoaded {
            session: 2,
            result: page(0, vec![movie("1", "New", &["Drama"])]),
        });
        assert!(!runner.state().is_loading);
        assert_eq!(titles(runner.state()), vec!["New"]);
    }

    #[tokio::test]
    async fn test_branch_error_is_not_undone_by_later_success() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.gate(None, 0);
        let mut runner = runner(catalog);
        runner.start_session();

        runner.handle_event(SessionEvent::GenresLoaded {
            session: 1,
            result: Err("HTTP 502: bad gateway".into()),
        });
        assert_eq!(runner.state().error.as_deref(), Some("HTTP 502: bad gateway"));
        assert!(!runner.state().is_loading);

        // The first page is still in flight, so paging must wait for it.
        runner.handle_command(Command::LoadMore);
        assert!(!runner.state().is_loading_more);

        runner.handle_event(SessionEvent::FirstPageLoaded {
            session: 1,
            result: page(0, vec![movie("1", "Kept", &["Drama"])]),
        });
        let state = runner.state();
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("HTTP 502: bad gateway"));
        assert_eq!(titles(state), vec!["Kept"]);
    }

    #[tokio::test]
    async fn test_empty_first_page_ends_pagination() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.gate(None, 0);
        let mut runner = runner(catalog);
        runner.start_session();

        runner.handle_event(SessionEvent::GenresLoaded {
            session: 1,
            result: Ok(Vec::new()),
        });
        runner.handle_event(SessionEvent::FirstPageLoaded {
            session: 1,
            result: page(0, Vec::new()),
        });
        assert!(!runner.state().has_more);
        assert!(!runner.state().can_load_more());
    }
}

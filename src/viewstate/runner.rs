use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::events::{Command, Envelope, SessionEvent};
use super::helpers::{catch_task_panic, fold_outcome};
use super::state::ViewState;
use crate::catalog::{GenresQuery, PageQuery};

/// Capacity of the channel carrying background results back to the actor.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Single owner of [`ViewState`]. Every mutation happens in [`Runner::run`].
pub(super) struct Runner {
    state: ViewState,
    /// Monotonic session token; results tagged with an older one are dropped.
    session: u64,
    genres_pending: bool,
    first_page_pending: bool,
    genres_handle: Option<JoinHandle<()>>,
    first_page_handle: Option<JoinHandle<()>>,
    load_more_handle: Option<JoinHandle<()>>,
    genres_query: GenresQuery,
    page_query: PageQuery,
    event_tx: mpsc::Sender<SessionEvent>,
    event_rx: mpsc::Receiver<SessionEvent>,
    state_tx: watch::Sender<ViewState>,
}

impl Runner {
    pub fn new(
        genres_query: GenresQuery,
        page_query: PageQuery,
        state_tx: watch::Sender<ViewState>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: ViewState::default(),
            session: 0,
            genres_pending: false,
            first_page_pending: false,
            genres_handle: None,
            first_page_handle: None,
            load_more_handle: None,
            genres_query,
            page_query,
            event_tx,
            event_rx,
            state_tx,
        }
    }

    /// Process commands and background results until the mailbox closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Envelope>) {
        loop {
            tokio::select! {
                envelope = commands.recv() => match envelope {
                    Some(Envelope { command, ack }) => {
                        self.handle_command(command);
                        self.publish();
                        // The caller may have stopped waiting; that is fine.
                        let _ = ack.send(());
                    }
                    None => break,
                },
                // The runner holds a sender, so this never yields None.
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                    self.publish();
                }
            }
        }
        tracing::debug!(session = self.session, "View state mailbox closed");
    }

    pub(super) fn handle_command(&mut self, command: Command) {
        match command {
            Command::Refresh => self.start_session(),
            Command::SelectGenre(genre) => {
                tracing::info!(genre = ?genre, "Genre selected");
                self.state.selected_genre = genre;
                self.start_session();
            }
            Command::LoadMore => self.load_more(),
        }
    }

    /// Cancel the previous session and start loading genres and the first page.
    pub(super) fn start_session(&mut self) {
        self.abort_tasks();
        self.session = self.session.wrapping_add(1);
        let session = self.session;

        self.state.movies.clear();
        self.state.has_more = true;
        self.state.error = None;
        self.state.is_loading = true;
        self.state.is_loading_more = false;
        self.genres_pending = true;
        self.first_page_pending = true;

        let genre = self.state.selected_genre.clone();
        tracing::info!(session, genre = ?genre, "Catalog session started");

        let query = self.genres_query.clone();
        let tx = self.event_tx.clone();
        self.genres_handle = Some(tokio::spawn(async move {
            let result = fold_outcome("genres", catch_task_panic(query.run()).await);
            if let Err(e) = tx.send(SessionEvent::GenresLoaded { session, result }).await {
                tracing::debug!(error = %e, "Genre result dropped (runner gone)");
            }
        }));

        let query = self.page_query.clone();
        let tx = self.event_tx.clone();
        self.first_page_handle = Some(tokio::spawn(async move {
            let result = fold_outcome("first_page", catch_task_panic(query.run(genre, 0)).await);
            if let Err(e) = tx.send(SessionEvent::FirstPageLoaded { session, result }).await {
                tracing::debug!(error = %e, "First page dropped (runner gone)");
            }
        }));
    }

    fn load_more(&mut self) {
        // A failed branch clears `is_loading` early; the first page may still be in flight.
        if self.state.is_loading_more
            || !self.state.has_more
            || self.state.is_loading
            || self.first_page_pending
        {
            tracing::debug!(
                is_loading = self.state.is_loading,
                first_page_pending = self.first_page_pending,
                is_loading_more = self.state.is_loading_more,
                has_more = self.state.has_more,
                "load_more ignored"
            );
            return;
        }

        let session = self.session;
        let offset = u32::try_from(self.state.movies.len()).unwrap_or(u32::MAX);
        let genre = self.state.selected_genre.clone();
        self.state.is_loading_more = true;
        tracing::debug!(session, offset, genre = ?genre, "Loading more movies");

        let query = self.page_query.clone();
        let tx = self.event_tx.clone();
        self.load_more_handle = Some(tokio::spawn(async move {
            let result = fold_outcome("load_more", catch_task_panic(query.run(genre, offset)).await);
            if let Err(e) = tx.send(SessionEvent::MoreLoaded { session, result }).await {
                tracing::debug!(error = %e, "Next page dropped (runner gone)");
            }
        }));
    }

    pub(super) fn handle_event(&mut self, event: SessionEvent) {
        if event.session() != self.session {
            tracing::debug!(
                event = event.name(),
                stale = event.session(),
                current = self.session,
                "Discarding result from superseded session"
            );
            return;
        }

        match event {
            SessionEvent::GenresLoaded { result, .. } => {
                self.genres_pending = false;
                self.genres_handle = None;
                match result {
                    Ok(genres) => self.state.genres = genres,
                    Err(message) => {
                        self.state.error = Some(message);
                        self.state.is_loading = false;
                    }
                }
                self.finish_refresh_branch();
            }
            SessionEvent::FirstPageLoaded { result, .. } => {
                self.first_page_pending = false;
                self.first_page_handle = None;
                match result {
                    Ok(page) => {
                        self.state.has_more = !page.is_empty();
                        self.state.movies = page.movies;
                    }
                    Err(message) => {
                        self.state.error = Some(message);
                        self.state.is_loading = false;
                    }
                }
                self.finish_refresh_branch();
            }
            SessionEvent::MoreLoaded { result, .. } => {
                self.load_more_handle = None;
                self.state.is_loading_more = false;
                match result {
                    Ok(page) => {
                        self.state.has_more = !page.is_empty();
                        tracing::debug!(
                            offset = page.offset,
                            count = page.len(),
                            total = self.state.movies.len() + page.len(),
                            "Page appended"
                        );
                        self.state.movies.extend(page.movies);
                    }
                    Err(message) => self.state.error = Some(message),
                }
            }
        }
    }

    fn finish_refresh_branch(&mut self) {
        if !self.genres_pending && !self.first_page_pending {
            self.state.is_loading = false;
            tracing::info!(
                session = self.session,
                genres = self.state.genres.len(),
                movies = self.state.movies.len(),
                error = self.state.error.is_some(),
                "Catalog session loaded"
            );
        }
    }

    fn abort_tasks(&mut self) {
        for handle in [
            self.genres_handle.take(),
            self.first_page_handle.take(),
            self.load_more_handle.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }

    fn publish(&self) {
        self.state_tx.send_if_modified(|current| {
            if *current == self.state {
                false
            } else {
                current.clone_from(&self.state);
                true
            }
        });
    }

    #[cfg(test)]
    pub(super) fn state(&self) -> &ViewState {
        &self.state
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

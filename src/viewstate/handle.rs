use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::events::{Command, Envelope};
use super::runner::Runner;
use super::state::ViewState;
use crate::catalog::{Catalog, GenresQuery, PageQuery};

/// Capacity of the command mailbox.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum ViewStateError {
    #[error("View state task is no longer running")]
    Closed,
}

/// Handle to the view-state actor.
///
/// Commands are queued to a single task that owns the state; snapshots are
/// broadcast over a `watch` channel. Each command method returns once the
/// actor has applied the command's immediate transition (flags set, work
/// started), not when the work finishes.
pub struct CatalogViewState {
    commands: Option<mpsc::Sender<Envelope>>,
    state_rx: watch::Receiver<ViewState>,
    task: Option<JoinHandle<()>>,
}

impl CatalogViewState {
    /// Start the actor and its initial refresh. Must be called within a Tokio runtime.
    pub fn spawn(catalog: Arc<dyn Catalog>) -> Self {
        let (state_tx, state_rx) = watch::channel(ViewState::default());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let mut runner = Runner::new(
            GenresQuery::new(Arc::clone(&catalog)),
            PageQuery::new(catalog),
            state_tx,
        );
        runner.start_session();
        let task = tokio::spawn(runner.run(command_rx));

        Self {
            commands: Some(command_tx),
            state_rx,
            task: Some(task),
        }
    }

    /// Start a new session for the current genre, cancelling all in-flight work.
    pub async fn refresh(&self) -> Result<(), ViewStateError> {
        self.send(Command::Refresh).await
    }

    /// Switch the genre filter (`None` for all genres) and start a new session.
    pub async fn select_genre(&self, genre: Option<String>) -> Result<(), ViewStateError> {
        self.send(Command::SelectGenre(genre)).await
    }

    /// Fetch the next page. Ignored while loading or once the list is exhausted.
    pub async fn load_more(&self) -> Result<(), ViewStateError> {
        self.send(Command::LoadMore).await
    }

    /// The latest published snapshot.
    pub fn state(&self) -> ViewState {
        self.state_rx.borrow().clone()
    }

    /// A receiver that observes every subsequent snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_rx.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`, returning it.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&ViewState) -> bool,
    ) -> Result<ViewState, ViewStateError> {
        let mut rx = self.state_rx.clone();
        let state = rx
            .wait_for(predicate)
            .await
            .map_err(|_| ViewStateError::Closed)?;
        Ok(state.clone())
    }

    /// Close the mailbox and wait for the actor to exit. In-flight fetches are aborted.
    pub async fn shutdown(mut self) {
        drop(self.commands.take());
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "View state task ended abnormally");
            }
        }
    }

    async fn send(&self, command: Command) -> Result<(), ViewStateError> {
        let commands = self.commands.as_ref().ok_or(ViewStateError::Closed)?;
        let (ack, done) = oneshot::channel();
        commands
            .send(Envelope { command, ack })
            .await
            .map_err(|_| ViewStateError::Closed)?;
        done.await.map_err(|_| ViewStateError::Closed)
    }
}

impl Drop for CatalogViewState {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Aborted view state task on drop");
        }
    }
}

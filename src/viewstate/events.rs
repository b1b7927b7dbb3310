use tokio::sync::oneshot;

use crate::model::{Genre, Page};

/// A request from the handle to the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    SelectGenre(Option<String>),
    LoadMore,
}

/// A command plus the channel acknowledging that its state transition is published.
pub(super) struct Envelope {
    pub command: Command,
    pub ack: oneshot::Sender<()>,
}

/// Result of background work, tagged with the session that started it.
///
/// Errors are already rendered to the message shown in `ViewState::error`.
#[derive(Debug)]
pub(super) enum SessionEvent {
    GenresLoaded {
        session: u64,
        result: Result<Vec<Genre>, String>,
    },
    FirstPageLoaded {
        session: u64,
        result: Result<Page, String>,
    },
    MoreLoaded {
        session: u64,
        result: Result<Page, String>,
    },
}

impl SessionEvent {
    pub fn session(&self) -> u64 {
        match self {
            SessionEvent::GenresLoaded { session, .. }
            | SessionEvent::FirstPageLoaded { session, .. }
            | SessionEvent::MoreLoaded { session, .. } => *session,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::GenresLoaded { .. } => "GenresLoaded",
            SessionEvent::FirstPageLoaded { .. } => "FirstPageLoaded",
            SessionEvent::MoreLoaded { .. } => "MoreLoaded",
        }
    }
}

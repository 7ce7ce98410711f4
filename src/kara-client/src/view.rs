use crate::playlist::PlaylistView;
use crate::reconciler::DisplayPlayerState;
use kara_core::{LibraryPage, Song, SongId};
use std::fmt;

/// User actions that reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Enqueue,
    Remove,
    TogglePause,
    Skip,
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            UserAction::Enqueue => "add song to playlist",
            UserAction::Remove => "remove playlist entry",
            UserAction::TogglePause => "toggle pause",
            UserAction::Skip => "skip song",
        };
        f.write_str(verb)
    }
}

/// Transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    AddedToPlaylist { song: SongId },
    ActionFailed { action: UserAction, message: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::AddedToPlaylist { .. } => f.write_str("Added to Playlist"),
            Notification::ActionFailed { action, message } => {
                write!(f, "Could not {action}: {message}")
            }
        }
    }
}

/// Projection of the current library page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryView {
    pub query: String,
    pub count: u64,
    pub songs: Vec<Song>,
    pub has_next: bool,
    pub has_previous: bool,
}

impl LibraryView {
    pub fn from_page(page: &LibraryPage, query: &str) -> Self {
        Self {
            query: query.to_string(),
            count: page.count,
            songs: page.results.clone(),
            has_next: page.has_next(),
            has_previous: page.has_previous(),
        }
    }

    pub fn count_label(&self) -> String {
        match self.count {
            1 => "1 song found".to_string(),
            n => format!("{n} songs found"),
        }
    }

    /// `first()` is only meaningful away from the first page.
    pub fn first_enabled(&self) -> bool {
        self.has_previous
    }

    /// `last()` is only meaningful before the last page.
    pub fn last_enabled(&self) -> bool {
        self.has_next
    }
}

/// Rendering collaborator. The engine calls it after every state change it
/// applies; implementations must not block.
pub trait Presenter: Send + Sync {
    fn player_changed(&self, _state: &DisplayPlayerState) {}

    fn playlist_changed(&self, _view: &PlaylistView) {}

    fn library_changed(&self, _view: &LibraryView) {}

    fn notify(&self, _notification: &Notification) {}
}

/// Presenter that renders nothing; for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

//! Client engine for a karaoke-queue server: polls player and playlist state,
//! tracks in-flight control commands and pages through the song library.
//!
//! Transport is injected through [`kara_core::Gateway`]; rendering through
//! [`Presenter`].

pub mod endpoints;
mod error;
mod library;
mod playlist;
mod poll;
mod reconciler;
mod sequence;
mod session;
mod tracker;
mod view;

#[cfg(test)]
mod testing;

pub use error::{ClientError, ClientResult, Resource};
pub use library::LibraryPaginator;
pub use playlist::{PlaylistStore, PlaylistView};
pub use poll::PollLoop;
pub use reconciler::{timing_slice, DisplayPlayerState, PlaybackIcon, PlayerReconciler};
pub use sequence::{SequenceGuard, Ticket};
pub use session::PlayerSession;
pub use tracker::{CommandKind, CommandTicket, CommandTracker, Expectation, PendingCommand};
pub use view::{LibraryView, Notification, NullPresenter, Presenter, UserAction};

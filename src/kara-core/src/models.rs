use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// A library song identifier.
///
/// The server hands out integers; the client treats them as opaque and never
/// derives one from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub u64);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for SongId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A playlist entry identifier. Distinct from [`SongId`]: the same song may be
/// queued several times, each occurrence with its own entry id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for EntryId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
}

/// One queued occurrence of a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: EntryId,
    pub song: Song,
}

/// Server-ordered playlist contents. Replaced wholesale on every poll.
///
/// The playlist endpoint wraps results in a paginated envelope; the cursor
/// fields of that envelope are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    pub count: u64,
    pub results: Vec<PlaylistEntry>,
}

/// Authoritative player state as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatus {
    #[serde(default)]
    pub playlist_entry: Option<PlaylistEntry>,
    #[serde(default)]
    pub paused: bool,
    /// Time code such as `00:01:23.456`; absent when nothing plays.
    #[serde(default)]
    pub timing: Option<String>,
}

impl PlayerStatus {
    pub fn playing_id(&self) -> Option<EntryId> {
        self.playlist_entry.as_ref().map(|entry| entry.id)
    }
}

/// A single page of the song catalog plus its navigation cursors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPage {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<Song>,
}

impl LibraryPage {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Control command body accepted by the player manage endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PlayerCommand {
    Pause { pause: bool },
    Skip { skip: bool },
}

impl PlayerCommand {
    pub fn pause(pause: bool) -> Self {
        PlayerCommand::Pause { pause }
    }

    pub fn skip() -> Self {
        PlayerCommand::Skip { skip: true }
    }

    pub fn body(&self) -> Value {
        match *self {
            PlayerCommand::Pause { pause } => json!({ "pause": pause }),
            PlayerCommand::Skip { skip } => json!({ "skip": skip }),
        }
    }
}

/// Body of an enqueue request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnqueueRequest {
    pub song: SongId,
}

impl EnqueueRequest {
    pub fn body(&self) -> Value {
        json!({ "song": self.song.0 })
    }
}

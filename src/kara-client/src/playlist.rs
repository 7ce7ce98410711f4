use kara_core::{EntryId, PlaylistEntry, PlaylistSnapshot};

/// Projection of the playlist shown next to the player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistView {
    /// Size reported by the server, the playing entry included.
    pub count: u64,
    pub upcoming: Vec<PlaylistEntry>,
}

impl PlaylistView {
    /// Entry shown as "Next" when the list is collapsed.
    pub fn next(&self) -> Option<&PlaylistEntry> {
        self.upcoming.first()
    }

    pub fn count_label(&self) -> String {
        match self.count {
            1 => "1 song in playlist".to_string(),
            n => format!("{n} songs in playlist"),
        }
    }
}

/// Latest playlist snapshot received from the server.
#[derive(Debug, Default)]
pub struct PlaylistStore {
    snapshot: PlaylistSnapshot,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshot(&mut self, snapshot: PlaylistSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &PlaylistSnapshot {
        &self.snapshot
    }

    /// Snapshot entries minus the first one whose id is `playing`.
    pub fn upcoming(&self, playing: Option<EntryId>) -> Vec<PlaylistEntry> {
        let skip_at = playing.and_then(|id| {
            self.snapshot
                .results
                .iter()
                .position(|entry| entry.id == id)
        });
        self.snapshot
            .results
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != skip_at)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn view(&self, playing: Option<EntryId>) -> PlaylistView {
        PlaylistView {
            count: self.snapshot.count,
            upcoming: self.upcoming(playing),
        }
    }
}

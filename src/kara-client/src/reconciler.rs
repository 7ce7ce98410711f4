use crate::tracker::CommandTracker;
use kara_core::PlayerStatus;

/// Icon naming the server-reported player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackIcon {
    Play,
    Pause,
    Stop,
}

/// Everything the player widget needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPlayerState {
    pub song_title: Option<String>,
    pub icon: PlaybackIcon,
    /// `mm:ss`, or empty until a timing has been observed.
    pub timing: String,
    pub show_pause_pending_spinner: bool,
    pub show_skip_pending_spinner: bool,
}

impl DisplayPlayerState {
    pub fn has_entry(&self) -> bool {
        self.icon != PlaybackIcon::Stop
    }

    pub fn pause_control_enabled(&self) -> bool {
        self.has_entry() && !self.show_pause_pending_spinner
    }

    pub fn skip_control_enabled(&self) -> bool {
        self.has_entry() && !self.show_skip_pending_spinner
    }
}

/// Merges polled status with pending commands.
///
/// Holds the last observed timing so a poll that omits it keeps showing the
/// previous value instead of blanking the display.
#[derive(Debug, Default)]
pub struct PlayerReconciler {
    last_timing: Option<String>,
}

impl PlayerReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_timing(&self) -> Option<&str> {
        self.last_timing.as_deref()
    }

    pub fn project(
        &mut self,
        status: &PlayerStatus,
        tracker: &CommandTracker,
    ) -> DisplayPlayerState {
        match status.timing.as_deref().and_then(timing_slice) {
            Some(timing) => self.last_timing = Some(timing),
            None if status.playlist_entry.is_some() => {
                tracing::debug!("player status without timing, keeping previous value");
            }
            None => {}
        }

        let (song_title, icon) = match &status.playlist_entry {
            Some(entry) if status.paused => (Some(entry.song.title.clone()), PlaybackIcon::Pause),
            Some(entry) => (Some(entry.song.title.clone()), PlaybackIcon::Play),
            None => (None, PlaybackIcon::Stop),
        };

        DisplayPlayerState {
            song_title,
            icon,
            timing: self.last_timing.clone().unwrap_or_default(),
            show_pause_pending_spinner: tracker.is_pause_pending(),
            show_skip_pending_spinner: status
                .playing_id()
                .is_some_and(|id| tracker.is_skip_pending(id)),
        }
    }
}

/// `HH:MM:SS.fff` → `MM:SS` (characters 3 to 7). Too-short input yields `None`.
pub fn timing_slice(raw: &str) -> Option<String> {
    let slice: String = raw.chars().skip(3).take(5).collect();
    if slice.is_empty() {
        None
    } else {
        Some(slice)
    }
}

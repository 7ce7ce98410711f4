use kara_core::{EntryId, PlayerStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    PauseToggle,
    Skip,
}

/// What a polled status has to show for a pending command to count as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// The player reports this paused flag.
    Paused(bool),
    /// The player no longer plays this entry.
    LeftEntry(EntryId),
}

impl Expectation {
    fn is_met_by(&self, status: &PlayerStatus) -> bool {
        match *self {
            Expectation::Paused(expected) => status.paused == expected,
            Expectation::LeftEntry(target) => status.playing_id() != Some(target),
        }
    }
}

/// Identifies one issued command so a late failure cannot clear a newer
/// command of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTicket {
    kind: CommandKind,
    serial: u64,
}

impl CommandTicket {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub expected: Expectation,
    serial: u64,
    age_ticks: u32,
}

impl PendingCommand {
    pub fn age_ticks(&self) -> u32 {
        self.age_ticks
    }
}

/// Bookkeeping for control commands sent to the server but not yet visible in
/// a polled status. At most one record per [`CommandKind`].
#[derive(Debug)]
pub struct CommandTracker {
    pause: Option<PendingCommand>,
    skip: Option<PendingCommand>,
    next_serial: u64,
    max_age_ticks: u32,
}

impl CommandTracker {
    /// `max_age_ticks` bounds how many poll cycles a record may stay
    /// unconfirmed before it is dropped.
    pub fn new(max_age_ticks: u32) -> Self {
        Self {
            pause: None,
            skip: None,
            next_serial: 0,
            max_age_ticks: max_age_ticks.max(1),
        }
    }

    /// Record a pause toggle and return the paused flag to send.
    pub fn issue_pause_toggle(&mut self, current_paused: bool) -> (bool, CommandTicket) {
        let target = !current_paused;
        let ticket = self.record(CommandKind::PauseToggle, Expectation::Paused(target));
        (target, ticket)
    }

    /// Record a skip away from `current_entry`.
    ///
    /// A skip also drops any pause expectation: the next entry starts fresh and
    /// its paused flag says nothing about the earlier toggle.
    pub fn issue_skip(&mut self, current_entry: EntryId) -> CommandTicket {
        self.pause = None;
        self.record(CommandKind::Skip, Expectation::LeftEntry(current_entry))
    }

    fn record(&mut self, kind: CommandKind, expected: Expectation) -> CommandTicket {
        self.next_serial += 1;
        let serial = self.next_serial;
        let replaced = self.slot_mut(kind).replace(PendingCommand {
            kind,
            expected,
            serial,
            age_ticks: 0,
        });
        if let Some(previous) = replaced {
            tracing::debug!(?kind, previous = ?previous.expected, "replacing pending command");
        }
        CommandTicket { kind, serial }
    }

    /// Drop the record created by `ticket`, if it is still the current one.
    /// Returns whether anything was cleared.
    pub fn cancel(&mut self, ticket: CommandTicket) -> bool {
        let slot = self.slot_mut(ticket.kind);
        if slot.as_ref().map(|p| p.serial) == Some(ticket.serial) {
            *slot = None;
            return true;
        }
        false
    }

    /// Clear every record the polled `status` confirms.
    pub fn reconcile(&mut self, status: &PlayerStatus) {
        for kind in [CommandKind::PauseToggle, CommandKind::Skip] {
            let slot = self.slot_mut(kind);
            if slot.as_ref().is_some_and(|p| p.expected.is_met_by(status)) {
                tracing::debug!(?kind, "pending command confirmed by server");
                *slot = None;
            }
        }
    }

    /// Age outstanding records by one poll cycle and drop the expired ones.
    pub fn on_tick(&mut self) -> Vec<CommandKind> {
        let max_age = self.max_age_ticks;
        let mut expired = Vec::new();
        for kind in [CommandKind::PauseToggle, CommandKind::Skip] {
            let slot = self.slot_mut(kind);
            if let Some(pending) = slot.as_mut() {
                pending.age_ticks += 1;
                if pending.age_ticks >= max_age {
                    tracing::warn!(
                        ?kind,
                        ticks = pending.age_ticks,
                        "pending command never confirmed, giving up"
                    );
                    *slot = None;
                    expired.push(kind);
                }
            }
        }
        expired
    }

    pub fn is_pause_pending(&self) -> bool {
        self.pause.is_some()
    }

    pub fn is_skip_pending(&self, entry: EntryId) -> bool {
        matches!(
            self.skip,
            Some(PendingCommand { expected: Expectation::LeftEntry(target), .. }) if target == entry
        )
    }

    pub fn pending(&self, kind: CommandKind) -> Option<&PendingCommand> {
        match kind {
            CommandKind::PauseToggle => self.pause.as_ref(),
            CommandKind::Skip => self.skip.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: CommandKind) -> &mut Option<PendingCommand> {
        match kind {
            CommandKind::PauseToggle => &mut self.pause,
            CommandKind::Skip => &mut self.skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kara_core::{PlaylistEntry, Song, SongId};

    fn playing(entry: u64, paused: bool) -> PlayerStatus {
        PlayerStatus {
            playlist_entry: Some(PlaylistEntry {
                id: EntryId(entry),
                song: Song {
                    id: SongId(100 + entry),
                    title: format!("song {entry}"),
                },
            }),
            paused,
            timing: Some("00:00:10.000".into()),
        }
    }

    #[test]
    fn pause_toggle_targets_opposite_state() {
        let mut tracker = CommandTracker::new(10);
        let (target, ticket) = tracker.issue_pause_toggle(false);
        assert!(target);
        assert_eq!(ticket.kind(), CommandKind::PauseToggle);
        assert_eq!(
            tracker.pending(CommandKind::PauseToggle).map(|p| p.expected),
            Some(Expectation::Paused(true))
        );
    }

    #[test]
    fn pause_clears_only_when_flag_matches() {
        let mut tracker = CommandTracker::new(10);
        tracker.issue_pause_toggle(false);

        tracker.reconcile(&playing(1, false));
        assert!(tracker.is_pause_pending());

        tracker.reconcile(&playing(1, true));
        assert!(!tracker.is_pause_pending());
    }

    #[test]
    fn skip_stays_pending_while_target_plays() {
        let mut tracker = CommandTracker::new(10);
        tracker.issue_skip(EntryId(4));

        tracker.reconcile(&playing(4, false));
        assert!(tracker.is_skip_pending(EntryId(4)));
        assert!(!tracker.is_skip_pending(EntryId(5)));

        tracker.reconcile(&playing(5, false));
        assert!(!tracker.is_skip_pending(EntryId(4)));
    }

    #[test]
    fn skip_clears_when_player_goes_idle() {
        let mut tracker = CommandTracker::new(10);
        tracker.issue_skip(EntryId(4));
        tracker.reconcile(&PlayerStatus::default());
        assert!(tracker.pending(CommandKind::Skip).is_none());
    }

    #[test]
    fn new_command_replaces_pending_one() {
        let mut tracker = CommandTracker::new(10);
        let (_, first) = tracker.issue_pause_toggle(false);
        let (target, _) = tracker.issue_pause_toggle(true);
        assert!(!target);
        assert_eq!(
            tracker.pending(CommandKind::PauseToggle).map(|p| p.expected),
            Some(Expectation::Paused(false))
        );
        // the superseded ticket no longer owns the slot
        assert!(!tracker.cancel(first));
        assert!(tracker.is_pause_pending());
    }

    #[test]
    fn cancel_clears_own_record() {
        let mut tracker = CommandTracker::new(10);
        let ticket = tracker.issue_skip(EntryId(2));
        assert!(tracker.cancel(ticket));
        assert!(!tracker.is_skip_pending(EntryId(2)));
        assert!(!tracker.cancel(ticket));
    }

    #[test]
    fn skip_drops_pause_expectation() {
        let mut tracker = CommandTracker::new(10);
        tracker.issue_pause_toggle(false);
        tracker.issue_skip(EntryId(1));
        assert!(!tracker.is_pause_pending());
        assert!(tracker.is_skip_pending(EntryId(1)));
    }

    #[test]
    fn unconfirmed_commands_expire() {
        let mut tracker = CommandTracker::new(3);
        tracker.issue_pause_toggle(false);
        tracker.issue_skip(EntryId(1));

        assert!(tracker.on_tick().is_empty());
        assert!(tracker.on_tick().is_empty());
        assert_eq!(tracker.pending(CommandKind::Skip).map(|p| p.age_ticks()), Some(2));

        let expired = tracker.on_tick();
        assert_eq!(expired, vec![CommandKind::PauseToggle, CommandKind::Skip]);
        assert!(!tracker.is_pause_pending());
        assert!(!tracker.is_skip_pending(EntryId(1)));
    }

    #[test]
    fn zero_timeout_is_clamped_to_one_tick() {
        let mut tracker = CommandTracker::new(0);
        tracker.issue_pause_toggle(true);
        assert_eq!(tracker.on_tick(), vec![CommandKind::PauseToggle]);
    }
}

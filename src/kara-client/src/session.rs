use crate::endpoints;
use crate::error::{ClientError, ClientResult, Resource};
use crate::playlist::{PlaylistStore, PlaylistView};
use crate::reconciler::{DisplayPlayerState, PlayerReconciler};
use crate::sequence::SequenceGuard;
use crate::tracker::{CommandTicket, CommandTracker};
use crate::view::{Notification, Presenter, UserAction};
use kara_core::gateway::decode;
use kara_core::{
    EnqueueRequest, EntryId, Gateway, GatewayError, PlayerCommand, PlayerStatus, PlaylistSnapshot,
    SongId,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct SessionState {
    active: bool,
    status: PlayerStatus,
    tracker: CommandTracker,
    reconciler: PlayerReconciler,
    playlist: PlaylistStore,
    status_seq: SequenceGuard,
    playlist_seq: SequenceGuard,
}

/// Player and playlist state mirrored from the server, plus the user actions
/// that change it.
///
/// All state sits behind one lock that is never held across a request. Each
/// resource is sequence-guarded, so overlapping refreshes resolve last-write-
/// wins, and nothing is applied after [`PlayerSession::shutdown`].
pub struct PlayerSession<G> {
    gateway: Arc<G>,
    presenter: Arc<dyn Presenter>,
    state: Mutex<SessionState>,
}

impl<G: Gateway> PlayerSession<G> {
    pub fn new(gateway: Arc<G>, presenter: Arc<dyn Presenter>, pending_timeout_ticks: u32) -> Self {
        Self {
            gateway,
            presenter,
            state: Mutex::new(SessionState {
                active: true,
                status: PlayerStatus::default(),
                tracker: CommandTracker::new(pending_timeout_ticks),
                reconciler: PlayerReconciler::new(),
                playlist: PlaylistStore::new(),
                status_seq: SequenceGuard::new(),
                playlist_seq: SequenceGuard::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    /// Stop applying responses. Requests already in flight still resolve but
    /// their results are dropped.
    pub fn shutdown(&self) {
        let mut state = self.state();
        if state.active {
            tracing::debug!("player session shut down");
        }
        state.active = false;
    }

    pub fn status(&self) -> PlayerStatus {
        self.state().status.clone()
    }

    pub fn snapshot(&self) -> PlaylistSnapshot {
        self.state().playlist.snapshot().clone()
    }

    pub fn display(&self) -> DisplayPlayerState {
        let mut guard = self.state();
        let state = &mut *guard;
        state.reconciler.project(&state.status, &state.tracker)
    }

    pub fn playlist_view(&self) -> PlaylistView {
        let state = self.state();
        state.playlist.view(state.status.playing_id())
    }

    fn render_player(&self) {
        if !self.is_active() {
            return;
        }
        let frame = self.display();
        self.presenter.player_changed(&frame);
    }

    /// Fetch player status and playlist concurrently. Failures are logged and
    /// leave the affected slice untouched.
    pub async fn refresh(&self) {
        let (status, playlist) = futures::join!(self.refresh_status(), self.refresh_playlist());
        log_refresh(Resource::PlayerStatus, status);
        log_refresh(Resource::Playlist, playlist);
    }

    /// One poll cycle: age pending commands, then refresh.
    pub async fn poll_tick(&self) {
        let expired = self.state().tracker.on_tick();
        if !expired.is_empty() {
            self.render_player();
        }
        self.refresh().await;
    }

    pub async fn refresh_status(&self) -> ClientResult<()> {
        let ticket = {
            let mut state = self.state();
            if !state.active {
                return Err(ClientError::TornDown);
            }
            state.status_seq.issue()
        };

        let status: PlayerStatus = self
            .gateway
            .get(endpoints::PLAYER_STATUS)
            .await
            .and_then(decode)?;

        let (frame, view) = {
            let mut guard = self.state();
            let state = &mut *guard;
            if !state.active {
                return Err(ClientError::TornDown);
            }
            if !state.status_seq.accept(ticket) {
                return Err(ClientError::StaleResponse {
                    resource: Resource::PlayerStatus,
                });
            }
            state.tracker.reconcile(&status);
            state.status = status;
            let frame = state.reconciler.project(&state.status, &state.tracker);
            let view = state.playlist.view(state.status.playing_id());
            (frame, view)
        };
        // the upcoming list depends on which entry is playing
        self.presenter.player_changed(&frame);
        self.presenter.playlist_changed(&view);
        Ok(())
    }

    pub async fn refresh_playlist(&self) -> ClientResult<()> {
        let ticket = {
            let mut state = self.state();
            if !state.active {
                return Err(ClientError::TornDown);
            }
            state.playlist_seq.issue()
        };

        let snapshot: PlaylistSnapshot = self
            .gateway
            .get(endpoints::PLAYLIST)
            .await
            .and_then(decode)?;

        let view = {
            let mut state = self.state();
            if !state.active {
                return Err(ClientError::TornDown);
            }
            if !state.playlist_seq.accept(ticket) {
                return Err(ClientError::StaleResponse {
                    resource: Resource::Playlist,
                });
            }
            state.playlist.set_snapshot(snapshot);
            state.playlist.view(state.status.playing_id())
        };
        self.presenter.playlist_changed(&view);
        Ok(())
    }

    /// Ask the server to flip the paused flag of the playing entry.
    ///
    /// Returns the paused value sent, or `None` when nothing is playing.
    pub async fn toggle_pause(&self) -> ClientResult<Option<bool>> {
        let issued = {
            let mut state = self.state();
            let paused = state.status.paused;
            match state.status.playing_id() {
                Some(_) if state.active => Some(state.tracker.issue_pause_toggle(paused)),
                _ => None,
            }
        };
        let Some((target, ticket)) = issued else {
            tracing::debug!("pause requested with nothing playing");
            return Ok(None);
        };

        self.render_player();
        self.send_command(ticket, UserAction::TogglePause, PlayerCommand::pause(target))
            .await?;
        Ok(Some(target))
    }

    /// Ask the server to skip the playing entry. Returns `false` when nothing
    /// is playing.
    pub async fn skip(&self) -> ClientResult<bool> {
        let ticket = {
            let mut state = self.state();
            match state.status.playing_id() {
                Some(entry) if state.active => Some(state.tracker.issue_skip(entry)),
                _ => None,
            }
        };
        let Some(ticket) = ticket else {
            tracing::debug!("skip requested with nothing playing");
            return Ok(false);
        };

        self.render_player();
        self.send_command(ticket, UserAction::Skip, PlayerCommand::skip())
            .await?;
        Ok(true)
    }

    async fn send_command(
        &self,
        ticket: CommandTicket,
        action: UserAction,
        command: PlayerCommand,
    ) -> ClientResult<()> {
        tracing::info!(?command, "sending player command");
        if let Err(err) = self.gateway.put(endpoints::PLAYER_MANAGE, command.body()).await {
            if self.state().tracker.cancel(ticket) {
                self.render_player();
            }
            return Err(self.report_failure(action, err));
        }
        Ok(())
    }

    /// Enqueue `song`, then pull fresh state from the server.
    pub async fn add_to_playlist(&self, song: SongId) -> ClientResult<()> {
        let request = EnqueueRequest { song };
        if let Err(err) = self.gateway.post(endpoints::PLAYLIST, request.body()).await {
            return Err(self.report_failure(UserAction::Enqueue, err));
        }
        tracing::info!(%song, "song added to playlist");
        self.presenter.notify(&Notification::AddedToPlaylist { song });
        self.refresh().await;
        Ok(())
    }

    /// Remove a queued entry. The local snapshot is never spliced; a
    /// successful delete is followed by a refresh instead.
    pub async fn remove_entry(&self, entry: EntryId) -> ClientResult<()> {
        if let Err(err) = self
            .gateway
            .delete(&endpoints::playlist_entry(entry))
            .await
        {
            return Err(self.report_failure(UserAction::Remove, err));
        }
        tracing::info!(%entry, "playlist entry removed");
        self.refresh().await;
        Ok(())
    }

    fn report_failure(&self, action: UserAction, err: GatewayError) -> ClientError {
        tracing::warn!(%action, error = %err, "user action failed");
        self.presenter.notify(&Notification::ActionFailed {
            action,
            message: err.to_string(),
        });
        err.into()
    }
}

fn log_refresh(resource: Resource, result: ClientResult<()>) {
    match result {
        Ok(()) => {}
        Err(err @ (ClientError::StaleResponse { .. } | ClientError::TornDown)) => {
            tracing::debug!(%resource, reason = %err, "refresh result dropped");
        }
        Err(err) => tracing::warn!(%resource, error = %err, "refresh failed"),
    }
}

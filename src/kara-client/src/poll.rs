use crate::session::PlayerSession;
use kara_core::Gateway;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Cancellable repeating refresh of a [`PlayerSession`].
///
/// The first tick fires immediately. Each tick runs as its own task, so a slow
/// round trip never delays the next tick; overlapping responses are sorted out
/// by the session's sequence guards. Dropping the loop stops it.
pub struct PollLoop<G: Gateway + 'static> {
    session: Arc<PlayerSession<G>>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl<G: Gateway + 'static> PollLoop<G> {
    pub fn start(session: Arc<PlayerSession<G>>, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let worker = session.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(period_ms = period.as_millis() as u64, "poll loop started");
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let session = worker.clone();
                        tokio::spawn(async move { session.poll_tick().await });
                    }
                }
            }
            tracing::debug!("poll loop stopped");
        });

        Self {
            session,
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    /// Stop ticking and wait for the timer task to finish. Ticks still in
    /// flight resolve on their own and are discarded by the session.
    pub async fn stop(mut self) {
        self.halt();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "poll loop task failed");
            }
        }
    }

    fn halt(&mut self) {
        self.session.shutdown();
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

impl<G: Gateway + 'static> Drop for PollLoop<G> {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints;
    use crate::testing::{playlist_json, status_json, FakeGateway, Method, RecordingPresenter};

    fn session() -> (Arc<FakeGateway>, Arc<PlayerSession<FakeGateway>>) {
        let gateway = Arc::new(FakeGateway::new());
        gateway.respond(
            Method::Get,
            endpoints::PLAYER_STATUS,
            Ok(status_json(Some(1), false, Some("00:00:01.000"))),
        );
        gateway.respond(Method::Get, endpoints::PLAYLIST, Ok(playlist_json(&[1, 2])));
        let session = Arc::new(PlayerSession::new(
            gateway.clone(),
            Arc::new(RecordingPresenter::default()),
            10,
        ));
        (gateway, session)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_until_stopped() {
        let (gateway, session) = session();
        let poll = PollLoop::start(session.clone(), Duration::from_millis(1000));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(gateway.count(Method::Get, endpoints::PLAYER_STATUS), 3);
        assert_eq!(gateway.count(Method::Get, endpoints::PLAYLIST), 3);
        assert_eq!(session.status().playing_id().map(|id| id.0), Some(1));

        poll.stop().await;
        assert!(!session.is_active());
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(gateway.count(Method::Get, endpoints::PLAYER_STATUS), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_loop_stops_it() {
        let (gateway, session) = session();
        let poll = PollLoop::start(session.clone(), Duration::from_millis(1000));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(gateway.count(Method::Get, endpoints::PLAYER_STATUS), 2);

        drop(poll);
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(gateway.count(Method::Get, endpoints::PLAYER_STATUS), 2);
        assert!(!session.is_active());
    }
}

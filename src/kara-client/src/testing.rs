//! Scripted gateway and recording presenter for unit tests.

use crate::playlist::PlaylistView;
use crate::reconciler::DisplayPlayerState;
use crate::view::{LibraryView, Notification, Presenter};
use kara_core::{Gateway, GatewayError, GatewayResult};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

type Route = (Method, String);

/// Gateway answering from per-route scripts.
///
/// Deferred replies are consumed first, in order, and let a test decide when
/// (and in which order) in-flight requests resolve. Otherwise the sticky reply
/// for the route is returned; unknown routes answer 404.
#[derive(Default)]
pub struct FakeGateway {
    sticky: Mutex<HashMap<Route, GatewayResult<Value>>>,
    deferred: Mutex<HashMap<Route, VecDeque<oneshot::Receiver<GatewayResult<Value>>>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, url: &str, reply: GatewayResult<Value>) {
        self.sticky
            .lock()
            .unwrap()
            .insert((method, url.to_string()), reply);
    }

    pub fn defer(&self, method: Method, url: &str) -> oneshot::Sender<GatewayResult<Value>> {
        let (tx, rx) = oneshot::channel();
        self.deferred
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method && call.url == url)
            .count()
    }

    async fn handle(&self, method: Method, url: &str, body: Option<Value>) -> GatewayResult<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            body,
        });
        let route = (method, url.to_string());
        let deferred = self
            .deferred
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front);
        if let Some(rx) = deferred {
            return rx.await.unwrap_or_else(|_| {
                Err(GatewayError::Network {
                    message: "deferred reply dropped".into(),
                })
            });
        }
        self.sticky
            .lock()
            .unwrap()
            .get(&route)
            .cloned()
            .unwrap_or_else(|| {
                Err(GatewayError::Server {
                    status: 404,
                    message: format!("no route for {url}"),
                })
            })
    }
}

#[async_trait::async_trait]
impl Gateway for FakeGateway {
    async fn get(&self, url: &str) -> GatewayResult<Value> {
        self.handle(Method::Get, url, None).await
    }

    async fn post(&self, url: &str, body: Value) -> GatewayResult<Value> {
        self.handle(Method::Post, url, Some(body)).await
    }

    async fn put(&self, url: &str, body: Value) -> GatewayResult<Value> {
        self.handle(Method::Put, url, Some(body)).await
    }

    async fn delete(&self, url: &str) -> GatewayResult<()> {
        self.handle(Method::Delete, url, None).await.map(|_| ())
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub players: Mutex<Vec<DisplayPlayerState>>,
    pub playlists: Mutex<Vec<PlaylistView>>,
    pub libraries: Mutex<Vec<LibraryView>>,
    pub notifications: Mutex<Vec<Notification>>,
}

impl RecordingPresenter {
    pub fn last_player(&self) -> Option<DisplayPlayerState> {
        self.players.lock().unwrap().last().cloned()
    }

    pub fn last_playlist(&self) -> Option<PlaylistView> {
        self.playlists.lock().unwrap().last().cloned()
    }

    pub fn last_library(&self) -> Option<LibraryView> {
        self.libraries.lock().unwrap().last().cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn player_changed(&self, state: &DisplayPlayerState) {
        self.players.lock().unwrap().push(state.clone());
    }

    fn playlist_changed(&self, view: &PlaylistView) {
        self.playlists.lock().unwrap().push(view.clone());
    }

    fn library_changed(&self, view: &LibraryView) {
        self.libraries.lock().unwrap().push(view.clone());
    }

    fn notify(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }
}

pub fn status_json(entry: Option<u64>, paused: bool, timing: Option<&str>) -> Value {
    json!({
        "playlist_entry": entry.map(|id| json!({
            "id": id,
            "song": {"id": id * 10, "title": format!("Song {id}")}
        })),
        "paused": paused,
        "timing": timing,
        "in_transition": false
    })
}

pub fn playlist_json(entries: &[u64]) -> Value {
    let results: Vec<Value> = entries
        .iter()
        .map(|id| json!({"id": id, "song": {"id": id * 10, "title": format!("Song {id}")}}))
        .collect();
    json!({
        "count": entries.len(),
        "next": null,
        "previous": null,
        "results": results
    })
}

pub fn library_json(songs: &[u64], next: Option<&str>, previous: Option<&str>) -> Value {
    let results: Vec<Value> = songs
        .iter()
        .map(|id| json!({"id": id, "title": format!("Title {id}")}))
        .collect();
    json!({
        "count": 25,
        "next": next,
        "previous": previous,
        "results": results
    })
}

use kara_core::GatewayError;
use std::fmt;
use thiserror::Error;

/// Independently refreshed slices of server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    PlayerStatus,
    Playlist,
    Library,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::PlayerStatus => "player status",
            Resource::Playlist => "playlist",
            Resource::Library => "library",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// A newer request for the same resource already landed.
    #[error("stale {resource} response discarded")]
    StaleResponse { resource: Resource },
    /// The session was stopped while the request was in flight.
    #[error("session has been torn down")]
    TornDown,
}

pub type ClientResult<T> = Result<T, ClientError>;

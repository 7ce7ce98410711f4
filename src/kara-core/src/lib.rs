pub mod config;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod paths;
pub mod redact;

pub use config::{
    Config, ConfigError, LogLevel, LoggingConfig, PollingConfig, ServerConfig, ValidationError,
};
pub use gateway::{Gateway, GatewayError, GatewayResult};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{
    EnqueueRequest, EntryId, LibraryPage, PlayerCommand, PlayerStatus, PlaylistEntry,
    PlaylistSnapshot, Song, SongId,
};
pub use paths::{AppDirs, DirsError};

pub const APP_NAME: &str = "kara";
pub const APP_AUTHOR: &str = "Kara";
pub const APP_QUALIFIER: &str = "io";

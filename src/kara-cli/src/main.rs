use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use http_gateway::HttpGateway;
use kara_client::{
    DisplayPlayerState, LibraryPaginator, LibraryView, Notification, PlaybackIcon, PlayerSession,
    PlaylistView, PollLoop, Presenter,
};
use kara_core::{init_logging, AppDirs, Config, EntryId, SongId};
use std::sync::{Arc, Mutex};

#[derive(Debug, Parser)]
#[command(name = "kara", version, about = "Karaoke queue client")]
struct Cli {
    /// Server base URL (takes precedence over config)
    #[arg(long, global = true)]
    server: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow the player and playlist until interrupted (default)
    Watch,
    /// Print the player and playlist once
    Status,
    /// Search the song library by title
    Search(SearchCommand),
    /// Add a song to the playlist
    Add {
        /// Library song id
        song_id: u64,
    },
    /// Remove an entry from the playlist
    Remove {
        /// Playlist entry id (not the song id)
        entry_id: u64,
    },
    /// Toggle pause on the playing song
    Pause,
    /// Skip the playing song
    Skip,
}

#[derive(Debug, Parser, Clone)]
struct SearchCommand {
    /// Title filter; omit to list the whole library
    query: Option<String>,
    /// Navigation steps applied after the search, in order
    #[arg(long = "page", value_enum)]
    pages: Vec<PageStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PageStep {
    First,
    Previous,
    Next,
    Last,
}

/// Prints engine output to the terminal. In live mode every changed frame is
/// printed; otherwise only notifications are.
#[derive(Default)]
struct TerminalPresenter {
    live: bool,
    last_player: Mutex<Option<DisplayPlayerState>>,
    last_playlist: Mutex<Option<PlaylistView>>,
}

impl TerminalPresenter {
    fn live() -> Self {
        Self {
            live: true,
            ..Self::default()
        }
    }
}

/// Store `value` in `slot` and report whether it differs from what was there.
fn changed<T: Clone + PartialEq>(slot: &Mutex<Option<T>>, value: &T) -> bool {
    let mut slot = slot.lock().unwrap_or_else(|e| e.into_inner());
    if slot.as_ref() == Some(value) {
        return false;
    }
    *slot = Some(value.clone());
    true
}

impl Presenter for TerminalPresenter {
    fn player_changed(&self, state: &DisplayPlayerState) {
        if self.live && changed(&self.last_player, state) {
            println!("{}", player_line(state));
        }
    }

    fn playlist_changed(&self, view: &PlaylistView) {
        if self.live && changed(&self.last_playlist, view) {
            println!("{}", playlist_summary(view));
        }
    }

    fn notify(&self, notification: &Notification) {
        eprintln!("{notification}");
    }
}

fn player_line(state: &DisplayPlayerState) -> String {
    let Some(title) = state.song_title.as_deref() else {
        return "[stopped] nothing playing".to_string();
    };
    let icon = match state.icon {
        PlaybackIcon::Play => "playing",
        PlaybackIcon::Pause => "paused",
        PlaybackIcon::Stop => "stopped",
    };
    let mut line = format!("[{icon}] {title}");
    if !state.timing.is_empty() {
        line.push_str(&format!(" {}", state.timing));
    }
    if state.show_pause_pending_spinner {
        line.push_str(" (pause pending)");
    }
    if state.show_skip_pending_spinner {
        line.push_str(" (skip pending)");
    }
    line
}

fn playlist_summary(view: &PlaylistView) -> String {
    match view.next() {
        Some(next) => format!("{} | Next: {}", view.count_label(), next.song.title),
        None => view.count_label(),
    }
}

fn library_lines(view: &LibraryView) -> Vec<String> {
    let mut lines = vec![view.count_label()];
    lines.extend(
        view.songs
            .iter()
            .map(|song| format!("{:>8}  {}", song.id, song.title)),
    );
    let mut nav = Vec::new();
    if view.first_enabled() {
        nav.push("first");
        nav.push("previous");
    }
    if view.last_enabled() {
        nav.push("next");
        nav.push("last");
    }
    if !nav.is_empty() {
        lines.push(format!("more pages: --page {}", nav.join("|")));
    }
    lines
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let config = Config::load_or_default(&dirs)?.with_base_url(cli.server.as_deref())?;
    let _logging = init_logging(&config.logging, &dirs)?;

    let gateway = Arc::new(HttpGateway::new(&config.server)?);
    tracing::info!(
        "Starting kara against {} (config dir: {})",
        gateway.base_url(),
        dirs.config_dir().display()
    );

    let command = cli.command.unwrap_or(Command::Watch);
    let presenter: Arc<dyn Presenter> = match command {
        Command::Watch => Arc::new(TerminalPresenter::live()),
        _ => Arc::new(TerminalPresenter::default()),
    };
    let session = Arc::new(PlayerSession::new(
        gateway.clone(),
        presenter.clone(),
        config.polling.pending_timeout_ticks,
    ));

    match command {
        Command::Watch => {
            let poll = PollLoop::start(session, config.polling.interval());
            tokio::signal::ctrl_c().await?;
            poll.stop().await;
            tracing::info!("Stopped watching");
        }
        Command::Status => {
            session.refresh_status().await?;
            session.refresh_playlist().await?;
            println!("{}", player_line(&session.display()));
            let view = session.playlist_view();
            println!("{}", playlist_summary(&view));
            for entry in &view.upcoming {
                println!("{:>8}  {}", entry.id, entry.song.title);
            }
        }
        Command::Search(search) => {
            let library = LibraryPaginator::new(gateway, presenter);
            library.search(search.query.as_deref().unwrap_or("")).await?;
            for step in &search.pages {
                let moved = match step {
                    PageStep::First => library.first().await?,
                    PageStep::Previous => library.previous().await?,
                    PageStep::Next => library.next().await?,
                    PageStep::Last => library.last().await?,
                };
                if !moved {
                    tracing::debug!(?step, "page step had nothing to do");
                }
            }
            for line in library_lines(&library.view()) {
                println!("{line}");
            }
        }
        Command::Add { song_id } => {
            session.add_to_playlist(SongId(song_id)).await?;
        }
        Command::Remove { entry_id } => {
            session.remove_entry(EntryId(entry_id)).await?;
            println!("Removed entry {entry_id}");
        }
        Command::Pause => {
            session.refresh_status().await?;
            match session.toggle_pause().await? {
                Some(true) => println!("Pause requested"),
                Some(false) => println!("Resume requested"),
                None => println!("Nothing is playing"),
            }
        }
        Command::Skip => {
            session.refresh_status().await?;
            if session.skip().await? {
                println!("Skip requested");
            } else {
                println!("Nothing is playing");
            }
        }
    }

    Ok(())
}

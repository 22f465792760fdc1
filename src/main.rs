use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotlite::{cli, config, error, management::Session};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with Spotify
    Auth,

    /// Forget the stored credential
    Logout,

    /// Show who is signed in
    Status,

    /// New releases, featured playlists and recommendations
    Home,

    /// Browse the catalog
    #[command(subcommand)]
    Browse(BrowseCommand),

    /// Search albums, artists, playlists and tracks
    Search(SearchOptions),

    /// Show an album
    Album(AlbumOptions),

    /// Show a playlist
    Playlist(PlaylistOptions),

    /// Your saved albums and playlists
    #[command(subcommand)]
    Library(LibraryCommand),

    /// Create and edit playlists
    #[command(subcommand)]
    Playlists(PlaylistsCommand),

    /// Play previews
    Play(PlayOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Subcommand, Debug, Clone)]
pub enum BrowseCommand {
    /// Newly released albums
    NewReleases(LimitOption),
    /// Featured playlists
    Featured(LimitOption),
    /// Browse categories
    Categories(LimitOption),
    /// Playlists of one category
    Category {
        id: String,
        #[clap(flatten)]
        limit: LimitOption,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct LimitOption {
    /// Maximum number of items
    #[clap(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    query: String,
    /// Maximum number of items per kind
    #[clap(long, default_value_t = 10)]
    limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct AlbumOptions {
    id: String,
    /// Save the album to your library
    #[clap(long)]
    save: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistOptions {
    id: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum LibraryCommand {
    /// Saved albums
    Albums,
    /// Your playlists
    Playlists(LimitOption),
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlaylistsCommand {
    /// Create a playlist
    Create { name: String },
    /// Add a track to a playlist
    Add { playlist: String, track: String },
    /// Remove a track from a playlist
    Remove { playlist: String, track: String },
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    #[command(subcommand)]
    source: PlaySourceCommand,
    /// Position to start at (1-based) when playing an album or playlist
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    start: u32,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlaySourceCommand {
    Album { id: String },
    Playlist { id: String },
    Track { id: String },
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let session = match Session::open().await {
        Ok(session) => session,
        Err(e) => error!("Cannot start session. Err: {}", e),
    };

    match cli.command {
        Command::Auth => cli::auth(&session).await,
        Command::Logout => cli::logout(&session).await,
        Command::Status => cli::status(&session).await,
        Command::Home => cli::home(&session).await,
        Command::Browse(browse) => match browse {
            BrowseCommand::NewReleases(opt) => cli::new_releases(&session, opt.limit).await,
            BrowseCommand::Featured(opt) => cli::featured_playlists(&session, opt.limit).await,
            BrowseCommand::Categories(opt) => cli::categories(&session, opt.limit).await,
            BrowseCommand::Category { id, limit } => {
                cli::category_playlists(&session, &id, limit.limit).await
            }
        },
        Command::Search(opt) => cli::search(&session, &opt.query, opt.limit).await,
        Command::Album(opt) => cli::album(&session, &opt.id, opt.save).await,
        Command::Playlist(opt) => cli::playlist(&session, &opt.id).await,
        Command::Library(library) => match library {
            LibraryCommand::Albums => cli::saved_albums(&session).await,
            LibraryCommand::Playlists(opt) => cli::user_playlists(&session, opt.limit).await,
        },
        Command::Playlists(playlists) => match playlists {
            PlaylistsCommand::Create { name } => cli::create_playlist(&session, &name).await,
            PlaylistsCommand::Add { playlist, track } => {
                cli::add_track(&session, &playlist, &track).await
            }
            PlaylistsCommand::Remove { playlist, track } => {
                cli::remove_track(&session, &playlist, &track).await
            }
        },
        Command::Play(opt) => {
            let source = match opt.source {
                PlaySourceCommand::Album { id } => cli::PlaySource::Album(id),
                PlaySourceCommand::Playlist { id } => cli::PlaySource::Playlist(id),
                PlaySourceCommand::Track { id } => cli::PlaySource::Track(id),
            };
            cli::play(&session, source, (opt.start - 1) as usize).await
        }
        Command::Completions(_) => {}
    }
}

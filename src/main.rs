use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cinedex::catalog::CatalogRepository;
use cinedex::config::Config;
use cinedex::model::Genre;
use cinedex::remote::HttpRemote;
use cinedex::storage::{Database, DatabaseError};
use cinedex::util::{fit_to_width, sanitize_line, truncate_to_width};
use cinedex::viewstate::{CatalogViewState, ViewState};

/// Width of the printed listing, in terminal columns.
const LISTING_WIDTH: usize = 80;

/// Get the config directory path (~/.config/cinedex/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("cinedex"))
}

#[derive(Parser, Debug)]
#[command(name = "cinedex", about = "Browse a movie catalog through a local cache")]
struct Args {
    /// Only list movies whose genres contain this text (case-sensitive)
    #[arg(long, value_name = "GENRE")]
    genre: Option<String>,

    /// Number of pages to load
    #[arg(long, value_name = "N", default_value_t = 1)]
    pages: u32,

    /// Print the genre list only
    #[arg(long)]
    genres: bool,

    /// Print cached row counts after loading
    #[arg(long)]
    stats: bool,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Config file (default: ~/.config/cinedex/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the listing on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;

    let db_path = config
        .database_path
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir.join("catalog.db"));

    if args.reset_db {
        reset_database(&db_path)?;
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: The catalog database is locked by another process. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let remote = HttpRemote::from_config(&config).context("Failed to create HTTP client")?;
    tracing::debug!(base_url = %remote.base_url(), "Catalog backend");
    let repository = CatalogRepository::new(remote, db.clone());
    let view = CatalogViewState::spawn(Arc::new(repository));

    let state = load(&view, &args).await?;
    view.shutdown().await;

    print_genres(&state.genres);
    if !args.genres {
        println!();
        print_movies(&state);
    }

    if args.stats {
        let counts = db.counts().await.context("Failed to count cached rows")?;
        println!();
        println!("Cached genres: {}", counts.genres);
        println!("Cached movies: {}", counts.movies);
    }
    db.close().await;

    if let Some(error) = &state.error {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }

    Ok(())
}

/// Drive the view state through the initial session, the genre switch and
/// the requested number of pages, returning the final snapshot.
async fn load(view: &CatalogViewState, args: &Args) -> Result<ViewState> {
    let mut state = view.wait_until(ViewState::is_idle).await?;

    if args.genre.is_some() && state.error.is_none() {
        view.select_genre(args.genre.clone()).await?;
        state = view.wait_until(ViewState::is_idle).await?;
    }

    let mut pages = 1;
    while pages < args.pages && state.error.is_none() && state.can_load_more() {
        view.load_more().await?;
        state = view.wait_until(ViewState::is_idle).await?;
        pages += 1;
    }

    tracing::info!(
        pages,
        movies = state.movies.len(),
        has_more = state.has_more,
        "Catalog loaded"
    );
    Ok(state)
}

/// Delete the database file and its WAL side files, if present.
fn reset_database(db_path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let path = PathBuf::from(format!("{}{}", db_path.display(), suffix));
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "Removed database file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to remove database file '{}'", path.display())
                })
            }
        }
    }
    Ok(())
}

fn print_genres(genres: &[Genre]) {
    println!("Genres ({}):", genres.len());
    for genre in genres {
        let name = sanitize_line(&genre.name);
        println!("  {} {:>6}", fit_to_width(&name, LISTING_WIDTH - 12), genre.count);
    }
}

fn print_movies(state: &ViewState) {
    let filter = state.selected_genre.as_deref().unwrap_or("all genres");
    println!("Movies ({}, {}):", filter, state.movies.len());
    for (idx, movie) in state.movies.iter().enumerate() {
        let prefix = format!("{:>5}. ", idx + 1);
        let title = sanitize_line(&movie.title);
        let line = format!("{}{} ({})", prefix, title, movie.release_date);
        println!("{}", truncate_to_width(&line, LISTING_WIDTH));
    }
    if !state.has_more {
        println!("(end of catalog)");
    }
}

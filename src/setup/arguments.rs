use crate::app::DEFAULT_FETCH_CONCURRENCY;
use crate::backends::{FilesystemBackend, MemoryBackend, SqliteBackend};
use crate::{BackendResult, IndexStore, NoteError, NoteService, ObjectStore, Result};

use clap::{Parser, Subcommand, ValueEnum};
use log::{LevelFilter, debug};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Where notes and the index are kept
    #[arg(long, value_enum, env = "QUICKNOTEZ_BACKEND", default_value_t = Backend::Sqlite)]
    pub backend: Backend,

    /// Database file (sqlite) or root directory (filesystem). Ignored by the memory backend
    #[arg(short, long, env = "QUICKNOTEZ_PATH", default_value = "quicknotez.db")]
    pub path: PathBuf,

    /// Maximum number of note bodies fetched in parallel when listing
    #[arg(
        long,
        env = "QUICKNOTEZ_FETCH_CONCURRENCY",
        default_value_t = DEFAULT_FETCH_CONCURRENCY,
        value_parser = parse_concurrency
    )]
    pub fetch_concurrency: usize,

    #[arg(long, env = "QUICKNOTEZ_LOG_LEVEL", default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// Print responses as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Filesystem,
    Sqlite,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Create an empty note and print its ID
    Create,
    /// Replace the content of a note. Reads stdin when neither --content nor --file is given
    Save {
        id: String,
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Print every note with its content
    List,
    /// Interactive menu (default)
    Menu,
}

fn parse_concurrency(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Loads `.env` (if any) and parses command-line arguments
#[must_use]
pub fn parse_args() -> Args {
    // A missing .env file is fine
    let _ = dotenv::dotenv();
    Args::parse()
}

/// Opens the selected backend and returns it as both object and index store
///
/// # Errors
///
/// Returns the backend's error if it cannot be opened
pub fn open_backend(
    backend: Backend,
    path: &Path,
) -> BackendResult<(Box<dyn ObjectStore>, Box<dyn IndexStore>)> {
    debug!("Opening {backend:?} backend at {}", path.display());

    // Allow any struct that implements both traits, and store on heap because size is unknown at compile time
    Ok(match backend {
        Backend::Memory => split(MemoryBackend::new()),
        Backend::Filesystem => split(FilesystemBackend::new(path)?),
        Backend::Sqlite => split(SqliteBackend::new(path)?),
    })
}

// Backends are cheap handles over shared state, so one clone serves each role
fn split<S>(store: S) -> (Box<dyn ObjectStore>, Box<dyn IndexStore>)
where
    S: ObjectStore + IndexStore + Clone + 'static,
{
    (Box::new(store.clone()), Box::new(store))
}

/// Builds a `NoteService` from parsed arguments
///
/// # Errors
///
/// Returns `NoteError::Setup` if the backend cannot be opened
pub fn build_service(args: &Args) -> Result<NoteService> {
    let (objects, index) = open_backend(args.backend, &args.path).map_err(NoteError::Setup)?;
    Ok(NoteService::new(objects, index).with_fetch_concurrency(args.fetch_concurrency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_to_sqlite_and_menu() {
        let args = Args::try_parse_from(["quicknotez"]).unwrap();
        assert_eq!(args.backend, Backend::Sqlite);
        assert_eq!(args.fetch_concurrency, DEFAULT_FETCH_CONCURRENCY);
        assert!(args.command.is_none());
    }

    #[test]
    fn parses_save_with_inline_content() {
        let args = Args::try_parse_from([
            "quicknotez",
            "--backend",
            "memory",
            "save",
            "abc123",
            "--content",
            "<p>hi</p>",
            "--json",
        ])
        .unwrap();
        assert!(args.json);
        assert_eq!(
            args.command.unwrap(),
            Command::Save {
                id: "abc123".to_string(),
                content: Some("<p>hi</p>".to_string()),
                file: None,
            }
        );
    }

    #[test]
    fn rejects_zero_concurrency() {
        assert!(Args::try_parse_from(["quicknotez", "--fetch-concurrency", "0"]).is_err());
    }

    #[test]
    fn content_and_file_conflict() {
        assert!(
            Args::try_parse_from(["quicknotez", "save", "a", "-c", "x", "-f", "x.html"]).is_err()
        );
    }

    #[test]
    fn builds_a_working_memory_service() {
        let args = Args::try_parse_from(["quicknotez", "--backend", "memory", "list"]).unwrap();
        let service = build_service(&args).unwrap();
        let created = service.create().unwrap();
        assert_eq!(service.list_all().unwrap()[0].id, created.id);
    }
}

use super::{MenuError, Note, NoteError, Result};
use crate::NoteId;
use crate::app::NoteService;
use crate::contract::{ErrorResponse, SaveNoteRequest, TRY_AGAIN};
use crate::setup::arguments::{self, Command};
use crate::setup::logging;
use crate::ui::cli;

use log::{error, info, trace};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

/// Abstraction for input/output
pub trait IO {
    /// Read a trimmed line of input ending at newline
    fn get_input(&self) -> Result<String>;
    /// Read multiple lines until a trimmed line equals `stop_at`
    fn get_input_until(&self, stop_at: &str) -> Result<String>;
    /// Read everything until the input is closed
    fn get_all_input(&self) -> Result<String>;
    /// Display a list of selectable options
    fn show_menu(&self, options: &[impl fmt::Display]);
    /// Display a bolded title
    fn show_title(&self, title: &str);
    /// Render a table of notes with their content
    fn show_notes(&self, notes: Vec<Note>);
    /// Print a plain text message
    fn show_text(&self, msg: &str);
}

/// Actions available in the interactive menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    StartCreating = 1,
    EditNote = 2,
    ViewNotes = 3,
    Quit = 4,
}

/// All menu options in display order
pub const ALL_MENU_OPTIONS: [MenuOption; 4] = [
    MenuOption::StartCreating,
    MenuOption::EditNote,
    MenuOption::ViewNotes,
    MenuOption::Quit,
];

impl TryFrom<u8> for MenuOption {
    type Error = ();

    fn try_from(n: u8) -> std::result::Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::StartCreating),
            2 => Ok(Self::EditNote),
            3 => Ok(Self::ViewNotes),
            4 => Ok(Self::Quit),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MenuOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StartCreating => "Start creating",
            Self::EditNote => "Edit note",
            Self::ViewNotes => "View notes",
            Self::Quit => "Quit",
        };
        write!(f, "({}) {}", *self as u8, label)
    }
}

/// Parse arguments, initialize logging, and run the requested command
#[must_use]
pub fn run() -> ExitCode {
    let args = arguments::parse_args();
    logging::setup_log(args.log_level);
    trace!("{args:?}");

    let io = cli::Cli;
    let service = match arguments::build_service(&args) {
        Ok(service) => service,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match args.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            run_menu(&io, &service);
            ExitCode::SUCCESS
        }
        command => match run_command(&io, &service, command, args.json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{e}");
                if args.json {
                    // Nothing more to report if even this fails
                    let _ = show_json(&io, &ErrorResponse::default());
                } else {
                    io.show_text(TRY_AGAIN);
                }
                ExitCode::FAILURE
            }
        },
    }
}

/// Executes a single non-interactive command
///
/// # Errors
///
/// Returns the service error, or a `MenuError` if input or output fails
pub fn run_command(io: &impl IO, service: &NoteService, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Create => {
            let created = service.create()?;
            if json {
                show_json(io, &created)
            } else {
                io.show_text(created.id.as_str());
                Ok(())
            }
        }
        Command::Save { id, content, file } => {
            let content = match (content, file) {
                (Some(content), _) => content,
                (None, Some(path)) => read_content_file(&path)?,
                (None, None) => io.get_all_input()?,
            };
            let saved = service.save(SaveNoteRequest {
                id: NoteId::from(id),
                content,
            })?;
            if json {
                show_json(io, &saved)
            } else {
                io.show_text("Note saved");
                Ok(())
            }
        }
        Command::List => {
            let notes = service.list_all()?;
            if json {
                show_json(io, &notes)
            } else {
                io.show_notes(notes);
                Ok(())
            }
        }
        Command::Menu => {
            run_menu(io, service);
            Ok(())
        }
    }
}

fn read_content_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| {
        MenuError::ContentReadError {
            path: path.display().to_string(),
            source,
        }
        .into()
    })
}

fn show_json(io: &impl IO, value: &impl Serialize) -> Result<()> {
    let encoded = serde_json::to_string_pretty(value).map_err(MenuError::JsonEncodeError)?;
    io.show_text(&encoded);
    Ok(())
}

/// Show the menu and handle choices until the user quits or input ends
pub fn run_menu(io: &impl IO, service: &NoteService) {
    loop {
        io.show_menu(&ALL_MENU_OPTIONS);
        let option = match get_menu_input(io) {
            Ok(option) => option,
            Err(NoteError::Menu(MenuError::EndOfInput)) => break,
            Err(NoteError::Menu(e @ MenuError::StdoutWriteError(_))) => {
                error!("{e}");
                break;
            }
            Err(e) => {
                error!("{e}");
                continue;
            }
        };

        if option == MenuOption::Quit {
            break;
        }

        match handle_menu_option(io, service, option) {
            Ok(()) => {}
            Err(NoteError::Menu(MenuError::EndOfInput)) => break,
            Err(NoteError::Menu(e @ MenuError::StdoutWriteError(_))) => {
                error!("{e}");
                break;
            }
            Err(e) => {
                error!("{e}");
                io.show_text(TRY_AGAIN);
            }
        }
    }
}

/// Try parsing input as `MenuOption`
///
/// # Errors
///
/// Returns `MenuError::ParseError` if input is not an integer
/// Returns `MenuError::InvalidOption` if integer is out of range
fn get_menu_input(io: &impl IO) -> Result<MenuOption> {
    let input = io.get_input()?;

    match input.parse::<u8>() {
        Ok(n) => MenuOption::try_from(n).map_err(|()| MenuError::InvalidOption(n).into()),
        Err(_) => Err(MenuError::ParseError(input).into()),
    }
}

fn handle_menu_option(io: &impl IO, service: &NoteService, option: MenuOption) -> Result<()> {
    match option {
        MenuOption::StartCreating => handle_start_creating(io, service),
        MenuOption::EditNote => handle_edit(io, service),
        MenuOption::ViewNotes => handle_view(io, service),
        MenuOption::Quit => Ok(()),
    }
}

/// Create a note, then take its first content right away
fn handle_start_creating(io: &impl IO, service: &NoteService) -> Result<()> {
    io.show_title("Start creating");

    let id = service.create()?.id;
    info!("Note created with ID: {id}");

    write_content(io, service, id)
}

fn handle_edit(io: &impl IO, service: &NoteService) -> Result<()> {
    io.show_title("Edit note");

    let id = loop {
        io.show_text("ID:");
        let input = io.get_input()?;
        if input.is_empty() {
            error!("Note ID can't be empty");
            continue;
        }
        break NoteId::from(input);
    };

    write_content(io, service, id)
}

fn write_content(io: &impl IO, service: &NoteService, id: NoteId) -> Result<()> {
    // Stop when getting a "." alone on a line
    io.show_text("Content (end with '.' on last line):");
    let content = io.get_input_until(".")?;
    trace!("Got content: {content}");

    service.save(SaveNoteRequest {
        id: id.clone(),
        content,
    })?;
    info!("Note {id} saved");
    Ok(())
}

fn handle_view(io: &impl IO, service: &NoteService) -> Result<()> {
    io.show_title("View notes");

    let notes = service.list_all()?;
    if notes.is_empty() {
        io.show_text("No notes yet");
    } else {
        io.show_notes(notes);
    }
    Ok(())
}

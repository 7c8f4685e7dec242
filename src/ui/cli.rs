use super::{MenuError, Note, NoteError, Result};

use crate::ui::io::IO;
use colored::Colorize;
use log::trace;
use std::io::{self, Read, Write};
use tabled::{Table, settings::Style};

/// Terminal front end: stdin for input, stdout for output
pub struct Cli;

fn flush_prompt() -> Result<()> {
    print!("> ");
    io::stdout()
        .flush()
        .map_err(|e| NoteError::Menu(MenuError::StdoutWriteError(e)))?;
    trace!("Flushed stdout");
    Ok(())
}

impl IO for Cli {
    /// Reads a single line of text, trims it, and returns the resulting string.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout or reading from stdin fails, or
    /// `MenuError::EndOfInput` once stdin is closed.
    fn get_input(&self) -> Result<String> {
        flush_prompt()?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .map_err(|e| NoteError::Menu(MenuError::StdinReadError(e)))?;
        if read == 0 {
            return Err(MenuError::EndOfInput.into());
        }

        println!();

        let input = input.trim().to_string();
        trace!("Got input: {input}");
        Ok(input)
    }

    /// Reads lines from stdin until a line exactly matching `stop_at` (trimmed) is entered
    /// or stdin closes, and returns the preceding lines.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout or reading from stdin fails.
    fn get_input_until(&self, stop_at: &str) -> Result<String> {
        let mut input = String::new();
        loop {
            flush_prompt()?;

            let mut line = String::new();
            let read = io::stdin()
                .read_line(&mut line)
                .map_err(|e| NoteError::Menu(MenuError::StdinReadError(e)))?;
            trace!("Got input: {}", line.trim_end());

            if read == 0 || line.trim() == stop_at {
                break;
            }
            input += &line;
        }
        println!();
        Ok(input)
    }

    /// Reads stdin until it is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from stdin fails.
    fn get_all_input(&self) -> Result<String> {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| NoteError::Menu(MenuError::StdinReadError(e)))?;
        Ok(input)
    }

    fn show_menu(&self, options: &[impl std::fmt::Display]) {
        self.show_title("Choose an option");
        for o in options {
            println!("{o}");
        }
        println!();
    }

    /// Renders notes in `psql` style.
    fn show_notes(&self, notes: Vec<Note>) {
        let mut table = Table::new(notes);
        table.with(Style::psql());
        println!("{table}");
    }

    fn show_title(&self, title: &str) {
        println!("\n{}\n", title.to_string().bold());
    }

    fn show_text(&self, msg: &str) {
        println!("{msg}");
    }
}

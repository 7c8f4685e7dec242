pub mod cli;
pub mod io;

pub use crate::{MenuError, Note, NoteError, Result};

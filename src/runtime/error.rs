use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed record in {:?} at line {}{}", path, line, Error::format_msg_as_detail(msg))]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        msg: Option<String>,
    },

    #[error("Output file {:?} already exists prior to this run.", path)]
    ConflictingOutput { path: PathBuf },

    #[error("Output directory {:?} is not empty, please clean up or specify a different output directory.", path)]
    NonEmptyOutputDirectory { path: PathBuf },

    #[error("Table {:?} is missing required column(s): {}", path, missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error("Input {:?} contains no records.", path)]
    EmptyInput { path: PathBuf },

    #[error("File at {:?} is invalid{}.", path, Error::format_msg_as_detail(msg))]
    FileNotValid {
        path: PathBuf,
        msg: Option<String>,
    },

    #[error("Failed parsing {}{}", context, Error::format_msg_as_detail(msg))]
    ParseError {
        context: String,
        msg: Option<String>,
    },

    #[error("More than one input table is named '{}', their outputs would overwrite each other.", name)]
    DuplicateTableName { name: String },

    #[error("Tile '{}' is not present in the tile coordinate system.", tile_id)]
    UnknownTile { tile_id: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Niffler(#[from] niffler::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

impl Error {
    #[cold]
    pub fn malformed_record<P: AsRef<Path>, M: Into<String>>(
        path: P,
        line: u64,
        msg: Option<M>,
    ) -> Self {
        Error::MalformedRecord {
            path: path.as_ref().to_path_buf(),
            line,
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn conflicting_output<P: AsRef<Path>>(path: P) -> Self {
        Error::ConflictingOutput {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn non_empty_output_directory<P: AsRef<Path>>(path: P) -> Self {
        Error::NonEmptyOutputDirectory {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn schema<P: AsRef<Path>>(path: P, missing: Vec<String>) -> Self {
        Error::Schema {
            path: path.as_ref().to_path_buf(),
            missing,
        }
    }

    #[cold]
    pub fn empty_input<P: AsRef<Path>>(path: P) -> Self {
        Error::EmptyInput {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn file_not_valid<P: AsRef<Path>, M: Into<String>>(path: P, msg: Option<M>) -> Self {
        Error::FileNotValid {
            path: path.as_ref().to_path_buf(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn parse_error<C: Into<String>, M: Into<String>>(context: C, msg: Option<M>) -> Self {
        Error::ParseError {
            context: context.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    pub fn format_msg_as_detail(msg: &Option<String>) -> String {
        match msg {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        }
    }
}

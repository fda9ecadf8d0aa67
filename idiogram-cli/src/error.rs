//! Error handling for the idiogram CLI

use idiogram_core::IdiogramError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Parsing error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Invalid argument: {message}")]
    Argument { message: String },

    #[error(transparent)]
    Idiogram(IdiogramError),
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn parse<S: Into<String>>(file: S, message: S) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn argument<S: Into<String>>(message: S) -> Self {
        Self::Argument { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<IdiogramError> for CliError {
    fn from(err: IdiogramError) -> Self {
        match err {
            IdiogramError::Config { message } => Self::config(message),
            other => Self::Idiogram(other),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Ensure you have read permissions for the file",
                path.display()
            ));
        }

        CliError::Parse { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Band files are either a JSON array of rows or UCSC cytoBand text\n\
                 • cytoBand lines need five tab-separated columns: chrom, start, end, name, stain\n\
                 • JSON rows need the fields chromosome, start, end, name, stain"
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your idiogram.toml configuration file\n\
                 • Use 'idiogram config --example' to generate a sample configuration\n\
                 • Make sure width leaves room for the left and right margins"
            );
        }

        CliError::Idiogram(IdiogramError::MalformedInput { .. }) => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Only chr1-chr22, chrX and chrY are drawn; other contigs are skipped\n\
                 • Bands within a chromosome must not overlap and need start <= end"
            );
        }

        CliError::Idiogram(IdiogramError::UnknownChromosome { .. } | IdiogramError::UnknownBand { .. }) => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Use 'idiogram genome --bands <FILE>' to list chromosomes and bands\n\
                 • Chromosome names keep their prefix, e.g. chr7 rather than 7"
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

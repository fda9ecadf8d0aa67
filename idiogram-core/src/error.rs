//! Error handling for the idiogram engine

use thiserror::Error;

/// Main error type for idiogram operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdiogramError {
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    #[error("Unknown chromosome: {name}")]
    UnknownChromosome { name: String },

    #[error("Band {band} does not exist in chromosome {chromosome}")]
    UnknownBand { chromosome: String, band: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },
}

impl IdiogramError {
    pub fn malformed_input<S: Into<String>>(message: S) -> Self {
        Self::MalformedInput { message: message.into() }
    }

    pub fn unknown_chromosome<S: Into<String>>(name: S) -> Self {
        Self::UnknownChromosome { name: name.into() }
    }

    pub fn unknown_band<S: Into<String>>(chromosome: S, band: S) -> Self {
        Self::UnknownBand {
            chromosome: chromosome.into(),
            band: band.into(),
        }
    }

    pub fn invalid_arguments<S: Into<String>>(message: S) -> Self {
        Self::InvalidArguments { message: message.into() }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    /// Lookup failures are reported to the caller without touching engine state.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::UnknownChromosome { .. } | Self::UnknownBand { .. })
    }
}

impl From<std::io::Error> for IdiogramError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<toml::de::Error> for IdiogramError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for IdiogramError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(format!("TOML serialization error: {}", err))
    }
}

/// Result type for idiogram operations
pub type Result<T> = std::result::Result<T, IdiogramError>;

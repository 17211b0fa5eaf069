//! Error types that can be emitted from this library

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::container::Storage;
use crate::script::PatchStage;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`vpt_biff::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Biff(#[from] vpt_biff::error::Error),

    /// unable to find table file {0}
    #[error("unable to find table file {0}")]
    FileNotFound(PathBuf),

    /// {path} is not a compound document
    #[error("{path} is not a compound document")]
    InvalidContainer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// table file has no {0} storage
    #[error("table file has no {0} storage")]
    MissingStorage(Storage),

    /// unable to find requested stream
    #[error(transparent)]
    StreamMissing(#[from] StreamMissingError),

    /// version stream holds {0} bytes, expected at least 4
    #[error("version stream holds {0} bytes, expected at least 4")]
    InvalidVersion(usize),

    /// stored checksum {stored} does not match computed checksum {computed}
    #[error("stored checksum {stored} does not match computed checksum {computed}")]
    #[diagnostic(
        code(vpt::checksum_mismatch),
        help("the table was saved by a version of Visual Pinball hashing data this library does not know about, or it is corrupt")
    )]
    ChecksumMismatch { stored: String, computed: String },

    /// game data does not survive a decode and re-encode unchanged
    #[error("game data does not survive a decode and re-encode unchanged")]
    #[diagnostic(code(vpt::consistency))]
    ConsistencyError,

    /// script contains characters that cannot be stored as Windows-1252
    #[error("script contains characters that cannot be stored as Windows-1252")]
    UnencodableScript,

    /// table was modified but patching stopped while {stage}
    #[error("table was modified but patching stopped while {stage}")]
    #[diagnostic(
        code(vpt::unfinished),
        severity(Error),
        help("the script has been written but the checksum may be stale, Visual Pinball can refuse to open the table")
    )]
    Unfinished {
        stage: PatchStage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether the table on disk may have changed before this error happened.
    pub fn is_file_modified(&self) -> bool {
        matches!(self, Error::Unfinished { .. })
    }
}

/// Error type to provide further information when a stream has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("stream {storage}/{name} is missing")]
pub struct StreamMissingError {
    pub storage: Storage,
    pub name: String,
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

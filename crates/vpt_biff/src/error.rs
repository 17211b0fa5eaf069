//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::types::Tag;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// start offset {offset} is past the end of a {len} byte stream
    #[error("start offset {offset} is past the end of a {len} byte stream")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// malformed record at offset {offset:#x}: {context}
    #[error("malformed record at offset {offset:#x}: {context}")]
    MalformedRecord { offset: usize, context: String },

    /// no record tagged {0}
    #[error("no record tagged {0}")]
    RecordNotFound(Tag),

    /// the payload of {0} records cannot be replaced
    #[error("the payload of {0} records cannot be replaced")]
    UnsupportedRecord(Tag),

    /// {0} bytes do not fit a record length
    #[error("{0} bytes do not fit a record length")]
    PayloadTooLarge(usize),

    /// re-encoded records do not decode to the same records
    #[error("re-encoded records do not decode to the same records")]
    RoundTripMismatch,
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

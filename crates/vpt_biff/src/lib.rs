//! This library handles reading and re-writing the **BIFF** record streams found in *Visual Pinball* tables.
//!
//! # BIFF Record Format Documentation
//!
//! Every stream of the `GameStg` storage of a table (`GameData`, `GameItem{N}`, `Collection{N}`,
//! `CustomInfoTags`, ...) is a flat sequence of tagged records. The name has nothing to do with
//! the Excel format of the same name.
//!
//! ## Record Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Size                   | 4 bytes: Size of the tag and the data that follows it      |
//! | 0x0004         | Tag                    | 4 bytes: ASCII record identifier, e.g. "NAME"              |
//! | 0x0008         | Data                   | (Size - 4) bytes: Record payload                           |
//!
//! The next record starts right after the data. A stream usually ends with an `ENDB` record
//! carrying no data. Some streams start with a fixed header which is not part of any record
//! (`GameItem{N}` streams start with a 4 byte item type), so decoding takes a start offset.
//!
//! ### Font Records
//!
//! The `FONT` record only declares the size of its tag. The font itself is a persisted OLE font
//! appended right after it, whose face name length is stored big-endian 17 bytes after the start
//! of the record. The full record therefore spans `19 + name length` bytes:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Size                   | 4 bytes: Usually 4                                         |
//! | 0x0004         | Tag                    | 4 bytes: "FONT"                                            |
//! | 0x0008         | Font header            | 9 bytes: Version, charset, style, weight, size             |
//! | 0x0011         | Name length            | 2 bytes (big-endian): Length of the face name              |
//! | 0x0013         | Face name              | (Name length) bytes                                        |
//!
//! The font body is opaque to this library and is never part of the table checksum.
//!
//! ### Script Records
//!
//! The `CODE` record holding the table script is length-prefixed a second time:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Size                   | 4 bytes: Usually 4, only covering the tag                  |
//! | 0x0004         | Tag                    | 4 bytes: "CODE"                                            |
//! | 0x0008         | Script length          | 4 bytes: Length of the script                              |
//! | 0x000C         | Script                 | (Script length) bytes: ANSI encoded script                 |
//!
//! The record is always sliced by the script length, never by the outer size.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers, except the font name length
//! - **Trailing bytes**: Decoding stops once 4 bytes or less remain; those are kept as a trailer
//!

pub mod error;
pub mod read;
pub mod types;
pub mod write;

pub use types::{BiffStream, Record, Tag};

use crate::error::{Error, Result};

/// Decodes the records of a stream, skipping `offset` bytes of header first.
pub fn decode(data: &[u8], offset: usize) -> Result<BiffStream> {
    BiffStream::decode(data, offset)
}

/// Re-serializes a decoded stream.
pub fn encode(stream: &BiffStream) -> Result<Vec<u8>> {
    stream.encode()
}

/// Returns the first record carrying `tag`.
pub fn find_by_tag(records: &[Record], tag: Tag) -> Result<&Record> {
    records
        .iter()
        .find(|record| record.tag() == tag)
        .ok_or(Error::RecordNotFound(tag))
}

/// Replaces the payload of the first record carrying `tag` and returns the re-serialized stream.
///
/// Every other record is copied byte-for-byte. The result is decoded again to make sure the new
/// payload can be read back before it is handed out.
pub fn replace_payload(data: &[u8], offset: usize, tag: Tag, payload: &[u8]) -> Result<Vec<u8>> {
    let mut stream = BiffStream::decode(data, offset)?;
    stream.replace_payload(tag, payload)?;
    let patched = stream.encode()?;

    let reread = BiffStream::decode(&patched, offset)?;
    if reread != stream || find_by_tag(&reread.records, tag)?.payload() != payload {
        return Err(Error::RoundTripMismatch);
    }

    Ok(patched)
}

/// Checks that decoding and re-encoding `data` gives back exactly the same bytes.
pub fn check_consistency(data: &[u8], offset: usize) -> Result<bool> {
    let stream = BiffStream::decode(data, offset)?;
    let encoded = stream.encode()?;
    if encoded != data {
        tracing::warn!(
            original = data.len(),
            encoded = encoded.len(),
            "re-encoded stream differs from the original"
        );
        return Ok(false);
    }

    Ok(BiffStream::decode(&encoded, offset)? == stream)
}

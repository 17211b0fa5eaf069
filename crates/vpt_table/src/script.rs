//! Reading and replacing the table script
//!
//! Replacing the script runs in stages:
//!
//! | Stage        | Does                                                        | Writes |
//! |--------------|-------------------------------------------------------------|--------|
//! | `Validating` | checks the stored checksum and that `GameData` re-encodes   | no     |
//! | `Patching`   | replaces the `CODE` record and commits `GameData`           | yes    |
//! | `Rehashing`  | reopens the table and computes the new checksum             | no     |
//! | `Committed`  | commits the new checksum to `MAC`                           | yes    |
//!
//! Nothing is written unless validation passed. A failure after `Patching` leaves a table with the
//! new script and a stale checksum behind, which is reported as [`Error::Unfinished`].

use std::fmt;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use tracing::{debug, info, instrument, warn};
use vpt_biff::Tag;

use crate::checksum::{self, ChecksumReport, Digest};
use crate::container::{Container, Storage, GAME_DATA_STREAM, MAC_STREAM};
use crate::error::{Error, Result};

/// Size and tag of the record closing a stream
const END_MARKER: [u8; 8] = [0x04, 0x00, 0x00, 0x00, b'E', b'N', b'D', b'B'];

/// Stages of [`set_table_script`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PatchStage {
    Validating,
    Patching,
    Rehashing,
    Committed,
}

impl fmt::Display for PatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            PatchStage::Validating => "validating",
            PatchStage::Patching => "patching the script",
            PatchStage::Rehashing => "rehashing",
            PatchStage::Committed => "committing the checksum",
        };
        f.write_str(stage)
    }
}

/// Reads the script of a table.
///
/// Returns `None` if the file does not exist, or if it has no recognizable script.
#[instrument(skip(path), fields(path = %path.as_ref().display()), err)]
pub fn get_table_script(path: impl AsRef<Path>) -> Result<Option<String>> {
    let mut table = match Container::open(path) {
        Ok(table) => table,
        Err(Error::FileNotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    let Some(game_data) = table.optional_stream(Storage::Game, GAME_DATA_STREAM)? else {
        warn!("cannot read table script, there is no game data");
        return Ok(None);
    };
    table.close();

    let script = match vpt_biff::decode(&game_data, 0) {
        Ok(stream) => stream
            .find(Tag::CODE)
            .map(|record| decode_script(record.payload())),
        Err(e) => {
            debug!(error = %e, "game data does not decode, scanning for the script");
            find_script(&game_data).map(decode_script)
        }
    };

    Ok(script)
}

/// Locates the script bytes by its tag instead of decoding the whole stream.
///
/// The size in front of the tag is ignored, the script is sliced by its own length.
fn find_script(game_data: &[u8]) -> Option<&[u8]> {
    let tag = find(game_data.get(4..)?, &Tag::CODE.0)? + 4;
    let start = tag + 4;
    let len = u32::from_le_bytes(game_data.get(start..start + 4)?.try_into().ok()?) as usize;
    let script_start = start + 4;
    let script_end = script_start.checked_add(len)?;
    let script = game_data.get(script_start..script_end)?;

    match find(&game_data[script_end..], &END_MARKER) {
        Some(_) => Some(script),
        None => {
            debug!("no end marker after the script");
            None
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Replaces the script of a table and updates its checksum.
///
/// The table must carry a valid checksum, otherwise nothing is changed and
/// [`Error::ChecksumMismatch`] is returned. See the [module documentation](self) for the stages.
#[instrument(skip(path, script), fields(path = %path.as_ref().display(), len = script.len()), err)]
pub fn set_table_script(path: impl AsRef<Path>, script: &str) -> Result<()> {
    let path = path.as_ref();
    info!("saving table script");
    let payload = encode_script(script)?;

    info!(stage = %PatchStage::Validating, "checking checksum and game data");
    let (mut table, game_data) = validate(path)?;

    info!(stage = %PatchStage::Patching, "updating script record");
    patch(&mut table, &game_data, &payload)?;
    table.commit()?;

    let unfinished = |stage| {
        move |source| Error::Unfinished {
            stage,
            source: Box::new(source),
        }
    };

    info!(stage = %PatchStage::Rehashing, "computing new checksum");
    let (mut table, digest) = rehash(path).map_err(unfinished(PatchStage::Rehashing))?;

    info!(stage = %PatchStage::Committed, hash = %digest, "setting new checksum");
    table.set_stream(Storage::Game, MAC_STREAM, digest.0.to_vec());
    table.commit().map_err(unfinished(PatchStage::Committed))?;

    info!("done");
    Ok(())
}

/// Compares the stored checksum of a table to the computed one without changing anything.
#[instrument(skip(path), fields(path = %path.as_ref().display()), err)]
pub fn verify_checksum(path: impl AsRef<Path>) -> Result<ChecksumReport> {
    let mut table = Container::open(path)?;
    checksum::check(&mut table)
}

fn validate(path: &Path) -> Result<(Container, Vec<u8>)> {
    let mut table = Container::open(path)?;

    checksum::check(&mut table)?.ensure_valid()?;
    info!("checksum looks good, computed the same as found in file");

    let game_data = table.stream(Storage::Game, GAME_DATA_STREAM)?;
    if !vpt_biff::check_consistency(&game_data, 0)? {
        return Err(Error::ConsistencyError);
    }
    debug!("game data re-encodes unchanged");

    Ok((table, game_data))
}

fn patch(table: &mut Container, game_data: &[u8], payload: &[u8]) -> Result<()> {
    let patched = vpt_biff::replace_payload(game_data, 0, Tag::CODE, payload)?;
    debug!(before = game_data.len(), after = patched.len(), "patched game data");
    table.set_stream(Storage::Game, GAME_DATA_STREAM, patched);
    Ok(())
}

fn rehash(path: &Path) -> Result<(Container, Digest)> {
    let mut table = Container::open(path)?;
    let digest = checksum::compute_checksum(&mut table)?;
    Ok((table, digest))
}

/// Converts script text to the ANSI bytes stored in the table.
pub fn encode_script(script: &str) -> Result<Vec<u8>> {
    let (bytes, _, unmappable) = WINDOWS_1252.encode(script);
    if unmappable {
        return Err(Error::UnencodableScript);
    }
    Ok(bytes.into_owned())
}

/// Converts the ANSI bytes stored in the table to script text.
pub fn decode_script(bytes: &[u8]) -> String {
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}

//! The checksum Visual Pinball stores in the `MAC` stream
//!
//! Visual Pinball refuses to load a table whose stored checksum does not match the data, so the
//! hash input has to be collected exactly the way Visual Pinball collects it:
//!
//! 1. The literal `Visual Pinball`
//! 2. The `GameStg/Version` stream
//! 3. The [`TABLE_INFO_STREAMS`] of `TableInfo` that exist, in that order
//! 4. The records of `GameStg/CustomInfoTags`, followed by the `TableInfo` stream named by each of
//!    its `CUST` records
//! 5. The records of `GameStg/GameData`
//! 6. For file versions below [`GAME_ITEMS_HASHED_BEFORE`], the records of every `GameItem{N}`
//! 7. The records of every `Collection{N}`
//!
//! Records contribute their tag and payload (see [`vpt_biff::Record::extend_hash_input`]). The
//! result is hashed with MD2.

use std::fmt;
use std::time::Instant;

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::WINDOWS_1252;
use md2::{Digest as _, Md2};
use tracing::{debug, info, instrument, warn};
use vpt_biff::{BiffStream, Record, Tag};

use crate::container::{
    Container, Storage, COLLECTION_PREFIX, CUSTOM_TAGS_STREAM, GAME_DATA_STREAM,
    GAME_ITEM_PREFIX, MAC_STREAM, VERSION_STREAM,
};
use crate::error::{Error, Result};
use crate::stats::FormatStats;

/// Every hash input starts with this
pub const HASH_PREFIX: &[u8] = b"Visual Pinball";

/// Streams of the `TableInfo` storage that are hashed, in hashing order
pub const TABLE_INFO_STREAMS: [&str; 10] = [
    "TableName",
    "AuthorName",
    "TableVersion",
    "ReleaseDate",
    "AuthorEmail",
    "AuthorWebSite",
    "TableBlurb",
    "TableDescription",
    "TableRules",
    "Screenshot",
];

/// Game items are only part of the checksum for file versions below this one
pub const GAME_ITEMS_HASHED_BEFORE: i32 = 1000;

/// Game item streams start with the item type, which is not a record
pub const GAME_ITEM_OFFSET: usize = 4;

/// An MD2 digest
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 16]);

impl Digest {
    pub fn of(data: &[u8]) -> Digest {
        let mut digest = [0u8; 16];
        digest.copy_from_slice(&Md2::digest(data));
        Digest(digest)
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<[u8]> for Digest {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

/// Everything the checksum is computed from
#[derive(Debug, Clone, Default)]
pub struct HashInput {
    /// File format version, from the `Version` stream
    pub version: i32,

    /// Object counts seen in `GameData`
    pub stats: FormatStats,

    /// Bytes to be hashed
    pub data: Vec<u8>,
}

/// Outcome of comparing the stored checksum of a table to its data
#[derive(Debug, Clone)]
pub struct ChecksumReport {
    pub version: i32,
    pub stats: FormatStats,

    /// Content of the `MAC` stream
    pub stored: Vec<u8>,

    pub computed: Digest,
}

impl ChecksumReport {
    pub fn is_valid(&self) -> bool {
        self.computed == *self.stored.as_slice()
    }

    /// Turn a mismatch into [`Error::ChecksumMismatch`].
    pub fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            return Ok(());
        }

        Err(Error::ChecksumMismatch {
            stored: hex::encode_upper(&self.stored),
            computed: self.computed.to_hex(),
        })
    }
}

/// Reads the file format version.
pub fn file_version(table: &mut Container) -> Result<i32> {
    let version = table.stream(Storage::Game, VERSION_STREAM)?;
    match version.get(..4) {
        Some(bytes) => Ok(LittleEndian::read_i32(bytes)),
        None => Err(Error::InvalidVersion(version.len())),
    }
}

/// Reads the stored checksum.
pub fn read_checksum(table: &mut Container) -> Result<Vec<u8>> {
    table.stream(Storage::Game, MAC_STREAM)
}

/// Computes the checksum Visual Pinball expects in the `MAC` stream.
///
/// Pending writes of `table` are taken into account.
pub fn compute_checksum(table: &mut Container) -> Result<Digest> {
    let input = collect_hash_input(table)?;
    Ok(hash(&input.data))
}

/// Computes the checksum and compares it to the stored one.
#[instrument(skip(table), err)]
pub fn check(table: &mut Container) -> Result<ChecksumReport> {
    let input = collect_hash_input(table)?;
    let computed = hash(&input.data);
    let stored = read_checksum(table)?;
    info!(mac = %hex::encode_upper(&stored), "stored checksum");

    Ok(ChecksumReport {
        version: input.version,
        stats: input.stats,
        stored,
        computed,
    })
}

fn hash(data: &[u8]) -> Digest {
    let started = Instant::now();
    let digest = Digest::of(data);
    info!(
        hash = %digest,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "computed checksum"
    );
    digest
}

/// Collects the bytes the checksum is computed from.
#[instrument(skip(table), err)]
pub fn collect_hash_input(table: &mut Container) -> Result<HashInput> {
    let started = Instant::now();

    let version = file_version(table)?;
    info!(version, "collecting hash input");

    let mut input = HashInput {
        version,
        ..Default::default()
    };
    input.data.extend_from_slice(HASH_PREFIX);

    add_version(table, &mut input)?;
    add_table_info(table, &mut input)?;
    add_custom_info(table, &mut input)?;
    add_game_data(table, &mut input)?;

    let stats = input.stats;
    if version < GAME_ITEMS_HASHED_BEFORE {
        add_numbered(
            table,
            &mut input,
            GAME_ITEM_PREFIX,
            stats.num_sub_objects(),
            GAME_ITEM_OFFSET,
        )?;
    }
    add_numbered(
        table,
        &mut input,
        COLLECTION_PREFIX,
        stats.num_collections(),
        0,
    )?;

    info!(
        len = input.data.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "collected hash input"
    );

    Ok(input)
}

fn add_version(table: &mut Container, input: &mut HashInput) -> Result<()> {
    let version = table.stream(Storage::Game, VERSION_STREAM)?;
    input.data.extend_from_slice(&version);
    Ok(())
}

fn add_table_info(table: &mut Container, input: &mut HashInput) -> Result<()> {
    for name in TABLE_INFO_STREAMS {
        add_info_stream(table, input, name)?;
    }
    Ok(())
}

fn add_info_stream(table: &mut Container, input: &mut HashInput, name: &str) -> Result<()> {
    match table.optional_stream(Storage::TableInfo, name)? {
        Some(data) => input.data.extend_from_slice(&data),
        None => debug!(name, "skipping absent table info"),
    }
    Ok(())
}

fn add_custom_info(table: &mut Container, input: &mut HashInput) -> Result<()> {
    let Some(data) = table.optional_stream(Storage::Game, CUSTOM_TAGS_STREAM)? else {
        debug!("no custom table info");
        return Ok(());
    };

    let tags = BiffStream::decode(&data, 0)?;
    add_records(input, &tags.records);

    let keys = tags
        .by_tag(Tag::CUST)
        .filter_map(|record| custom_key(record.payload()))
        .collect::<Vec<_>>();
    debug!(?keys, "custom table info");

    for key in keys {
        add_info_stream(table, input, &key)?;
    }
    Ok(())
}

/// Name of a custom info stream, stored as a length-prefixed ANSI string.
fn custom_key(payload: &[u8]) -> Option<String> {
    let len = LittleEndian::read_u32(payload.get(..4)?) as usize;
    let Some(name) = payload.get(4..).and_then(|rest| rest.get(..len)) else {
        warn!(len, available = payload.len(), "ignoring truncated custom info key");
        return None;
    };

    let (name, _, _) = WINDOWS_1252.decode(name);
    Some(name.into_owned())
}

fn add_game_data(table: &mut Container, input: &mut HashInput) -> Result<()> {
    let data = table.stream(Storage::Game, GAME_DATA_STREAM)?;
    let game_data = BiffStream::decode(&data, 0)?;

    for record in &game_data.records {
        input.stats.observe(record);
    }
    add_records(input, &game_data.records);
    debug!(stats = %input.stats, "game data");

    Ok(())
}

fn add_numbered(
    table: &mut Container,
    input: &mut HashInput,
    prefix: &str,
    count: usize,
    offset: usize,
) -> Result<()> {
    info!(count, prefix, "adding numbered streams");
    for n in 0..count {
        let data = table.stream(Storage::Game, &format!("{prefix}{n}"))?;
        let stream = BiffStream::decode(&data, offset)?;
        add_records(input, &stream.records);
    }
    Ok(())
}

fn add_records(input: &mut HashInput, records: &[Record]) {
    for record in records {
        record.extend_hash_input(&mut input.data);
    }
}

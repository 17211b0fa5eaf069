//! Base types for the structure of BIFF streams.

use std::fmt;

use binrw::{BinRead, BinWrite};

/// Four character record identifier
#[derive(BinRead, BinWrite, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// Table script
    pub const CODE: Tag = Tag(*b"CODE");
    /// End of a record stream
    pub const ENDB: Tag = Tag(*b"ENDB");
    /// Persisted OLE font
    pub const FONT: Tag = Tag(*b"FONT");
    /// Custom table info key
    pub const CUST: Tag = Tag(*b"CUST");
    /// Number of game items
    pub const SEDT: Tag = Tag(*b"SEDT");
    /// Number of sounds
    pub const SSND: Tag = Tag(*b"SSND");
    /// Number of images
    pub const SIMG: Tag = Tag(*b"SIMG");
    /// Number of fonts
    pub const SFNT: Tag = Tag(*b"SFNT");
    /// Number of collections
    pub const SCOL: Tag = Tag(*b"SCOL");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Tag {
    fn from(value: [u8; 4]) -> Self {
        Tag(value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

/// Size and tag preceding every record
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct RecordHeader {
    /// Size of the tag plus the data declared by the record
    pub size: u32,

    /// Record identifier
    pub tag: Tag,
}

/// A single record of a BIFF stream
///
/// Each variant keeps enough of the original layout for [`crate::BiffStream::encode`] to
/// reproduce the exact bytes it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// `size | tag | data`
    Block { tag: Tag, data: Vec<u8> },

    /// `size | FONT | data | body`
    ///
    /// `data` is whatever the declared size covers past the tag (normally nothing), `body` is
    /// the persisted font.
    Font { data: Vec<u8>, body: Vec<u8> },

    /// `size | CODE | length | script`
    Script { size: u32, script: Vec<u8> },
}

impl Record {
    pub fn tag(&self) -> Tag {
        match self {
            Record::Block { tag, .. } => *tag,
            Record::Font { .. } => Tag::FONT,
            Record::Script { .. } => Tag::CODE,
        }
    }

    /// The logical payload of the record.
    ///
    /// For fonts this is the declared data only, for scripts the script without its length.
    pub fn payload(&self) -> &[u8] {
        match self {
            Record::Block { data, .. } => data,
            Record::Font { data, .. } => data,
            Record::Script { script, .. } => script,
        }
    }

    /// Number of bytes this record occupies in its stream.
    pub fn encoded_len(&self) -> usize {
        match self {
            Record::Block { data, .. } => 8 + data.len(),
            Record::Font { data, body } => 8 + data.len() + body.len(),
            Record::Script { script, .. } => 12 + script.len(),
        }
    }

    /// Appends the bytes of this record covered by the table checksum.
    ///
    /// That is the tag followed by the payload. Neither the size fields nor the font body are
    /// hashed.
    pub fn extend_hash_input(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.tag().as_bytes());
        buf.extend_from_slice(self.payload());
    }
}

/// A decoded BIFF stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiffStream {
    /// Bytes before the start offset
    pub header: Vec<u8>,

    /// Records in stream order
    pub records: Vec<Record>,

    /// Up to 4 bytes left after the last record
    pub trailer: Vec<u8>,
}

impl BiffStream {
    /// Total number of bytes of the encoded stream.
    pub fn encoded_len(&self) -> usize {
        self.header.len()
            + self.records.iter().map(Record::encoded_len).sum::<usize>()
            + self.trailer.len()
    }

    /// Returns the first record carrying `tag`, if any.
    pub fn find(&self, tag: Tag) -> Option<&Record> {
        self.records.iter().find(|r| r.tag() == tag)
    }

    /// Iterates over the records carrying `tag`.
    pub fn by_tag(&self, tag: Tag) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.tag() == tag)
    }
}

//! Encoding of BIFF streams
//!

use binrw::BinWrite;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Cursor, Write};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::types::{BiffStream, Record, RecordHeader, Tag};

/// Outer size of a script record that only covers its tag.
const SCRIPT_TAG_ONLY: u32 = 4;

fn record_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::PayloadTooLarge(len))
}

impl Record {
    /// Write the record in its stream layout.
    pub fn write<W: Write + std::io::Seek>(&self, out: &mut W) -> Result<()> {
        match self {
            Record::Block { tag, data } => {
                RecordHeader {
                    size: record_len(4 + data.len())?,
                    tag: *tag,
                }
                .write(out)?;
                out.write_all(data)?;
            }
            Record::Font { data, body } => {
                RecordHeader {
                    size: record_len(4 + data.len())?,
                    tag: Tag::FONT,
                }
                .write(out)?;
                out.write_all(data)?;
                out.write_all(body)?;
            }
            Record::Script { size, script } => {
                RecordHeader {
                    size: *size,
                    tag: Tag::CODE,
                }
                .write(out)?;
                out.write_u32::<LittleEndian>(record_len(script.len())?)?;
                out.write_all(script)?;
            }
        }
        Ok(())
    }

    /// Swap the payload, updating the length fields that depend on it.
    fn set_payload(&mut self, payload: &[u8]) -> Result<()> {
        match self {
            Record::Block { data, .. } => {
                record_len(4 + payload.len())?;
                *data = payload.to_vec();
            }
            Record::Script { size, script } => {
                if *size != SCRIPT_TAG_ONLY {
                    *size = record_len(8 + payload.len())?;
                }
                *script = payload.to_vec();
            }
            Record::Font { .. } => return Err(Error::UnsupportedRecord(Tag::FONT)),
        }
        Ok(())
    }
}

impl BiffStream {
    /// Serialize the stream back to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::with_capacity(self.encoded_len()));
        out.write_all(&self.header)?;
        for record in &self.records {
            record.write(&mut out)?;
        }
        out.write_all(&self.trailer)?;

        Ok(out.into_inner())
    }

    /// Replace the payload of the first record carrying `tag`.
    #[instrument(skip(self, payload), fields(len = payload.len()), err)]
    pub fn replace_payload(&mut self, tag: Tag, payload: &[u8]) -> Result<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.tag() == tag)
            .ok_or(Error::RecordNotFound(tag))?;

        record.set_payload(payload)
    }
}

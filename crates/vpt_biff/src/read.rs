//! Decoding of BIFF streams
//!

use winnow::binary::{be_u16, le_u32};
use winnow::combinator::{cut_err, fail, preceded};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::prelude::*;
use winnow::token::take;

use crate::error::{Error, Result};
use crate::types::{BiffStream, Record, Tag};

/// Offset of the big-endian face name length, counted from the start of a `FONT` record.
const FONT_NAME_LENGTH_OFFSET: usize = 17;

/// Stride from the start of a `FONT` record to its face name, minus the generic 4 byte advance.
const FONT_STRIDE: usize = 15;

/// Records keep being read while more than this many bytes remain.
const TRAILER_MAX: usize = 4;

fn tag(input: &mut &[u8]) -> PResult<Tag> {
    take(4usize)
        .map(|t: &[u8]| Tag([t[0], t[1], t[2], t[3]]))
        .context(StrContext::Label("record tag"))
        .parse_next(input)
}

/// Sizes below 4 cannot cover the tag, so they are rejected as malformed rather than skipped.
fn record_size(input: &mut &[u8]) -> PResult<u32> {
    le_u32
        .verify(|size: &u32| *size >= 4)
        .context(StrContext::Label("record size"))
        .parse_next(input)
}

fn font<'s>(record_start: &'s [u8], size: u32, input: &mut &'s [u8]) -> PResult<Record> {
    let data = cut_err(take(size - 4))
        .context(StrContext::Label("font data"))
        .parse_next(input)?;

    let name_len = cut_err(preceded(take(FONT_NAME_LENGTH_OFFSET), be_u16))
        .context(StrContext::Label("font name length"))
        .parse_next(&mut &record_start[..])?;

    let end = FONT_STRIDE + TRAILER_MAX + name_len as usize;
    let consumed = record_start.len() - input.len();
    let Some(body_len) = end.checked_sub(consumed) else {
        return cut_err(fail)
            .context(StrContext::Label("font extent"))
            .parse_next(input);
    };

    let body = cut_err(take(body_len))
        .context(StrContext::Label("font body"))
        .parse_next(input)?;

    Ok(Record::Font {
        data: data.to_vec(),
        body: body.to_vec(),
    })
}

fn script(size: u32, input: &mut &[u8]) -> PResult<Record> {
    let len = cut_err(le_u32)
        .context(StrContext::Label("script length"))
        .parse_next(input)?;
    let script = cut_err(take(len))
        .context(StrContext::Label("script"))
        .parse_next(input)?;

    Ok(Record::Script {
        size,
        script: script.to_vec(),
    })
}

fn record(input: &mut &[u8]) -> PResult<Record> {
    let record_start = *input;
    let size = record_size.parse_next(input)?;
    let tag = cut_err(tag).parse_next(input)?;

    match tag {
        Tag::FONT => font(record_start, size, input),
        Tag::CODE => script(size, input),
        _ => {
            let data = cut_err(take(size - 4))
                .context(StrContext::Label("record data"))
                .parse_next(input)?;
            Ok(Record::Block {
                tag,
                data: data.to_vec(),
            })
        }
    }
}

fn malformed(offset: usize, err: ErrMode<ContextError>) -> Error {
    let context = match err.into_inner() {
        Some(e) => {
            let labels = e.context().map(|c| c.to_string()).collect::<Vec<_>>();
            if labels.is_empty() {
                "unexpected input".to_string()
            } else {
                format!("invalid {}", labels.join(" in "))
            }
        }
        None => "incomplete input".to_string(),
    };
    Error::MalformedRecord { offset, context }
}

impl BiffStream {
    /// Decode a stream, keeping the first `offset` bytes as its header.
    #[tracing::instrument(skip(data), fields(len = data.len()), err)]
    pub fn decode(data: &[u8], offset: usize) -> Result<BiffStream> {
        let (header, mut input) = match data.get(offset..) {
            Some(rest) => (&data[..offset], rest),
            None => {
                return Err(Error::OffsetOutOfBounds {
                    offset,
                    len: data.len(),
                })
            }
        };

        let mut records = Vec::new();
        while input.len() > TRAILER_MAX {
            let position = data.len() - input.len();
            let next = record(&mut input).map_err(|e| malformed(position, e))?;
            tracing::trace!(tag = %next.tag(), position, "decoded record");
            records.push(next);
        }

        tracing::debug!(records = records.len(), trailer = input.len(), "decoded stream");

        Ok(BiffStream {
            header: header.to_vec(),
            records,
            trailer: input.to_vec(),
        })
    }
}

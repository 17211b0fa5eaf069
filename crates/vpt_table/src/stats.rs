//! Object counts found in the `GameData` stream
//!

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use vpt_biff::{Record, Tag};

/// Number of the different objects stored in a table
///
/// Only the counters are kept that tell how many numbered streams there are. Each counter is
/// taken from the first record carrying its tag, later records are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatStats {
    sub_objects: Option<i32>,
    sounds: Option<i32>,
    textures: Option<i32>,
    fonts: Option<i32>,
    collections: Option<i32>,
}

impl FormatStats {
    /// Record a counter if `record` carries one that has not been seen yet.
    pub fn observe(&mut self, record: &Record) {
        let slot = match record.tag() {
            Tag::SEDT => &mut self.sub_objects,
            Tag::SSND => &mut self.sounds,
            Tag::SIMG => &mut self.textures,
            Tag::SFNT => &mut self.fonts,
            Tag::SCOL => &mut self.collections,
            _ => return,
        };

        if slot.is_none() {
            if let Some(value) = record.payload().get(..4) {
                *slot = Some(LittleEndian::read_i32(value));
            }
        }
    }

    /// Number of `GameItem{N}` streams
    pub fn num_sub_objects(&self) -> usize {
        count(self.sub_objects)
    }

    pub fn num_sounds(&self) -> usize {
        count(self.sounds)
    }

    pub fn num_textures(&self) -> usize {
        count(self.textures)
    }

    pub fn num_fonts(&self) -> usize {
        count(self.fonts)
    }

    /// Number of `Collection{N}` streams
    pub fn num_collections(&self) -> usize {
        count(self.collections)
    }
}

/// Unset and negative counters both mean there is nothing to hash.
fn count(value: Option<i32>) -> usize {
    value.and_then(|v| usize::try_from(v).ok()).unwrap_or(0)
}

impl fmt::Display for FormatStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} game items, {} sounds, {} images, {} fonts, {} collections",
            self.num_sub_objects(),
            self.num_sounds(),
            self.num_textures(),
            self.num_fonts(),
            self.num_collections()
        )
    }
}

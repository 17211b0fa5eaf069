//! Builds small tables in a temporary directory.
//!
//! The expected checksum is collected next to the streams while they are written, so it does not
//! go through any of the code under test.
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use md2::{Digest, Md2};
use miette::{IntoDiagnostic, Result};
use tempfile::TempDir;

/// Record bytes of a stream, along with the part of them that is hashed
#[derive(Default)]
pub struct Records {
    pub bytes: Vec<u8>,
    pub hashed: Vec<u8>,
}

impl Records {
    pub fn with_header(header: &[u8]) -> Records {
        Records {
            bytes: header.to_vec(),
            hashed: Vec::new(),
        }
    }

    pub fn block(mut self, tag: &[u8; 4], data: &[u8]) -> Records {
        self.bytes
            .extend_from_slice(&((data.len() + 4) as u32).to_le_bytes());
        self.bytes.extend_from_slice(tag);
        self.bytes.extend_from_slice(data);
        self.hashed.extend_from_slice(tag);
        self.hashed.extend_from_slice(data);
        self
    }

    pub fn counter(self, tag: &[u8; 4], value: i32) -> Records {
        self.block(tag, &value.to_le_bytes())
    }

    pub fn string(self, tag: &[u8; 4], value: &str) -> Records {
        let mut data = (value.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(value.as_bytes());
        self.block(tag, &data)
    }

    pub fn font(mut self, name: &str) -> Records {
        self.bytes.extend_from_slice(&4u32.to_le_bytes());
        self.bytes.extend_from_slice(b"FONT");
        self.bytes
            .extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x90, 0x01, 0x40, 0x1F, 0x00]);
        self.bytes
            .extend_from_slice(&(name.len() as u16).to_be_bytes());
        self.bytes.extend_from_slice(name.as_bytes());
        self.hashed.extend_from_slice(b"FONT");
        self
    }

    pub fn script(self, code: &[u8]) -> Records {
        self.script_with_size(4, code)
    }

    /// A script record whose outer size is `size` instead of the usual tag-only 4.
    pub fn script_with_size(mut self, size: u32, code: &[u8]) -> Records {
        self.bytes.extend_from_slice(&size.to_le_bytes());
        self.bytes.extend_from_slice(b"CODE");
        self.bytes
            .extend_from_slice(&(code.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(code);
        self.hashed.extend_from_slice(b"CODE");
        self.hashed.extend_from_slice(code);
        self
    }

    pub fn end(self) -> Records {
        self.block(b"ENDB", &[])
    }
}

pub fn utf16(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

pub fn md2(data: &[u8]) -> Vec<u8> {
    Md2::digest(data).to_vec()
}

/// A table to be written by [`TableBuilder::write`]
#[derive(Clone)]
pub struct TableBuilder {
    pub version: i32,
    pub script: Option<Vec<u8>>,
    /// Writes the script record with an outer size covering the script, as some editors do.
    pub enclosing_size: bool,
    pub table_info: Vec<(String, Vec<u8>)>,
    pub custom_keys: Vec<String>,
    pub custom_values: Vec<(String, Vec<u8>)>,
    pub game_items: usize,
    pub collections: usize,
    pub mac: Option<Vec<u8>>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        TableBuilder {
            version: 1060,
            script: Some(b"Option Explicit\r\n\r\nX = 1\r\n".to_vec()),
            enclosing_size: false,
            table_info: vec![
                ("TableName".into(), utf16("Test Table")),
                ("AuthorName".into(), utf16("Nobody")),
                ("TableVersion".into(), utf16("1.0")),
            ],
            custom_keys: Vec::new(),
            custom_values: Vec::new(),
            game_items: 2,
            collections: 1,
            mac: None,
        }
    }
}

impl TableBuilder {
    pub fn script(self, script: &[u8]) -> TableBuilder {
        TableBuilder {
            script: Some(script.to_vec()),
            ..self
        }
    }

    pub fn version(self, version: i32) -> TableBuilder {
        TableBuilder { version, ..self }
    }

    pub fn custom(mut self, key: &str, value: Option<&str>) -> TableBuilder {
        self.custom_keys.push(key.to_string());
        if let Some(value) = value {
            self.custom_values.push((key.to_string(), utf16(value)));
        }
        self
    }

    pub fn game_data(&self) -> Records {
        let records = Records::default()
            .block(b"LEFT", &0f32.to_le_bytes())
            .block(b"RGHT", &1000f32.to_le_bytes())
            .string(b"NAME", "Table1")
            .counter(b"SEDT", self.game_items as i32)
            .counter(b"SSND", 0)
            .counter(b"SIMG", 0)
            .counter(b"SFNT", 0)
            .counter(b"SCOL", self.collections as i32)
            .font("Tahoma");
        match &self.script {
            Some(script) if self.enclosing_size => {
                records.script_with_size(8 + script.len() as u32, script)
            }
            Some(script) => records.script(script),
            None => records,
        }
        .end()
    }

    pub fn game_item(&self, n: usize) -> Records {
        Records::with_header(&5u32.to_le_bytes())
            .block(b"VCEN", &[0x00, 0x00, 0x48, 0x43, 0x00, 0x00, 0x96, 0x43])
            .string(b"NAME", &format!("Wall{n}"))
            .end()
    }

    pub fn collection(&self, n: usize) -> Records {
        Records::default()
            .string(b"NAME", &format!("Collection{n}"))
            .string(b"ITEM", "Wall0")
            .end()
    }

    pub fn custom_tags(&self) -> Records {
        self.custom_keys
            .iter()
            .fold(Records::default(), |records, key| records.string(b"CUST", key))
            .end()
    }

    /// Every stream of the table, in the order they are hashed, along with the hash input.
    pub fn streams(&self) -> (Vec<(String, Vec<u8>)>, Vec<u8>) {
        let mut streams = Vec::new();
        let mut hashed = b"Visual Pinball".to_vec();

        let version = self.version.to_le_bytes().to_vec();
        hashed.extend_from_slice(&version);
        streams.push(("/GameStg/Version".to_string(), version));

        for (name, value) in &self.table_info {
            hashed.extend_from_slice(value);
            streams.push((format!("/TableInfo/{name}"), value.clone()));
        }

        if !self.custom_keys.is_empty() {
            let tags = self.custom_tags();
            hashed.extend_from_slice(&tags.hashed);
            streams.push(("/GameStg/CustomInfoTags".to_string(), tags.bytes));
            for key in &self.custom_keys {
                if let Some((_, value)) = self.custom_values.iter().find(|(k, _)| k == key) {
                    hashed.extend_from_slice(value);
                    streams.push((format!("/TableInfo/{key}"), value.clone()));
                }
            }
        }

        let game_data = self.game_data();
        hashed.extend_from_slice(&game_data.hashed);
        streams.push(("/GameStg/GameData".to_string(), game_data.bytes));

        for n in 0..self.game_items {
            let item = self.game_item(n);
            if self.version < 1000 {
                hashed.extend_from_slice(&item.hashed);
            }
            streams.push((format!("/GameStg/GameItem{n}"), item.bytes));
        }

        for n in 0..self.collections {
            let collection = self.collection(n);
            hashed.extend_from_slice(&collection.hashed);
            streams.push((format!("/GameStg/Collection{n}"), collection.bytes));
        }

        (streams, hashed)
    }

    /// The checksum Visual Pinball would store for this table
    pub fn digest(&self) -> Vec<u8> {
        md2(&self.streams().1)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let (streams, hashed) = self.streams();

        let mut comp = cfb::create(path).into_diagnostic()?;
        comp.create_storage("/GameStg").into_diagnostic()?;
        comp.create_storage("/TableInfo").into_diagnostic()?;
        for (name, data) in streams {
            comp.create_stream(&name)
                .into_diagnostic()?
                .write_all(&data)
                .into_diagnostic()?;
        }
        let mac = self.mac.clone().unwrap_or_else(|| md2(&hashed));
        comp.create_stream("/GameStg/MAC")
            .into_diagnostic()?
            .write_all(&mac)
            .into_diagnostic()?;
        comp.flush().into_diagnostic()?;

        Ok(())
    }
}

/// A table written to its own temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl Fixture {
    pub fn new(builder: &TableBuilder) -> Result<Fixture> {
        let dir = TempDir::new().into_diagnostic()?;
        let path = dir.path().join("table.vpx");
        builder.write(&path)?;
        Ok(Fixture { dir, path })
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).into_diagnostic()
    }

    /// Reads a stream with `cfb` directly.
    pub fn stream(&self, name: &str) -> Result<Vec<u8>> {
        let mut comp = cfb::open(&self.path).into_diagnostic()?;
        let mut data = Vec::new();
        std::io::Read::read_to_end(&mut comp.open_stream(name).into_diagnostic()?, &mut data)
            .into_diagnostic()?;
        Ok(data)
    }

    /// Overwrites a stream with `cfb` directly, leaving the checksum alone.
    pub fn overwrite(&self, name: &str, data: &[u8]) -> Result<()> {
        let mut comp = cfb::open_rw(&self.path).into_diagnostic()?;
        comp.create_stream(name)
            .into_diagnostic()?
            .write_all(data)
            .into_diagnostic()?;
        comp.flush().into_diagnostic()?;
        Ok(())
    }
}

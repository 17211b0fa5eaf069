//! Access to the compound document holding a table
//!

use cfb::CompoundFile;
use indexmap::IndexMap;
use std::{
    fmt::{self, Debug, Display},
    fs,
    io::{self, Cursor, Read, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::error::{Error, Result, StreamMissingError};

/// Table data, including the script
pub const GAME_DATA_STREAM: &str = "GameData";
/// File format version
pub const VERSION_STREAM: &str = "Version";
/// Keys of the custom table info
pub const CUSTOM_TAGS_STREAM: &str = "CustomInfoTags";
/// Stored checksum
pub const MAC_STREAM: &str = "MAC";
/// Prefix of the numbered game item streams
pub const GAME_ITEM_PREFIX: &str = "GameItem";
/// Prefix of the numbered collection streams
pub const COLLECTION_PREFIX: &str = "Collection";

/// The two storages found under the root of a table
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Storage {
    /// `GameStg`, the actual table data
    Game,

    /// `TableInfo`, what the user enters in the table info dialog
    TableInfo,
}

impl Storage {
    pub fn name(&self) -> &'static str {
        match self {
            Storage::Game => "GameStg",
            Storage::TableInfo => "TableInfo",
        }
    }

    fn path(&self) -> String {
        format!("/{}", self.name())
    }

    fn stream_path(&self, stream: &str) -> String {
        format!("/{}/{}", self.name(), stream)
    }
}

impl Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An open table file
///
/// The whole document is read into memory when opening, so no file handle is held while the
/// container is alive. Stream writes are buffered until [`Container::commit`], which replaces
/// the file on disk in one rename.
///
/// ```no_run
/// use vpt_table::container::{Container, Storage, GAME_DATA_STREAM};
///
/// fn game_data_len(path: &str) -> vpt_table::error::Result<usize> {
///     let mut table = Container::open(path)?;
///     Ok(table.stream(Storage::Game, GAME_DATA_STREAM)?.len())
/// }
/// ```
pub struct Container {
    path: PathBuf,
    file: CompoundFile<Cursor<Vec<u8>>>,
    pending: IndexMap<(Storage, String), Vec<u8>>,
}

impl Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Container({}, {} pending)",
            self.path.display(),
            self.pending.len()
        )
    }
}

impl Container {
    /// Open a table file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Container> {
        let path = path.as_ref();
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(path.to_owned()))
            }
            Err(e) => return Err(e.into()),
        };

        let file = CompoundFile::open(Cursor::new(data)).map_err(|source| {
            Error::InvalidContainer {
                path: path.to_owned(),
                source,
            }
        })?;

        if !file.is_storage(Storage::Game.path()) {
            return Err(Error::MissingStorage(Storage::Game));
        }

        Ok(Container {
            path: path.to_owned(),
            file,
            pending: IndexMap::new(),
        })
    }

    /// Path of the table on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a stream that has to be present.
    pub fn stream(&mut self, storage: Storage, name: &str) -> Result<Vec<u8>> {
        self.optional_stream(storage, name)?.ok_or_else(|| {
            StreamMissingError {
                storage,
                name: name.to_owned(),
            }
            .into()
        })
    }

    /// Read a stream that may legitimately be absent.
    ///
    /// Pending writes are returned in place of the data on disk.
    pub fn optional_stream(&mut self, storage: Storage, name: &str) -> Result<Option<Vec<u8>>> {
        if let Some(data) = self.pending.get(&(storage, name.to_owned())) {
            return Ok(Some(data.clone()));
        }

        let path = storage.stream_path(name);
        if !self.file.is_stream(&path) {
            return Ok(None);
        }

        let mut stream = self.file.open_stream(&path)?;
        let mut data = Vec::with_capacity(stream.len() as usize);
        stream.read_to_end(&mut data)?;

        Ok(Some(data))
    }

    /// Names of the streams directly below a storage, in directory order.
    pub fn stream_names(&self, storage: Storage) -> Result<Vec<String>> {
        if !self.file.is_storage(storage.path()) {
            return Ok(Vec::new());
        }

        Ok(self
            .file
            .read_storage(storage.path())?
            .filter(|entry| entry.is_stream())
            .map(|entry| entry.name().to_owned())
            .collect())
    }

    /// Replace the content of a stream. Nothing is written until [`Container::commit`].
    pub fn set_stream(&mut self, storage: Storage, name: &str, data: Vec<u8>) {
        debug!(%storage, name, len = data.len(), "queueing stream write");
        self.pending.insert((storage, name.to_owned()), data);
    }

    /// Whether there are stream writes waiting for a commit
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Write all pending streams to disk and close the table.
    ///
    /// The new document goes to a temporary file next to the table first, which then replaces
    /// the table, so a later [`Container::open`] sees either all of the writes or none of them.
    #[instrument(skip(self), fields(path = %self.path.display(), streams = self.pending.len()), err)]
    pub fn commit(mut self) -> Result<()> {
        for ((storage, name), data) in self.pending.drain(..) {
            let mut stream = self.file.create_stream(storage.stream_path(&name))?;
            stream.write_all(&data)?;
            stream.flush()?;
        }
        self.file.flush()?;

        let data = self.file.into_inner().into_inner();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(&data)?;
        staged.as_file().sync_all()?;

        let permissions = fs::metadata(&self.path)?.permissions();
        fs::set_permissions(staged.path(), permissions)?;

        staged.persist(&self.path).map_err(|e| e.error)?;
        debug!(len = data.len(), "committed");

        Ok(())
    }

    /// Close the table, dropping any pending writes.
    pub fn close(self) {
        if self.is_dirty() {
            debug!(path = %self.path.display(), pending = self.pending.len(), "discarding uncommitted writes");
        }
    }
}

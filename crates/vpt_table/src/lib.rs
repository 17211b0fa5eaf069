//! This library reads and replaces the script of *Visual Pinball* table files (`.vpt`, `.vpx`).
//!
//! # Table File Format Documentation
//!
//! A table is an OLE compound document, a small file system of *storages* (directories) and
//! *streams* (files). Only two storages below the root matter here:
//!
//! | Path                        | Description                                                    |
//! |-----------------------------|----------------------------------------------------------------|
//! | `/GameStg/Version`          | 4 bytes: File format version, e.g. 1060 for 10.6               |
//! | `/GameStg/GameData`         | BIFF records describing the table, including the script        |
//! | `/GameStg/GameItem{N}`      | 4 bytes of item type, then BIFF records of one table element   |
//! | `/GameStg/Collection{N}`    | BIFF records of one element collection                         |
//! | `/GameStg/CustomInfoTags`   | BIFF records naming the custom table info streams              |
//! | `/GameStg/MAC`              | 16 bytes: MD2 checksum of most of the above                    |
//! | `/TableInfo/*`              | UTF-16 strings entered in the table info dialog, a screenshot  |
//!
//! Images, sounds and fonts have their own numbered streams, which are not touched.
//!
//! The record layout of the BIFF streams is documented in [`vpt_biff`]. The checksum and the way
//! its input is collected is documented in [`checksum`].
//!
//! ## Script
//!
//! The script lives in the `CODE` record of `GameStg/GameData`, as Windows-1252 text. Changing it
//! invalidates the checksum, which Visual Pinball checks on load, so [`set_table_script`]
//! recomputes it. Since Visual Pinball may start hashing data this library does not know about,
//! the stored checksum is verified before anything is changed.
//!
//! ```no_run
//! # fn main() -> vpt_table::error::Result<()> {
//! let script = vpt_table::get_table_script("Table1.vpx")?.unwrap_or_default();
//! vpt_table::set_table_script("Table1.vpx", &script.replace("BallSize = 50", "BallSize = 52"))?;
//! # Ok(())
//! # }
//! ```
//!

pub mod checksum;
pub mod container;
pub mod error;
pub mod script;
pub mod stats;

pub use checksum::{compute_checksum, ChecksumReport, Digest};
pub use container::{Container, Storage};
pub use script::{get_table_script, set_table_script, verify_checksum, PatchStage};
pub use stats::FormatStats;

mod common;

use miette::Result;
use pretty_assertions::assert_eq;
use tracing_test::traced_test;
use vpt_table::{
    checksum::{collect_hash_input, read_checksum},
    compute_checksum,
    error::Error,
    verify_checksum, Container,
};

use common::{Fixture, TableBuilder};

#[traced_test]
#[test]
fn stored_checksum_matches() -> Result<()> {
    let builder = TableBuilder::default();
    let fixture = Fixture::new(&builder)?;

    let report = verify_checksum(&fixture.path)?;

    assert!(report.is_valid());
    assert_eq!(report.version, 1060);
    assert_eq!(report.computed.0.to_vec(), builder.digest());
    assert_eq!(report.stats.num_sub_objects(), 2);
    assert_eq!(report.stats.num_collections(), 1);

    Ok(())
}

#[traced_test]
#[test]
fn hash_input_is_collected_in_order() -> Result<()> {
    let builder = TableBuilder::default().custom("Cabinet", Some("Upright"));
    let fixture = Fixture::new(&builder)?;

    let mut table = Container::open(&fixture.path)?;
    let input = collect_hash_input(&mut table)?;

    assert_eq!(input.data, builder.streams().1);

    Ok(())
}

#[traced_test]
#[test]
fn checksum_is_deterministic() -> Result<()> {
    let fixture = Fixture::new(&TableBuilder::default())?;

    let first = compute_checksum(&mut Container::open(&fixture.path)?)?;
    let second = compute_checksum(&mut Container::open(&fixture.path)?)?;

    assert_eq!(first, second);
    assert_eq!(fixture.bytes()?, fixture.bytes()?);

    Ok(())
}

#[traced_test]
#[test]
fn game_items_hashed_for_old_versions() -> Result<()> {
    let builder = TableBuilder::default().version(600);
    let fixture = Fixture::new(&builder)?;

    assert!(verify_checksum(&fixture.path)?.is_valid());

    let mut item = builder.game_item(1).bytes;
    let last = item.len() - 9;
    item[last] = b'9';
    fixture.overwrite("/GameStg/GameItem1", &item)?;

    assert!(!verify_checksum(&fixture.path)?.is_valid());

    Ok(())
}

#[traced_test]
#[test]
fn game_items_ignored_for_new_versions() -> Result<()> {
    let builder = TableBuilder::default();
    let fixture = Fixture::new(&builder)?;

    let mut item = builder.game_item(1).bytes;
    let last = item.len() - 9;
    item[last] = b'9';
    fixture.overwrite("/GameStg/GameItem1", &item)?;

    assert!(verify_checksum(&fixture.path)?.is_valid());

    Ok(())
}

#[traced_test]
#[test]
fn collections_are_hashed() -> Result<()> {
    let builder = TableBuilder::default();
    let fixture = Fixture::new(&builder)?;

    let collection = common::Records::default()
        .string(b"NAME", "Collection0")
        .string(b"ITEM", "Wall1")
        .end();
    fixture.overwrite("/GameStg/Collection0", &collection.bytes)?;

    assert!(!verify_checksum(&fixture.path)?.is_valid());

    Ok(())
}

#[traced_test]
#[test]
fn custom_info_is_hashed() -> Result<()> {
    let builder = TableBuilder::default()
        .custom("Cabinet", Some("Upright"))
        .custom("Rom", Some("afm_113b"));
    let fixture = Fixture::new(&builder)?;

    assert!(verify_checksum(&fixture.path)?.is_valid());

    fixture.overwrite("/TableInfo/Rom", &common::utf16("afm_113"))?;
    assert!(!verify_checksum(&fixture.path)?.is_valid());

    Ok(())
}

#[traced_test]
#[test]
fn missing_custom_value_is_skipped() -> Result<()> {
    let builder = TableBuilder::default()
        .custom("Cabinet", None)
        .custom("Rom", Some("afm_113b"));
    let fixture = Fixture::new(&builder)?;

    assert!(verify_checksum(&fixture.path)?.is_valid());

    Ok(())
}

#[traced_test]
#[test]
fn missing_table_info_is_skipped() -> Result<()> {
    let builder = TableBuilder {
        table_info: Vec::new(),
        ..Default::default()
    };
    let fixture = Fixture::new(&builder)?;

    assert!(verify_checksum(&fixture.path)?.is_valid());

    Ok(())
}

#[traced_test]
#[test]
fn missing_collection_stream() -> Result<()> {
    let builder = TableBuilder::default();
    let fixture = Fixture::new(&TableBuilder {
        collections: 2,
        ..builder
    })?;

    let mut table = Container::open(&fixture.path)?;
    table.set_stream(
        vpt_table::Storage::Game,
        "GameData",
        TableBuilder {
            collections: 3,
            ..Default::default()
        }
        .game_data()
        .bytes,
    );

    let result = compute_checksum(&mut table);
    assert!(matches!(result, Err(Error::StreamMissing(_))));

    Ok(())
}

#[traced_test]
#[test]
fn invalid_version_stream() -> Result<()> {
    let fixture = Fixture::new(&TableBuilder::default())?;
    fixture.overwrite("/GameStg/Version", &[0x24, 0x04])?;

    let result = verify_checksum(&fixture.path);
    assert!(matches!(result, Err(Error::InvalidVersion(2))));

    Ok(())
}

#[traced_test]
#[test]
fn stored_checksum_is_read() -> Result<()> {
    let fixture = Fixture::new(&TableBuilder {
        mac: Some(vec![0x42; 16]),
        ..Default::default()
    })?;

    let mut table = Container::open(&fixture.path)?;
    assert_eq!(read_checksum(&mut table)?, vec![0x42; 16]);

    let report = verify_checksum(&fixture.path)?;
    assert!(!report.is_valid());
    assert!(matches!(
        report.ensure_valid(),
        Err(Error::ChecksumMismatch { .. })
    ));

    Ok(())
}

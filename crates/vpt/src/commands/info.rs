use clap::Args;
use itertools::Itertools;
use miette::Result;
use std::path::PathBuf;
use vpt_table::{checksum, Container, Storage};

#[derive(Args)]
pub struct InfoArgs {
    /// An input table file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let mut table = Container::open(&self.file)?;

        for storage in [Storage::Game, Storage::TableInfo] {
            let names = table.stream_names(storage)?;
            println!("{} ({} streams)", storage, names.len());
            let groups = names.iter().map(|name| stream_group(name)).counts();
            for (group, count) in groups.into_iter().sorted() {
                if names.iter().any(|name| name == group) {
                    println!("  {}", group);
                } else {
                    println!("  {}{{N}} ({})", group, count);
                }
            }
        }

        let input = checksum::collect_hash_input(&mut table)?;
        println!("version: {}", input.version);
        println!("objects: {}", input.stats);
        println!("hashed:  {} bytes", input.data.len());

        Ok(())
    }
}

/// Name without its trailing number, so numbered streams can be listed together
fn stream_group(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
}

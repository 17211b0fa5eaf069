use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ChecksumArgs {
    /// An input table file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl ChecksumArgs {
    pub fn handle(&self) -> Result<()> {
        let report = vpt_table::verify_checksum(&self.file)?;

        println!("version:  {}", report.version);
        println!("stored:   {}", hex::encode_upper(&report.stored));
        if report.is_valid() {
            println!("computed: {}", report.computed.green());
        } else {
            println!("computed: {}", report.computed.red());
        }

        report.ensure_valid()?;
        Ok(())
    }
}

use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct GetArgs {
    /// An input table file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Write the script to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl GetArgs {
    pub fn handle(&self) -> Result<()> {
        let script = vpt_table::get_table_script(&self.file)?
            .ok_or_else(|| miette!("no table script found in {}", self.file.display()))?;

        match &self.output {
            Some(output) => {
                info!("writing {}", output.display());
                std::fs::write(output, script)
                    .into_diagnostic()
                    .context(format!("path: {}", output.display()))?;
            }
            None => print!("{}", script),
        }

        Ok(())
    }
}

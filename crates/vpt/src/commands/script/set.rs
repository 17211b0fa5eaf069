use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::info;

use super::diff::ScriptDiff;

#[derive(Args)]
pub struct SetArgs {
    /// The table file to patch
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A file holding the new script
    #[arg(short, long, value_name = "FILE")]
    script: PathBuf,

    /// Print the changes to the current script first
    #[arg(long, default_value_t = false)]
    diff: bool,
}

impl SetArgs {
    pub fn handle(&self) -> Result<()> {
        let script = std::fs::read_to_string(&self.script)
            .into_diagnostic()
            .context(format!("path: {}", &self.script.display()))?;

        if self.diff {
            let current = vpt_table::get_table_script(&self.file)?.unwrap_or_default();
            let diff = ScriptDiff::new(&current, &script);
            if diff.is_empty() {
                info!("script is unchanged");
            } else {
                println!("{}", diff);
            }
        }

        vpt_table::set_table_script(&self.file, &script)?;
        info!("updated {}", self.file.display());

        Ok(())
    }
}

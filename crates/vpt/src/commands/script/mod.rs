pub mod diff;
pub mod get;
pub mod set;

#[derive(clap::Subcommand)]
pub enum ScriptCommands {
    /// Print or save the script of a table
    Get(get::GetArgs),
    /// Replace the script of a table and update its checksum
    Set(set::SetArgs),
}

impl ScriptCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            ScriptCommands::Get(get) => get.handle(),
            ScriptCommands::Set(set) => set.handle(),
        }
    }
}

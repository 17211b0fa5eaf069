pub mod checksum;
pub mod info;
pub mod script;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Read or replace the script of a table
    Script {
        #[command(subcommand)]
        command: script::ScriptCommands,
    },
    /// Compare the stored checksum of a table to its data
    Checksum(checksum::ChecksumArgs),
    /// List the streams and object counts of a table
    Info(info::InfoArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Script { command } => command.handle(),
            Commands::Checksum(checksum) => checksum.handle(),
            Commands::Info(info) => info.handle(),
        }
    }
}

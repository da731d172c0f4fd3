pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hivefs")]
#[command(version, about = "File manager over a content-addressed P2P store")]
pub struct Args {
    /// Path to the hivefs state directory (defaults to ~/.hivefs)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}

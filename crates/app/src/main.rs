// CLI modules
mod args;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Dir, Download, Import, Init, Ls, Rm, Search, Tree, Upload};
use tracing_subscriber::EnvFilter;

command_enum! {
    (Init, Init),
    (Upload, Upload),
    (Download, Download),
    (Ls, Ls),
    (Search, Search),
    (Tree, Tree),
    (Dir, Dir),
    (Import, Import),
    (Rm, Rm),
}

/// Log to stderr so command output on stdout stays clean.
///  RUST_LOG wins over the configured level.
fn init_logging(config_path: Option<std::path::PathBuf>) {
    let level = state::AppState::load(config_path)
        .map(|state| state.config.log_level)
        .unwrap_or_else(|_| "warn".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.config_path.clone());
    let ctx = op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

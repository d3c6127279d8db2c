mod cli;

use clap::Parser;
use std::path::PathBuf;
use superplane_core::command::{BindOptions, GlobalOptions, Streams};
use superplane_core::config::ConfigStore;
use superplane_core::services::init_logging;

#[derive(Parser, Debug)]
#[command(name = "superplane")]
#[command(version)]
#[command(about = "Command-line client for SuperPlane canvases")]
#[command(
    help_template = "{name} - {version}\n{about}\n\n{usage-heading}\n  {usage}\n\n{all-args}{options}\n"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: $HOME/.superplane.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format: text, json or yaml
    #[arg(short, long, global = true, value_name = "FORMAT")]
    output: Option<String>,

    #[command(subcommand)]
    command: cli::Commands,
}

impl Cli {
    fn globals(&self) -> GlobalOptions {
        GlobalOptions {
            verbose: self.verbose,
            config: self.config.clone(),
            output: self.output.clone(),
        }
    }
}

fn open_store(config: Option<PathBuf>) -> anyhow::Result<ConfigStore> {
    let path = match config {
        Some(path) => path,
        None => {
            let path = ConfigStore::default_path()?;
            ConfigStore::ensure_file(&path);
            path
        }
    };

    Ok(ConfigStore::open(path)?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let globals = cli.globals();
    let store = open_store(cli.config)?;
    let options = BindOptions::for_store(&store);
    cli::dispatch(cli.command, &globals, &options, Streams::stdio()).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("failed to initialize logging: {}", e);
    }

    if let Err(err) = run(cli).await {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

use crate::prelude::*;
use clap::Parser;

mod batch;
mod config;
mod error;
mod lines;
mod outline;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Infer a document title and H1-H3 outline from the visual layout of PDF files"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Layout configuration file (TOML)
    #[clap(long, env = "OUTLINER_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "OUTLINER_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Process every PDF in a directory and write one JSON file per document
    Batch(crate::batch::BatchOptions),

    /// Print the outline of a single PDF
    Outline(crate::outline::OutlineOptions),

    /// Print the grouped lines of a PDF (threshold tuning aid)
    Lines(crate::lines::LinesOptions),
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    init_logging(app.global.verbose);
    color_eyre::install()?;

    match app.command {
        SubCommands::Batch(options) => crate::batch::run(options, app.global).await,
        SubCommands::Outline(options) => crate::outline::run(options, app.global).await,
        SubCommands::Lines(options) => crate::lines::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}

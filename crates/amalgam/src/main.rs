use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use amalgam::app::pipeline::Pipeline;
use amalgam::domain::model::AmalgamationPlan;
use amalgam::infra::config::Config;

#[derive(Parser)]
#[command(name = "amalgam")]
#[command(
    author,
    version,
    about = "Merge header files into one amalgamation with include and pragma lines removed",
    long_about = None
)]
struct Cli {
    /// Extra configuration file applied after user and workspace config
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory input paths are resolved against (default: the executable's directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Keep the raw concatenation in memory instead of writing the intermediate file
    #[arg(long, global = true)]
    no_intermediate: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Concatenate inputs and write the filtered amalgamation (default)
    Build,
    /// Print the resolved inputs and outputs as JSON without touching any file
    Plan,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    amalgam::init(cli.verbose);

    match &cli.command {
        None | Some(Commands::Build) => {
            let plan = resolve_plan(&cli)?;
            let report = Pipeline::new(plan).run().inspect_err(|err| {
                if let Some(stage) = err.stage() {
                    tracing::debug!(stage = %stage, "pipeline aborted");
                }
            })?;
            tracing::info!(
                files = report.concat.files,
                bytes = report.concat.bytes,
                lines_kept = report.filter.lines_kept,
                lines_dropped = report.filter.lines_dropped(),
                "amalgamation complete"
            );
        }
        Some(Commands::Plan) => {
            let plan = resolve_plan(&cli)?;
            let json = serde_json::to_string_pretty(&plan).context("failed to serialize plan")?;
            println!("{json}");
        }
        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "amalgam", &mut io::stdout());
        }
    }

    Ok(())
}

fn resolve_plan(cli: &Cli) -> Result<AmalgamationPlan> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        config = config.with_base_dir(root.clone());
    }
    if cli.no_intermediate {
        config = config.with_keep_intermediate(false);
    }

    let cwd = env::current_dir().context("failed to resolve working directory")?;
    config.to_plan(&cwd)
}

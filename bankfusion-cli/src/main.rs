use anyhow::{Context, Result, bail};
use bankfusion_cli::batch::{self, run_batch};
use bankfusion_cli::config::{self, Config};
use bankfusion_cli::pipeline::Job;
use bankfusion_cli::{build_pipeline, logging, resolve_advisory_key};
use bankfusion_core::BankIdentity;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bankfusion",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BANKFUSION_BUILD_SHA"), ")"),
    about = "Normalize Indian bank statements into canonical JSON"
)]
struct Cli {
    /// Folder holding one sub-folder per bank (overrides config)
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,

    /// Where sidecar JSON files are written (overrides config)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Classify with rules only
    #[arg(long, global = true)]
    no_advisory: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every bank folder plus loose documents in the input dir
    All,

    /// Process one bank folder
    Bank {
        /// Folder name under the input dir, e.g. HDFC
        name: String,
    },

    /// Process a single document
    File {
        path: PathBuf,

        /// Bank hint (informational; detection still runs)
        #[arg(long)]
        bank: Option<String>,
    },

    /// Show bank folders and their documents
    List,

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.bankfusion/config.toml with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    logging::init_tracing(cfg.log_level.as_deref(), cli.json_logs);

    let input_dir = cli.input_dir.clone().unwrap_or_else(|| cfg.paths.input_dir.clone());
    let output_dir = cli.output_dir.clone().unwrap_or_else(|| cfg.paths.output_dir.clone());

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },

        Command::List => list(&input_dir)?,

        Command::All => {
            let jobs = batch::discover_all(&input_dir)?;
            process(&cfg, jobs, output_dir, cli.no_advisory).await?;
        }

        Command::Bank { name } => {
            let jobs = batch::discover_bank(&input_dir, &name)?;
            process(&cfg, jobs, output_dir, cli.no_advisory).await?;
        }

        Command::File { path, bank } => {
            if !path.is_file() {
                bail!("file not found: {}", path.display());
            }
            let hint = match bank {
                Some(b) => Some(b.parse::<BankIdentity>().map_err(anyhow::Error::msg)?),
                None => None,
            };
            process(&cfg, vec![Job::file(path, hint)], output_dir, cli.no_advisory).await?;
        }
    }

    Ok(())
}

async fn process(cfg: &Config, jobs: Vec<Job>, output_dir: PathBuf, no_advisory: bool) -> Result<()> {
    if jobs.is_empty() {
        println!("No documents found.");
        return Ok(());
    }
    let key = resolve_advisory_key(cfg, no_advisory)?;
    let pipeline = build_pipeline(cfg, output_dir, key)?;

    println!("Processing {} document(s)\n", jobs.len());
    let report = run_batch(&pipeline, jobs, cfg.batch.concurrency)
        .await
        .context("batch stopped")?;
    report.print_summary();
    Ok(())
}

fn list(input_dir: &std::path::Path) -> Result<()> {
    let folders = batch::bank_folders(input_dir)?;
    if folders.is_empty() {
        println!("No bank folders under {}", input_dir.display());
        return Ok(());
    }
    for (name, _) in folders {
        let jobs = batch::discover_bank(input_dir, &name)?;
        let known = match name.parse::<BankIdentity>() {
            Ok(bank) => bank.display_name().to_string(),
            Err(_) => "unrecognized name".to_string(),
        };
        println!("{name} ({known}): {} document(s)", jobs.len());
        for job in jobs {
            println!("  {}", job.path.display());
        }
    }
    Ok(())
}

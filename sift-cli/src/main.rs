use anyhow::{Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use sift_core::{CustomerMatcher, CustomerRecord};
use sift_ingest::load_directory;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod archives_cmd;
mod config;
mod recon_cmd;
mod search_cmd;
mod state;

use archives_cmd::SelectArgs;
use recon_cmd::{FilterArgs, RunArgs};

#[derive(Parser, Debug)]
#[command(
    name = "sift",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SIFT_BUILD_SHA"), ")"),
    about = "Statement archive coverage, merge and customer matching"
)]
struct Cli {
    /// Config file (default: ~/.sift/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<String>,

    /// -v for info, -vv for debug logs on stderr (RUST_LOG overrides)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick the archives to read for the reporting window
    Archives {
        /// Export directory holding the camt52v8 archives
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Select archives, read their extracted statements, match and merge
    Run(RunArgs),

    /// Rank customers by name similarity
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[arg(long)]
        customers: Option<PathBuf>,

        #[arg(long)]
        min_score: Option<u32>,

        /// Results to print (default: [matcher] limit in config)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Merge transaction CSVs: assign customer ids, drop duplicates, newest first
    Merge {
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long)]
        customers: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Transactions that first appear in the latest archive
    Newest {
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Combination of amounts (two or more) closest to a target
    Sums {
        #[arg(long, allow_negative_numbers = true)]
        target: f64,

        #[arg(required = true, num_args = 2.., allow_negative_numbers = true)]
        amounts: Vec<f64>,
    },

    /// Have archives arrived since the last processed run?
    Status {
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Record this moment as the last processed run
        #[arg(long)]
        touch: bool,
    },

    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,

    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(cli.config.as_deref()),
            ConfigCommand::Show => config::show_config(cli.config.as_deref()),
        };
    }

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Archives { dir, select } => {
            let today = state::resolve_today(cli.today.as_deref(), &cfg.coverage.timezone)?;
            archives_cmd::run_archives(&dir, &select, &cfg, today)?;
        }

        Command::Run(args) => {
            let today = state::resolve_today(cli.today.as_deref(), &cfg.coverage.timezone)?;
            let customers = match load_customers(args.customers.as_deref(), &cfg)? {
                Some(c) => c,
                None => {
                    tracing::warn!("no customer directory configured, customer ids stay unassigned");
                    Vec::new()
                }
            };
            recon_cmd::run_pipeline(&args, &customers, &cfg, today)?;
        }

        Command::Search {
            query,
            customers,
            min_score,
            limit,
        } => {
            let Some(customers) = load_customers(customers.as_deref(), &cfg)? else {
                bail!("no customer directory: pass --customers <file> or set [directory] path");
            };
            let mut scoring = cfg.matcher.scoring.clone();
            if let Some(min) = min_score {
                scoring.min_score = min;
            }
            let matcher = CustomerMatcher::new(scoring);
            search_cmd::run_search(
                &query.join(" "),
                &customers,
                &matcher,
                limit.unwrap_or(cfg.matcher.limit),
            );
        }

        Command::Merge {
            inputs,
            customers,
            filters,
            output,
        } => {
            let customers = load_customers(customers.as_deref(), &cfg)?;
            recon_cmd::run_merge(&inputs, customers.as_deref(), &filters, &cfg, output.as_deref())?;
        }

        Command::Newest { inputs, output } => {
            recon_cmd::run_newest(&inputs, output.as_deref())?;
        }

        Command::Sums { target, amounts } => {
            recon_cmd::run_sums(target, &amounts)?;
        }

        Command::Status { dir, touch } => {
            archives_cmd::run_status(&dir, touch)?;
        }

        // handled before the config is loaded
        Command::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// `--customers`, else the configured directory; `None` when neither is set.
fn load_customers(explicit: Option<&Path>, cfg: &config::Config) -> Result<Option<Vec<CustomerRecord>>> {
    let Some(path) = explicit.or(cfg.directory.path.as_deref()) else {
        return Ok(None);
    };
    let customers = load_directory(path, &cfg.directory.columns)?;
    Ok(Some(customers))
}

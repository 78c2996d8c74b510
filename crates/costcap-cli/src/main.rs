mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::coc::{CostOfCapitalArgs, EffectiveRatesArgs};
use commands::scenario::{DefaultsArgs, EvaluateArgs};

/// Cost of capital and effective tax rates by asset, industry and legal form
#[derive(Parser)]
#[command(
    name = "coc",
    version,
    about = "Cost of capital and effective tax rate calculations",
    long_about = "A CLI for computing the cost of capital, marginal effective tax rates \
                  (METR, METTR) and effective average tax rates (EATR) with decimal \
                  precision, for single investments or full asset-by-industry scenarios \
                  under static or forward-looking tax parameters."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Cost of capital for a single investment
    CostOfCapital(CostOfCapitalArgs),
    /// METR, METTR and EATR for a single investment
    EffectiveRates(EffectiveRatesArgs),
    /// Evaluate a scenario over the asset-by-industry grid for one or more years
    Evaluate(EvaluateArgs),
    /// Print the default economic parameters and model configuration
    Defaults(DefaultsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::CostOfCapital(args) => commands::coc::run_cost_of_capital(args),
        Commands::EffectiveRates(args) => commands::coc::run_effective_rates(args),
        Commands::Evaluate(args) => commands::scenario::run_evaluate(args),
        Commands::Defaults(args) => commands::scenario::run_defaults(args),
        Commands::Version => {
            println!("coc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let printed = result.and_then(|value| output::format_output(&cli.output, &value));
    if let Err(e) = printed {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }
}

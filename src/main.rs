//! Budgetcast main entry point

use anyhow::{anyhow, bail, Context};
use budgetcast_config::{AmountMode, CategoryCharset, Config, ConfigError};
use budgetcast_core::{CoreError, Ledger, PredictionState, SavingsProjection, SimulationError};
use budgetcast_parser::{year_from_file_name, CsvFile, LedgerParser, LogSink, RuleSet};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "budgetcast")]
#[command(author = "Budgetcast Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Validate yearly budget ledgers, report on them and simulate spending cuts", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "budgetcast.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Strictly validate a ledger
    Check {
        file: PathBuf,
        /// Ledger year; defaults to the year in a YYYY.csv file name
        #[arg(long)]
        year: Option<i32>,
        /// Override validation.amount_mode
        #[arg(long)]
        amount_mode: Option<AmountMode>,
        /// Override validation.category_charset
        #[arg(long)]
        charset: Option<CategoryCharset>,
    },
    /// Print the month-by-month report, or write it as CSV
    Report {
        file: PathBuf,
        #[arg(long)]
        year: Option<i32>,
        /// Write CSV instead, to the given path or report.output_file
        #[arg(long, num_args = 0..=1)]
        csv: Option<Option<PathBuf>>,
    },
    /// Show budget status and simulate one spending cut
    Predict {
        file: PathBuf,
        #[arg(long)]
        year: Option<i32>,
        /// Protected category, highest rank first (up to three)
        #[arg(long)]
        priority: Vec<String>,
        /// Cut spending on a category, as CATEGORY=AMOUNT
        #[arg(long, value_parser = parse_reduction)]
        reduce: Option<(String, Decimal)>,
        /// Categories that absorb any remainder, in order
        #[arg(long)]
        redirect: Vec<String>,
    },
    /// Print a default configuration file
    DefaultConfig,
}

fn parse_reduction(value: &str) -> Result<(String, Decimal), String> {
    let (category, amount) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=AMOUNT, got '{}'", value))?;
    let amount = Decimal::from_str(amount.trim()).map_err(|e| format!("invalid amount '{}': {}", amount, e))?;
    Ok((category.to_string(), amount))
}

/// A missing file falls back to defaults; any other problem is fatal
fn load_config(path: &Path) -> Result<(Config, Option<ConfigError>), CoreError> {
    match Config::load(path) {
        Ok(config) => Ok((config, None)),
        Err(e @ ConfigError::FileNotFound { .. }) => Ok((Config::default(), Some(e))),
        Err(e) => Err(e.into()),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Command::DefaultConfig = args.command {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (config, missing) = load_config(&args.config).map_err(core_failure)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();
    if let Some(e) = missing {
        log::debug!("{}, using defaults", e);
    }

    match args.command {
        Command::Check { file, year, amount_mode, charset } => {
            let mut rules = RuleSet::from(&config.validation);
            if let Some(mode) = amount_mode {
                rules.amount_mode = mode;
            }
            if let Some(charset) = charset {
                rules.category_charset = charset;
            }
            check(rules, &file, resolve_year(&file, year))
        }
        Command::Report { file, year, csv } => {
            let rules = RuleSet::from(&config.validation);
            let ledger = Ledger::load(rules, resolve_year(&file, year), &CsvFile::new(&file), &mut LogSink)
                .map_err(core_failure)?;
            let report = ledger
                .report()
                .ok_or_else(|| anyhow!("{} has no dated records; pass --year", file.display()))?;

            match csv {
                Some(out) => {
                    let out = out.unwrap_or_else(|| config.report.output_file.clone());
                    report.write_csv(&out).map_err(core_failure)?;
                    println!("wrote {}", out.display());
                }
                None => print!("{}", report.render_text(config.report.min_column_width)),
            }
            Ok(())
        }
        Command::Predict { file, year, priority, reduce, redirect } => {
            let rules = RuleSet::from(&config.validation);
            let ledger = Ledger::load(rules, resolve_year(&file, year), &CsvFile::new(&file), &mut LogSink)
                .map_err(core_failure)?;
            predict(PredictionState::from_ledger(&ledger, rules.amount_mode), &priority, reduce, &redirect)
        }
        Command::DefaultConfig => Ok(()),
    }
}

fn resolve_year(file: &Path, year: Option<i32>) -> Option<i32> {
    year.or_else(|| year_from_file_name(file))
}

fn core_failure(error: CoreError) -> anyhow::Error {
    anyhow!("{}", error.to_details())
}

fn check(rules: RuleSet, file: &Path, year: Option<i32>) -> anyhow::Result<()> {
    let year = year.with_context(|| format!("cannot tell the year of {}; pass --year", file.display()))?;
    let parser = LedgerParser::new(rules);

    match parser.check_ledger(year, &CsvFile::new(file), &mut LogSink) {
        Ok(records) => {
            println!("valid ({} records for {})", records, year);
            Ok(())
        }
        Err(e) => Err(core_failure(CoreError::from(e))),
    }
}

fn predict(
    mut state: PredictionState,
    priorities: &[String],
    reduce: Option<(String, Decimal)>,
    redirects: &[String],
) -> anyhow::Result<()> {
    for category in priorities {
        state.set_priority(category);
    }

    println!("status: {}", state.status());
    println!("income: {:.2}  expenses: {:.2}", state.total_income(), state.total_expenses());
    println!("headroom: {:.2}", state.headroom(None));
    println!("spend to tip into deficit: {:.2}", state.amount_to_tip_into_deficit()?);
    println!("cut to reach surplus: {:.2}", state.amount_to_reach_surplus()?);

    let Some((category, amount)) = reduce else {
        return Ok(());
    };

    let result = state.adjust_spending(&category, amount)?;
    if result.blocked {
        println!("'{}' is the top priority, nothing cut", category);
    } else {
        println!("cut {:.2} from '{}'", result.applied, category);
    }

    let mut projection = result.projection;
    for target in redirects {
        let Some(pending) = state.pending() else {
            break;
        };
        let remainder = pending.remainder;
        match state.resolve_remainder(target, remainder) {
            Ok(step) => {
                println!("cut {:.2} from '{}'", step.applied, target);
                projection = step.projection;
            }
            Err(e @ SimulationError::SameCategory { .. }) => log::warn!("{}", e),
            Err(e) => bail!(e),
        }
    }

    if let Some(pending) = state.pending() {
        println!("{:.2} could not be placed", pending.remainder);
        projection = Some(state.abandon_remainder()?);
    }

    if let Some(projection) = projection {
        print_projection(&projection);
    }
    Ok(())
}

fn print_projection(projection: &SavingsProjection) {
    println!();
    println!("{:<12} | {:>12} | {:>12} | {:>12}", "Category", "1 year", "2 years", "5 years");
    for c in &projection.breakdown {
        println!("{:<12} | {:>12.2} | {:>12.2} | {:>12.2}", c.category, c.annual, c.two_year, c.five_year);
    }
    println!(
        "{:<12} | {:>12.2} | {:>12.2} | {:>12.2}",
        "Savings", projection.annual, projection.two_year, projection.five_year
    );
}

//! repair-sim CLI.
//!
//! Commands:
//! - `parts`   : list the part catalog
//! - `assemble`: buy parts by id and merge them in order
//! - `report`  : per-period activity statistics
//! - `config`  : print the effective configuration

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use repair_sim::{
    render_table, to_json, write_csv, ActivityAggregator, ActivityLog, AppConfig, CostDisplay,
    CostHistory, ComponentId, Granularity, OptimalSort, PartCatalog, RepairProcess, RepairSession,
    ReportSummary,
};
use repair_sim::config::CONFIG_ENV_VAR;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "repair-sim",
    about = "Mouse repair simulator: assemble parts and review repair activity",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./repair-sim.toml)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog parts, optionally for one category
    Parts {
        #[arg(long)]
        category: Option<String>,
    },

    /// Buy the given parts and merge them left to right
    Assemble {
        #[arg(required = true)]
        part_ids: Vec<i64>,
    },

    /// Aggregate the activity log by period
    Report {
        /// daily, weekly, monthly, quarterly or yearly
        #[arg(short, long)]
        granularity: Option<String>,

        /// Activity CSV to read instead of the configured source
        #[arg(long)]
        input: Option<PathBuf>,

        /// Also write the rows to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Parts { category } => run_parts(&config, category.as_deref()),
        Commands::Assemble { part_ids } => run_assemble(&config, &part_ids),
        Commands::Report {
            granularity,
            input,
            csv,
            json,
        } => run_report(&config, granularity.as_deref(), input, csv, json),
        Commands::Config => {
            print!("{}", config.to_toml());
            Ok(())
        }
    }
}

fn open_catalog(config: &AppConfig) -> Result<PartCatalog> {
    let catalog = match &config.catalog.csv_path {
        Some(path) => PartCatalog::from_csv(path)
            .with_context(|| format!("Failed to load parts from {}", path.display()))?,
        None => PartCatalog::with_defaults().context("Failed to build default catalog")?,
    };
    Ok(catalog)
}

fn run_parts(config: &AppConfig, category: Option<&str>) -> Result<()> {
    let catalog = open_catalog(config)?;

    let parts = match category {
        Some(c) => catalog.parts_in_category(c, &OptimalSort)?,
        None => catalog.all_parts()?,
    };

    println!("🖱️  Parts ({})", category.unwrap_or("all"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for part in &parts {
        println!(
            "{:>3}  {:<16} lifespan {:>6} h  price {:>7.2} {}",
            part.id, part.name, part.lifespan, part.price, config.currency
        );
    }
    if parts.is_empty() {
        println!("(no parts)");
    }

    Ok(())
}

fn run_assemble(config: &AppConfig, part_ids: &[i64]) -> Result<()> {
    let catalog = open_catalog(config)?;
    let mut session = RepairSession::new(&catalog, config.required_sequence.clone());

    let display = Arc::new(CostDisplay::new(&config.currency));
    let history = Arc::new(CostHistory::new());
    session.process_mut().register(display.clone());
    session.process_mut().register(history.clone());

    println!("🔧 Required order: {}", config.required_sequence.join(" > "));

    let mut picked = Vec::with_capacity(part_ids.len());
    for &id in part_ids {
        let component = session
            .select_part(id)
            .with_context(|| format!("Cannot buy part {}", id))?;
        picked.push(component);
        println!("  + part {:<3} → {}", id, display.label());
    }

    let process = session.process_mut();
    let current = match merge_in_order(process, &picked, &display) {
        Ok(id) => id,
        Err(e) => {
            println!("\n{}", display.label());
            return Err(e);
        }
    };

    match process.completed_assembly() {
        Some(done) => println!(
            "\n🎉 Mouse complete! {}\n   Total cost: {:.2} {}",
            done.label(),
            process.total_cost(),
            config.currency
        ),
        None => println!(
            "\n⏳ Assembly incomplete ({} of {} parts). {}",
            process.component(current).map_or(0, |c| c.len()),
            process.required_sequence().len(),
            display.label()
        ),
    }
    tracing::debug!(history = ?history.values(), "Cost timeline");

    Ok(())
}

/// Merge the picked components left to right, returning the final one.
fn merge_in_order(
    process: &mut RepairProcess,
    picked: &[ComponentId],
    display: &CostDisplay,
) -> Result<ComponentId> {
    let (&first, rest) = picked.split_first().context("No parts selected")?;
    let mut current = first;
    for &next in rest {
        let merged = process
            .merge(current, next)
            .with_context(|| format!("Cannot merge {} into {}", next, current))?;
        println!("  ✓ merged: {}  → {}", merged.label(), display.label());
        current = merged.id();
    }
    Ok(current)
}

fn run_report(
    config: &AppConfig,
    granularity: Option<&str>,
    input: Option<PathBuf>,
    csv_out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let granularity: Granularity = match granularity {
        Some(g) => g.parse()?,
        None => config.granularity()?,
    };

    let log = match input.as_ref().or(config.activity.csv_path.as_ref()) {
        Some(path) => ActivityLog::from_csv(path)
            .with_context(|| format!("Failed to load activity from {}", path.display()))?,
        None => {
            let mut rng = match config.activity.rng_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let today = Local::now().date_naive();
            ActivityLog::seeded(config.activity.seed_records, &mut rng, today)
                .context("Failed to seed activity log")?
        }
    };

    let records = log.all_records()?;
    let rows = ActivityAggregator::aggregate(&records, granularity);

    if json {
        println!("{}", to_json(&rows)?);
    } else {
        println!("📊 Activity report ({})", granularity);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        print!("{}", render_table(&rows));
        println!("\n{}", ReportSummary::from_rows(granularity, &rows).summary());
    }

    if let Some(path) = csv_out {
        write_csv(&rows, &path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("✓ Report saved to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use repair_sim::{default_required_sequence, AssemblyError, Part};

    fn create_test_process() -> (RepairProcess, Vec<ComponentId>) {
        let mut process = RepairProcess::new(default_required_sequence());
        let sensor = process.add_part(Part::new(2, "Sensor", 3000, 15.0, "sensor.png"));
        let body = process.add_part(Part::new(1, "Body", 5000, 20.0, "body.png"));
        (process, vec![sensor, body])
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_flag_reads_env_var() {
        let cmd = Cli::command();
        let config = cmd
            .get_arguments()
            .find(|a| a.get_id() == "config")
            .unwrap();
        assert_eq!(config.get_env(), Some(std::ffi::OsStr::new(CONFIG_ENV_VAR)));

        let cli = Cli::try_parse_from(["repair-sim", "--config", "custom.toml", "config"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_merge_in_order_propagates_assembly_errors() {
        let (mut process, picked) = create_test_process();
        let display = CostDisplay::new("TL");

        let err = merge_in_order(&mut process, &picked, &display).unwrap_err();

        assert!(err.to_string().starts_with("Cannot merge"));
        assert!(matches!(
            err.downcast_ref::<AssemblyError>(),
            Some(AssemblyError::SequenceMismatch { position: 0, .. })
        ));
        assert_eq!(process.components().len(), 2);
    }

    #[test]
    fn test_merge_in_order_returns_final_component() {
        let (mut process, mut picked) = create_test_process();
        picked.reverse();
        let display = CostDisplay::new("TL");

        let id = merge_in_order(&mut process, &picked, &display).unwrap();

        assert_eq!(process.component(id).map(|c| c.len()), Some(2));
        assert_eq!(process.total_cost(), 35.0);
        assert!(merge_in_order(&mut process, &[], &display).is_err());
    }
}

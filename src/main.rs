use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use landfill_sdss::allocation::engine::AllocationEngine;
use landfill_sdss::allocation::{AllocationResult, AllocationState};
use landfill_sdss::config::{AllocationMode, Config, ConfigOverrides};
use landfill_sdss::hazard::ej::{ej_index, EjSiteMeasure};
use landfill_sdss::hazard::fractions::hazard_report;
use landfill_sdss::hazard::LayerMeasure;
use landfill_sdss::output::csv::{allocation_to_csv, phases_to_csv, rank_to_csv};
use landfill_sdss::output::json::render_json;
use landfill_sdss::output::table::{
    render_allocation_table, render_cost_table, render_ej_table, render_hazard_table,
    render_phase_tables, render_rank_table,
};
use landfill_sdss::phases::planner::{auto_durations, phase_reports, plan};
use landfill_sdss::phases::PhaseReport;
use landfill_sdss::scenario::{run_external, Scenario};
use landfill_sdss::scoring::cost::cost_index;
use landfill_sdss::scoring::feasibility::{rank_dynamic, rank_static};
use landfill_sdss::scoring::weights::WeightVector;
use landfill_sdss::scoring::SiteScore;
use landfill_sdss::server::run_server;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "landfill-sdss",
    about = "Feasibility scoring and tonnage allocation for landfill expansion siting"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    catalog: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(short, long)]
    threshold: Option<f64>,
    #[command(flatten)]
    weights: WeightArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct WeightArgs {
    #[arg(long = "cost-weight")]
    cost: Option<f64>,
    #[arg(long = "capacity-weight")]
    capacity: Option<f64>,
    #[arg(long = "risk-weight")]
    risk: Option<f64>,
    #[arg(long = "ej-weight")]
    ej: Option<f64>,
}

impl WeightArgs {
    fn apply(&self, mut base: WeightVector) -> WeightVector {
        if let Some(v) = self.cost {
            base.cost = v;
        }
        if let Some(v) = self.capacity {
            base.capacity = v;
        }
        if let Some(v) = self.risk {
            base.risk = v;
        }
        if let Some(v) = self.ej {
            base.ej = v;
        }
        base
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rank every catalog site by static feasibility.
    Rank {
        /// Rank only the assigned sites with the dynamic capacity score.
        #[arg(long = "assign", value_name = "SITE=TPD")]
        assign: Vec<String>,
    },
    /// Validate a tonnage allocation against capacity, eligibility, and the
    /// total policy.
    Allocate {
        #[arg(long = "assign", value_name = "SITE=TPD", required = true)]
        assign: Vec<String>,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long = "total")]
        total_tpd: Option<u32>,
    },
    /// Split an allocation across sequential phases and price each phase.
    Phases {
        #[arg(long = "assign", value_name = "SITE=TPD", required = true)]
        assign: Vec<String>,
        #[arg(long)]
        horizon: u32,
        /// Comma-separated explicit durations, e.g. "5,15".
        #[arg(long)]
        durations: Option<String>,
        #[arg(long = "n-phases")]
        n_phases: Option<usize>,
    },
    /// Hazard-layer overlap fractions and composite hydro risk from a
    /// measurements JSON file.
    Hazard {
        input: PathBuf,
    },
    /// EJ composite index from a site-measurements JSON file.
    Ej {
        input: PathBuf,
    },
    /// Transport-cost index across the catalog.
    Cost,
    Scenario {
        #[command(subcommand)]
        action: ScenarioAction,
    },
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3001)]
        port: u16,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ScenarioAction {
    /// Write the baseline example scenario to the configured path.
    Init {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    Show {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Hand the scenario file to the external processing command.
    Run {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        catalog_path: cli.catalog.clone(),
        feasibility_threshold: cli.threshold,
        allocation_mode: None,
        total_tpd: None,
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    let catalog = config.load_catalog()?;
    let weights = cli.weights.apply(config.weights);
    let threshold = config.analysis.feasibility_threshold;

    match &cli.command {
        Commands::Rank { assign } => {
            let scores = if assign.is_empty() {
                rank_static(&catalog, &weights)?
            } else {
                let assignments = parse_assignments(assign)?;
                rank_dynamic(&catalog, &weights, &assignments)?
            };
            print_rank(&scores, threshold, cli.output)?;
        }
        Commands::Allocate {
            assign,
            mode,
            total_tpd,
        } => {
            let mut allocation = config.allocation.clone();
            if let Some(mode) = mode {
                allocation.mode = parse_allocation_mode(mode)?;
            }
            if let Some(total) = total_tpd {
                allocation.total_tpd = *total;
            }
            let engine = AllocationEngine::new(&catalog, &weights, threshold, allocation.policy())?;
            let requests = parse_assignments(assign)?;
            let result = engine.allocate(&AllocationState::new(), &requests)?;
            print_allocation(&result, cli.output)?;
        }
        Commands::Phases {
            assign,
            horizon,
            durations,
            n_phases,
        } => {
            let requests = parse_assignments(assign)?;
            let state = AllocationState::with_assignments(requests);
            let min_horizon = catalog
                .min_service_horizon_of(state.selected_sites())
                .unwrap_or_else(|| catalog.min_service_horizon());
            let durations = match (durations, n_phases) {
                (Some(raw), _) => parse_durations(raw)?,
                (None, Some(n)) => auto_durations(*horizon, *n, min_horizon)?,
                (None, None) => {
                    return Err(anyhow!("either --durations or --n-phases is required"));
                }
            };
            let plan = plan(*horizon, &durations, min_horizon)?;
            let reports = phase_reports(&catalog, &state, &plan)?;
            print_phases(&reports, cli.output)?;
        }
        Commands::Hazard { input } => {
            let layers: Vec<LayerMeasure> = read_json(input)?;
            let report = hazard_report(&layers)?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_hazard_table(&report)),
                OutputFormat::Json => println!("{}", render_json(&report)?),
                OutputFormat::Csv => {
                    warn!("CSV output for hazard not implemented, using JSON");
                    println!("{}", render_json(&report)?);
                }
            }
        }
        Commands::Ej { input } => {
            let measures: Vec<EjSiteMeasure> = read_json(input)?;
            let scores = ej_index(&measures, &config.ej)?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_ej_table(&scores)),
                OutputFormat::Json => println!("{}", render_json(&scores)?),
                OutputFormat::Csv => {
                    warn!("CSV output for ej not implemented, using JSON");
                    println!("{}", render_json(&scores)?);
                }
            }
        }
        Commands::Cost => {
            let scores = cost_index(&catalog, &config.cost)?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_cost_table(&scores)),
                OutputFormat::Json => println!("{}", render_json(&scores)?),
                OutputFormat::Csv => {
                    warn!("CSV output for cost not implemented, using JSON");
                    println!("{}", render_json(&scores)?);
                }
            }
        }
        Commands::Scenario { action } => {
            handle_scenario_command(action, &config)?;
        }
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn handle_scenario_command(action: &ScenarioAction, config: &Config) -> Result<()> {
    let configured = PathBuf::from(&config.scenario.output_path);
    match action {
        ScenarioAction::Init { path } => {
            let path = path.clone().unwrap_or(configured);
            Scenario::example().save(&path)?;
        }
        ScenarioAction::Show { path } => {
            let path = path.clone().unwrap_or(configured);
            let scenario = Scenario::load(&path)?;
            println!("{}", render_json(&scenario)?);
        }
        ScenarioAction::Run { path } => {
            let path = path.clone().unwrap_or(configured);
            if config.scenario.runner.is_empty() {
                return Err(anyhow!("no scenario runner configured"));
            }
            let outcome = run_external(&path, &config.scenario.runner)?;
            if outcome.passed {
                info!("scenario processing passed");
            }
            println!("{}", render_json(&outcome)?);
        }
    }
    Ok(())
}

fn parse_assignments(raw: &[String]) -> Result<BTreeMap<String, u32>> {
    let mut out = BTreeMap::new();
    for piece in raw.iter().flat_map(|entry| entry.split(',')) {
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (site, tpd) = trimmed
            .split_once('=')
            .ok_or_else(|| anyhow!("expected SITE=TPD, got: {trimmed}"))?;
        let tpd: u32 = tpd
            .trim()
            .parse()
            .map_err(|e| anyhow!("bad tonnage for {site}: {e}"))?;
        out.insert(site.trim().to_string(), tpd);
    }
    if out.is_empty() {
        return Err(anyhow!("assignment list is empty"));
    }
    Ok(out)
}

fn parse_durations(raw: &str) -> Result<Vec<u32>> {
    let mut out = Vec::new();
    for piece in raw.split(',') {
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.push(
            trimmed
                .parse()
                .map_err(|e| anyhow!("bad phase duration {trimmed}: {e}"))?,
        );
    }
    if out.is_empty() {
        return Err(anyhow!("duration list is empty"));
    }
    Ok(out)
}

fn parse_allocation_mode(raw: &str) -> Result<AllocationMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "at_least" | "at-least" | "min" => Ok(AllocationMode::AtLeast),
        "exact" | "exactly" => Ok(AllocationMode::Exact),
        other => Err(anyhow!("unknown allocation mode: {other}")),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed reading {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| anyhow!("failed parsing {}: {e}", path.display()))
}

fn print_rank(scores: &[SiteScore], threshold: f64, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_rank_table(scores, threshold)),
        OutputFormat::Json => println!("{}", render_json(scores)?),
        OutputFormat::Csv => println!("{}", rank_to_csv(scores, threshold)?),
    }
    Ok(())
}

fn print_allocation(result: &AllocationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_allocation_table(result)),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => println!("{}", allocation_to_csv(result)?),
    }
    Ok(())
}

fn print_phases(reports: &[PhaseReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_phase_tables(reports)),
        OutputFormat::Json => println!("{}", render_json(reports)?),
        OutputFormat::Csv => println!("{}", phases_to_csv(reports)?),
    }
    Ok(())
}

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use blastradius::assurance::{AssuranceState, EdgeField};
use blastradius::catalog::AssetCatalog;
use blastradius::client::UpstreamClient;
use blastradius::config::AppConfig;
use blastradius::error::Fetched;
use blastradius::narrative::{HeaderNarrativeParser, NarrativeParser, NarrativeSections};
use blastradius::report;
use blastradius::simulation::{Completion, SimulationController, Telemetry};

#[derive(Parser)]
#[command(
    name = "blastradius",
    about = "Business impact analysis for infrastructure asset failures",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (overrides BLASTRADIUS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server
    Serve {
        /// Bind address (defaults to server.bind from config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// List infrastructure assets known to the upstream service
    Servers,

    /// Show applications, processes and services affected by an asset failure
    Impact {
        asset: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Compute the assurance score, optionally with what-if adjustments
    Assurance {
        asset: String,

        /// Adjust a dependency before scoring: EDGE.FIELD=VALUE (repeatable)
        #[arg(long = "set", value_name = "EDGE.FIELD=VALUE", value_parser = parse_adjustment)]
        adjustments: Vec<Adjustment>,

        #[arg(long)]
        json: bool,
    },

    /// Trigger the live failure scenario for an asset
    Simulate {
        asset: String,

        /// Reset the scenario afterwards and show the baseline
        #[arg(long)]
        reset: bool,

        #[arg(long)]
        json: bool,
    },

    /// Full incident report: impact, severity, metadata and narrative
    Report {
        asset: String,

        #[arg(long)]
        json: bool,
    },

    /// Split an incident narrative into report sections (reads stdin by default)
    ParseNarrative {
        /// Read the narrative from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone)]
struct Adjustment {
    edge: String,
    field: EdgeField,
    value: f64,
}

fn parse_adjustment(raw: &str) -> Result<Adjustment, String> {
    let (target, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected EDGE.FIELD=VALUE, got '{}'", raw))?;
    let (edge, field) = target
        .rsplit_once('.')
        .ok_or_else(|| format!("expected EDGE.FIELD=VALUE, got '{}'", raw))?;
    let field = field.parse::<EdgeField>().map_err(|e| e.to_string())?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value '{}': {}", value, e))?;
    Ok(Adjustment {
        edge: edge.to_string(),
        field,
        value,
    })
}

fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // The configured subscriber depends on the config, so config loading logs
    // through a stderr bootstrap subscriber.
    let config = tracing::subscriber::with_default(bootstrap_subscriber(), || {
        AppConfig::resolve(cli.config.as_deref())
    })?;
    init_tracing(&config);

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            tracing::info!(%bind, "Starting blastradius API");
            blastradius::serve(&config, &bind).await?;
        }
        Commands::Servers => {
            let client = UpstreamClient::new(&config.upstream)?;
            match report::servers(&client).await {
                Fetched::Data(list) => {
                    for name in list {
                        println!("{}", name);
                    }
                }
                Fetched::Empty => println!("No assets found."),
                Fetched::Failed(msg) => println!("Error: {}", msg),
            }
        }
        Commands::Impact { asset, json } => {
            let client = UpstreamClient::new(&config.upstream)?;
            match report::assess(&client, &asset).await {
                Fetched::Data(a) if json => println!("{}", serde_json::to_string_pretty(&a)?),
                Fetched::Data(a) => {
                    println!("\n=== Blast Radius: {} ===", a.asset);
                    print_list("Applications", &a.impact.applications);
                    print_list("Processes", &a.impact.processes);
                    print_list("Business Services", &a.impact.services);
                    println!("\nSeverity: {} (score {})", a.severity.level, a.severity.score);
                    for reason in &a.severity.reasons {
                        println!(" - {}", reason);
                    }
                    println!();
                }
                Fetched::Empty => println!("No data: nothing depends on '{}'.", asset),
                Fetched::Failed(msg) => println!("Error: {}", msg),
            }
        }
        Commands::Assurance {
            asset,
            adjustments,
            json,
        } => {
            let client = UpstreamClient::new(&config.upstream)?;
            let mut model = match report::load_assurance(&client, &asset).await {
                Fetched::Data(model) => model,
                Fetched::Empty => {
                    println!("No data: '{}' has no scored dependencies.", asset);
                    return Ok(());
                }
                Fetched::Failed(msg) => {
                    println!("Error: {}", msg);
                    return Ok(());
                }
            };
            for adj in &adjustments {
                model
                    .update_by_name(&adj.edge, adj.field, adj.value)
                    .with_context(|| format!("cannot apply {}.{}", adj.edge, adj.field))?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(model.state())?);
            } else {
                print_assurance(&asset, model.state());
            }
        }
        Commands::Simulate { asset, reset, json } => {
            let client = UpstreamClient::new(&config.upstream)?;
            let mut controller = SimulationController::new();
            let outcome = controller.trigger(&client, &asset).await;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "state": controller.state(),
                        "telemetry": controller.telemetry(),
                    }))?
                );
            } else {
                if outcome == Some(Completion::Failed) {
                    println!("Simulation failed; showing degraded status.");
                }
                print_telemetry(&asset, controller.telemetry());
            }
            if reset && controller.reset() {
                if json {
                    println!("{}", serde_json::to_string_pretty(controller.telemetry())?);
                } else {
                    println!("Scenario reset.");
                    print_telemetry(&asset, controller.telemetry());
                }
            }
        }
        Commands::Report { asset, json } => {
            let client = UpstreamClient::new(&config.upstream)?;
            let catalog = AssetCatalog::new(config.assets.clone());
            match report::incident_report(&client, &HeaderNarrativeParser, &catalog, &asset).await {
                Fetched::Data(r) if json => println!("{}", serde_json::to_string_pretty(&r)?),
                Fetched::Data(r) => {
                    println!("\n=== Incident Report: {} ===", r.asset);
                    if let Some(meta) = &r.metadata {
                        println!("IP: {}  Location: {}  Type: {}", meta.ip, meta.location, meta.kind);
                    }
                    println!("Severity: {} (score {})", r.severity.level, r.severity.score);
                    print_list("Applications", &r.impact.applications);
                    print_list("Processes", &r.impact.processes);
                    print_list("Business Services", &r.impact.services);
                    print_sections(&r.narrative);
                }
                Fetched::Empty => println!("No data for '{}'.", asset),
                Fetched::Failed(msg) => println!("Error: {}", msg),
            }
        }
        Commands::ParseNarrative { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read narrative from stdin")?;
                    buf
                }
            };
            let sections = HeaderNarrativeParser.parse(&text);
            println!("{}", serde_json::to_string_pretty(&sections)?);
        }
    }

    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    println!("\n{} ({}):", title, items.len());
    for item in items {
        println!(" - {}", item);
    }
}

fn print_assurance(asset: &str, state: &AssuranceState) {
    println!("\n=== Service Assurance: {} ===", asset);
    println!("{:<30} | {:>5} | {:>6} | {:>5} | {:>6}", "Dependency", "C", "Health", "Red.", "Impact");
    println!("{:-<30}-|-{:-<5}-|-{:-<6}-|-{:-<5}-|-{:-<6}", "", "", "", "", "");
    for e in &state.edges {
        println!(
            "{:<30} | {:>5.1} | {:>6.2} | {:>5.2} | {:>6.1}",
            e.name,
            e.criticality,
            e.health,
            e.redundancy,
            e.impact()
        );
    }
    println!("\nScore: {}% ({})\n", state.score, state.status);
}

fn print_telemetry(asset: &str, t: &Telemetry) {
    println!("\n=== Live Scenario: {} ===", asset);
    println!("System status:       {}", t.system_status);
    println!("Financial risk / hr: ${}M", t.financial_risk);
    println!("Regulatory impact:   {}", t.reg_impact);
    if !t.services.is_empty() {
        println!("\n{:<30} | {:<8} | {:>9} | Root cause", "Service", "Status", "Assurance");
        for s in &t.services {
            let status = if s.affected { "Down" } else { "Active" };
            println!(
                "{:<30} | {:<8} | {:>8.0}% | {}",
                s.name,
                status,
                s.assurance_score * 100.0,
                s.root_cause.as_deref().unwrap_or("-")
            );
        }
    }
    println!("\nPayment volume (TPS):");
    for p in &t.tps_data {
        println!("  {} {}", p.time, p.value);
    }
    if !t.propagation_chain.is_empty() {
        println!("\nPropagation:");
        for step in &t.propagation_chain {
            println!("  {}", step);
        }
    }
    println!();
}

fn print_sections(s: &NarrativeSections) {
    println!("\nAffected Systems:     {}", s.affected);
    println!("Business Impact:      {}", s.impact);
    println!("Responsible Team:     {}", s.team);
    println!("Estimated Resolution: {}", s.time);
    println!("Reassurance:          {}\n", s.reassurance);
}

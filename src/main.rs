use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use depscanner_core::api::{DependencyGraph, OsvAdvisory};
use depscanner_core::cvss::{self, Severity};
use depscanner_core::graph::GraphData;
use depscanner_core::graph::simulation::{Simulation, SimulationConfig};
use depscanner_core::reports;
use depscanner_core::table::{self, SortDirection, TableState};

#[derive(Parser)]
#[command(name = "depscanner-core")]
#[command(about = "Analysis and visualization core for DepScanner", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the CVSS v3.1 base score for a vector string
    Score {
        /// CVSS vector, e.g. CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H
        #[arg(short, long)]
        vector: String,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Sort, filter and paginate a dependency listing
    Table {
        /// Path to a dependency-graph JSON document (backend response shape)
        #[arg(short, long)]
        file: PathBuf,

        /// Column path to sort by, e.g. versionKey.name
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort direction: asc or desc
        #[arg(short, long, default_value = "asc")]
        direction: String,

        /// Case-insensitive search term
        #[arg(long, default_value = "")]
        search: String,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Records per page
        #[arg(long, default_value = "5")]
        page_size: usize,
    },
    /// Run the force layout to rest and print node positions
    Layout {
        /// Path to a dependency-graph JSON document (backend response shape)
        #[arg(short, long)]
        file: PathBuf,

        /// Canvas width
        #[arg(long, default_value = "3800")]
        width: f64,

        /// Canvas height
        #[arg(long, default_value = "1800")]
        height: f64,

        /// Tick budget before giving up on settling
        #[arg(long, default_value = "1000")]
        max_ticks: usize,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Score a set of OSV advisories and render a report
    Report {
        /// Path to a JSON array of OSV advisories
        #[arg(short, long)]
        file: PathBuf,

        /// Output format: json, markdown, or summary
        #[arg(short, long, default_value = "summary")]
        output: String,

        /// Minimum severity level to report (none, low, moderate, high, critical)
        #[arg(short, long, default_value = "none")]
        min_severity: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Score { vector, json } => run_score(&vector, json),
        Commands::Table {
            file,
            sort,
            direction,
            search,
            page,
            page_size,
        } => run_table(file, sort, &direction, search, page, page_size).await,
        Commands::Layout {
            file,
            width,
            height,
            max_ticks,
            json,
        } => run_layout(file, width, height, max_ticks, json).await,
        Commands::Report {
            file,
            output,
            min_severity,
        } => run_report(file, &output, &min_severity).await,
    }
}

fn run_score(vector: &str, json: bool) -> ExitCode {
    match cvss::compute_base_score(vector) {
        Ok(score) => {
            if json {
                match serde_json::to_string_pretty(&score) {
                    Ok(out) => println!("{out}"),
                    Err(e) => eprintln!("Failed to serialize score: {e}"),
                }
            } else {
                println!("{} {}", score.score, score.severity.as_str());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error parsing vector: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_table(
    file: PathBuf,
    sort: Option<String>,
    direction: &str,
    search: String,
    page: usize,
    page_size: usize,
) -> ExitCode {
    let graph = match read_graph(&file).await {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error reading {}: {e}", file.display());
            return ExitCode::FAILURE;
        }
    };

    let records: Vec<serde_json::Value> = graph
        .dependency
        .iter()
        .filter_map(|dependency| serde_json::to_value(dependency).ok())
        .collect();

    let state = TableState {
        search,
        order_by: sort,
        direction: if direction.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
        page,
        page_size,
    };

    // Page totals reflect the filtered listing, not the raw record count
    let filtered = table::filter_records(records, &state.search);
    let total = filtered.len();
    let rows = table::apply(filtered, &state);

    println!(
        "Page {}/{} ({} dependencies)",
        state.page,
        table::page_count(total, state.page_size),
        total
    );
    for row in &rows {
        println!(
            "  {} {} ({})",
            row["versionKey"]["name"].as_str().unwrap_or(""),
            row["versionKey"]["version"].as_str().unwrap_or(""),
            row["relation"].as_str().unwrap_or("")
        );
    }

    ExitCode::SUCCESS
}

async fn run_layout(
    file: PathBuf,
    width: f64,
    height: f64,
    max_ticks: usize,
    json: bool,
) -> ExitCode {
    let graph = match read_graph(&file).await {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error reading {}: {e}", file.display());
            return ExitCode::FAILURE;
        }
    };

    // Dangling edges are dropped (and warned about) rather than fatal
    let (data, errors) = GraphData::from_response(&graph);
    if !errors.is_empty() {
        eprintln!("Dropped {} invalid edge(s)", errors.len());
    }

    let config = SimulationConfig {
        width,
        height,
        ..SimulationConfig::default()
    };
    let mut simulation = Simulation::new(data, config);
    let ticks = simulation.run_until_settled(max_ticks);

    tracing::info!(
        ticks,
        settled = simulation.settled(),
        "layout simulation finished"
    );

    if json {
        let positions: Vec<serde_json::Value> = simulation
            .nodes()
            .iter()
            .map(|node| {
                serde_json::json!({
                    "id": node.id,
                    "x": node.x,
                    "y": node.y,
                    "pinned": node.is_pinned(),
                })
            })
            .collect();
        match serde_json::to_string_pretty(&positions) {
            Ok(out) => println!("{out}"),
            Err(e) => eprintln!("Failed to serialize positions: {e}"),
        }
    } else {
        for node in simulation.nodes() {
            println!("  {:<40} ({:>8.1}, {:>8.1})", node.id, node.x, node.y);
        }
    }

    ExitCode::SUCCESS
}

async fn run_report(file: PathBuf, output: &str, min_severity: &str) -> ExitCode {
    let content = match tokio::fs::read_to_string(&file).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let advisories: Vec<OsvAdvisory> = match serde_json::from_str(&content) {
        Ok(advisories) => advisories,
        Err(e) => {
            eprintln!("Error decoding advisories: {e}");
            return ExitCode::FAILURE;
        }
    };

    let subject = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("advisories")
        .to_string();
    let scored = reports::score_advisories(&advisories, Severity::from_str_loose(min_severity));

    match output {
        "json" => {
            let report = reports::generate_json_report(&subject, &scored);
            match serde_json::to_string_pretty(&report) {
                Ok(out) => println!("{out}"),
                Err(e) => eprintln!("Failed to serialize report: {e}"),
            }
        }
        "markdown" => println!("{}", reports::generate_markdown_report(&subject, &scored)),
        _ => println!("{}", reports::generate_summary_report(&subject, &scored)),
    }

    ExitCode::SUCCESS
}

async fn read_graph(file: &Path) -> anyhow::Result<DependencyGraph> {
    let content = tokio::fs::read_to_string(file).await?;
    Ok(serde_json::from_str(&content)?)
}

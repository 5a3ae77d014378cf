mod io;
mod provenance;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mwcs::api::{PreprocessLevel, Solution, Solver, SolverCfg, Strategy};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

use io::{Format, Loaded, Source, StatsRow};
use provenance::{current_git_rev, write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Maximum-weight connected subgraph solver")]
struct Cmd {
    /// Log verbosity: 0 warn, 1 info, 2 debug, 3+ trace
    #[arg(long, global = true, default_value_t = 1)]
    log: u8,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Solve an instance and write `.out` files next to the inputs
    Solve(SolveArgs),
    /// Print a small provenance JSON block
    Report,
}

#[derive(Args, Debug, Serialize)]
struct SolveArgs {
    /// Vertex file
    #[arg(long)]
    nodes: PathBuf,
    /// Edge file
    #[arg(long)]
    edges: PathBuf,
    /// Signal file (signal weighting only)
    #[arg(long)]
    signals: Option<PathBuf>,
    /// Input format; defaults to sgmwcs when a signal file is given
    #[arg(long = "type", value_enum)]
    #[serde(skip)]
    format: Option<Format>,
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Global time limit in seconds
    #[arg(long)]
    timelimit: Option<f64>,
    /// Components at least this big are split
    #[arg(long, default_value_t = 25)]
    threshold: usize,
    /// Edge penalty for the minimisation pass (0 disables it)
    #[arg(long, default_value_t = 0.0)]
    epsilon: f64,
    /// 0 off, 1 local rules, 2 full
    #[arg(long, default_value_t = 2)]
    preprocessing: u8,
    #[arg(long)]
    heuristic_only: bool,
    /// Biggest-block decomposition (plain weights only)
    #[arg(long)]
    bicomponent: bool,
    /// Append a row to this statistics TSV
    #[arg(long)]
    stats: Option<PathBuf>,
}

impl SolveArgs {
    fn solver_cfg(&self) -> Result<SolverCfg> {
        let time_limit = match self.timelimit {
            None => None,
            Some(secs) if secs.is_finite() && secs >= 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(secs) => bail!("time limit must be a non-negative number of seconds, got {secs}"),
        };
        Ok(SolverCfg {
            threads: self.threads,
            time_limit,
            split_threshold: self.threshold,
            preprocess_level: PreprocessLevel::from_level(self.preprocessing)?,
            epsilon: self.epsilon,
            heuristic_only: self.heuristic_only,
            strategy: if self.bicomponent {
                Strategy::Bicomponent
            } else {
                Strategy::Cutpoints
            },
            ..SolverCfg::default()
        })
    }

    fn format(&self) -> Format {
        self.format.unwrap_or(if self.signals.is_some() {
            Format::Sgmwcs
        } else {
            Format::Gmwcs
        })
    }

    fn load(&self) -> Result<Loaded> {
        let nodes = Source::read(&self.nodes)?;
        let edges = Source::read(&self.edges)?;
        match (self.format(), &self.signals) {
            (Format::Gmwcs, _) => io::parse_gmwcs(&nodes, &edges),
            (Format::Sgmwcs, Some(path)) => io::parse_sgmwcs(&nodes, &edges, &Source::read(path)?),
            (Format::Sgmwcs, None) => bail!("--type sgmwcs needs --signals"),
        }
    }
}

fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(log_level(cmd.log))
        .init();
    match cmd.action {
        Action::Solve(args) => solve(&args),
        Action::Report => report(),
    }
}

fn solve(args: &SolveArgs) -> Result<()> {
    let cfg = args.solver_cfg()?;
    let loaded = args.load()?;
    tracing::info!(
        nodes = loaded.nodes.len(),
        edges = loaded.edges.len(),
        signals = loaded.instance.signals().len(),
        "instance loaded"
    );

    let solved = Solver::new(cfg).solve(&loaded.instance);
    let (nodes_out, edges_out) =
        io::write_outputs(&loaded, solved.as_ref().ok(), &args.nodes, &args.edges)?;

    let mut payload = Payload::new(serde_json::to_value(args)?);
    payload.params["type"] = serde_json::json!(format!("{:?}", args.format()).to_lowercase());
    payload.outputs = vec![nodes_out, edges_out];
    if let Ok(sol) = &solved {
        payload.result = Some(summary(sol));
    }
    if let Some(path) = &args.stats {
        payload.outputs.push(path.clone());
    }
    write_sidecar(&args.nodes, payload)?;

    let sol = solved.context("solve failed")?;
    if let Some(path) = &args.stats {
        let row = StatsRow {
            solution: &sol,
            nodes_in: &args.nodes,
            edges_in: &args.edges,
            signals_in: args.signals.as_deref(),
        };
        io::append_stats(path, &row)?;
    }
    println!("{}", serde_json::to_string_pretty(&summary(&sol))?);
    Ok(())
}

fn summary(sol: &Solution) -> serde_json::Value {
    serde_json::json!({
        "score": sol.score,
        "optimal": sol.optimal,
        "elements": sol.elements.len(),
        "reduced_nodes": sol.stats.reduced_nodes,
        "reduced_edges": sol.stats.reduced_edges,
        "workers": sol.stats.workers,
        "elapsed_secs": sol.stats.elapsed.as_secs_f64(),
    })
}

fn report() -> Result<()> {
    let obj = serde_json::json!({
        "code_rev": current_git_rev(),
        "version": mwcs::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

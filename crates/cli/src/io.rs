//! Instance files in, result files out.
//!
//! Formats
//! - GMWCS: nodes `name<TAB>weight`, edges `from<TAB>to<TAB>weight`.
//! - SGMWCS: nodes `name<TAB>sig...`, edges `from<TAB>to<TAB>sig...`,
//!   signals `sig<TAB>weight` (`inf` marks a mandatory signal).
//! - Blank lines and lines starting with `#` are skipped everywhere.
//! - Outputs echo each record in input order with its weight when selected
//!   and `n/a` otherwise.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use mwcs::api::{EdgeId, Elem, Instance, InstanceBuilder, NodeId, SignalId, Solution};
use thiserror::Error;

/// Malformed input, located by file and 1-based line.
#[derive(Debug, Error)]
#[error("{}:{line}: {reason}", .file.display())]
pub struct ParseError {
    pub file: PathBuf,
    pub line: usize,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Weights written directly on vertices and edges.
    Gmwcs,
    /// Vertices and edges list signal names; weights live in a signal file.
    Sgmwcs,
}

/// One input file held in memory.
pub struct Source {
    pub path: PathBuf,
    pub text: String,
}

impl Source {
    pub fn read(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Non-empty, non-comment lines with their line numbers, split into
    /// whitespace-separated tokens.
    fn records(&self) -> impl Iterator<Item = (usize, Vec<&str>)> + '_ {
        self.text.lines().enumerate().filter_map(|(i, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                None
            } else {
                Some((i + 1, line.split_whitespace().collect()))
            }
        })
    }

    fn error(&self, line: usize, reason: impl Into<String>) -> ParseError {
        ParseError {
            file: self.path.clone(),
            line,
            reason: reason.into(),
        }
    }
}

/// A parsed instance plus what is needed to echo it back.
pub struct Loaded {
    pub instance: Instance,
    /// Node records in input order: the node name and its id.
    pub nodes: Vec<(String, NodeId)>,
    /// Edge records in input order: endpoint names and the edge id.
    pub edges: Vec<(String, String, EdgeId)>,
}

#[derive(Default)]
struct Names {
    nodes: HashMap<String, NodeId>,
    order: Vec<(String, NodeId)>,
}

impl Names {
    fn add(&mut self, src: &Source, line: usize, name: &str, v: NodeId) -> Result<(), ParseError> {
        if self.nodes.insert(name.to_string(), v).is_some() {
            return Err(src.error(line, format!("duplicate node `{name}`")));
        }
        self.order.push((name.to_string(), v));
        Ok(())
    }

    fn get(&self, src: &Source, line: usize, name: &str) -> Result<NodeId, ParseError> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| src.error(line, format!("unknown node `{name}`")))
    }
}

fn parse_weight(src: &Source, line: usize, token: &str) -> Result<f64, ParseError> {
    let w: f64 = token
        .parse()
        .map_err(|_| src.error(line, format!("malformed number `{token}`")))?;
    if w.is_nan() || w == f64::NEG_INFINITY {
        return Err(src.error(line, format!("weight `{token}` is not allowed")));
    }
    Ok(w)
}

/// Plain weights: one weight per vertex and edge.
pub fn parse_gmwcs(nodes: &Source, edges: &Source) -> Result<Loaded> {
    let mut b = InstanceBuilder::new();
    let mut names = Names::default();
    for (line, tokens) in nodes.records() {
        let &[name, weight] = tokens.as_slice() else {
            return Err(nodes.error(line, "expected `name weight`").into());
        };
        let w = parse_weight(nodes, line, weight)?;
        let v = b.add_weighted_node(w);
        names.add(nodes, line, name, v)?;
    }
    let mut edge_records = Vec::new();
    for (line, tokens) in edges.records() {
        let &[from, to, weight] = tokens.as_slice() else {
            return Err(edges.error(line, "expected `from to weight`").into());
        };
        let (u, v) = (names.get(edges, line, from)?, names.get(edges, line, to)?);
        let w = parse_weight(edges, line, weight)?;
        let e = b.add_weighted_edge(u, v, w);
        edge_records.push((from.to_string(), to.to_string(), e));
    }
    let instance = b.build().context("assembling instance")?;
    Ok(Loaded {
        instance,
        nodes: names.order,
        edges: edge_records,
    })
}

/// Registry of named signals; rejects a second member of a negative signal.
struct SignalTable {
    ids: HashMap<String, SignalId>,
    weights: HashMap<SignalId, f64>,
    members: HashMap<SignalId, BTreeSet<Elem>>,
}

impl SignalTable {
    fn parse(src: &Source, b: &mut InstanceBuilder) -> Result<Self, ParseError> {
        let mut table = Self {
            ids: HashMap::new(),
            weights: HashMap::new(),
            members: HashMap::new(),
        };
        for (line, tokens) in src.records() {
            let &[name, weight] = tokens.as_slice() else {
                return Err(src.error(line, "expected `signal weight`"));
            };
            let w = parse_weight(src, line, weight)?;
            if table.ids.contains_key(name) {
                return Err(src.error(line, format!("duplicate signal `{name}`")));
            }
            let s = b.add_signal(w);
            table.ids.insert(name.to_string(), s);
            table.weights.insert(s, w);
        }
        Ok(table)
    }

    fn attach(
        &mut self,
        b: &mut InstanceBuilder,
        src: &Source,
        line: usize,
        x: Elem,
        names: &[&str],
    ) -> Result<(), ParseError> {
        for &name in names {
            let &s = self
                .ids
                .get(name)
                .ok_or_else(|| src.error(line, format!("unknown signal `{name}`")))?;
            let members = self.members.entry(s).or_default();
            if !members.insert(x) {
                continue;
            }
            if members.len() > 1 && self.weights.get(&s).is_some_and(|&w| w < 0.0) {
                return Err(src.error(
                    line,
                    format!("negative signal `{name}` is shared by several elements"),
                ));
            }
            b.attach(x, s);
        }
        Ok(())
    }
}

/// Signal weights: elements list the signals they carry.
pub fn parse_sgmwcs(nodes: &Source, edges: &Source, signals: &Source) -> Result<Loaded> {
    let mut b = InstanceBuilder::new();
    let mut table = SignalTable::parse(signals, &mut b)?;
    let mut names = Names::default();
    for (line, tokens) in nodes.records() {
        let Some((name, sigs)) = tokens.split_first() else {
            continue;
        };
        let v = b.add_node();
        names.add(nodes, line, name, v)?;
        table.attach(&mut b, nodes, line, Elem::Node(v), sigs)?;
    }
    let mut edge_records = Vec::new();
    for (line, tokens) in edges.records() {
        let [from, to, sigs @ ..] = tokens.as_slice() else {
            return Err(edges.error(line, "expected `from to signal...`").into());
        };
        let (u, v) = (names.get(edges, line, from)?, names.get(edges, line, to)?);
        let e = b.add_edge(u, v);
        table.attach(&mut b, edges, line, Elem::Edge(e), sigs)?;
        edge_records.push((from.to_string(), to.to_string(), e));
    }
    let instance = b.build().context("assembling instance")?;
    Ok(Loaded {
        instance,
        nodes: names.order,
        edges: edge_records,
    })
}

/// `<input>.out` next to the input file.
pub fn out_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".out");
    PathBuf::from(name)
}

fn cell(inst: &Instance, selected: &BTreeSet<Elem>, x: Elem) -> String {
    if selected.contains(&x) {
        inst.signals().weight_of(x).to_string()
    } else {
        "n/a".to_string()
    }
}

/// Write both `.out` files; `None` (a failed solve) marks every record `n/a`.
pub fn write_outputs(
    loaded: &Loaded,
    solution: Option<&Solution>,
    nodes_in: &Path,
    edges_in: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let selected: BTreeSet<Elem> = solution
        .map(|s| s.elements.iter().copied().collect())
        .unwrap_or_default();
    let inst = &loaded.instance;

    let mut nodes_txt = String::new();
    for (name, v) in &loaded.nodes {
        writeln!(nodes_txt, "{name}\t{}", cell(inst, &selected, Elem::Node(*v)))?;
    }
    let mut edges_txt = String::new();
    for (from, to, e) in &loaded.edges {
        writeln!(edges_txt, "{from}\t{to}\t{}", cell(inst, &selected, Elem::Edge(*e)))?;
    }

    let (nodes_out, edges_out) = (out_path(nodes_in), out_path(edges_in));
    fs::write(&nodes_out, nodes_txt).with_context(|| format!("writing {}", nodes_out.display()))?;
    fs::write(&edges_out, edges_txt).with_context(|| format!("writing {}", edges_out.display()))?;
    Ok((nodes_out, edges_out))
}

pub const STATS_HEADER: &str =
    "isOpt\tVPrep\tEPrep\ttime\tnodes\tedges\tnodefile\tedgefile\tsigfile\tversion";

/// One row of the statistics table.
pub struct StatsRow<'a> {
    pub solution: &'a Solution,
    pub nodes_in: &'a Path,
    pub edges_in: &'a Path,
    pub signals_in: Option<&'a Path>,
}

/// Append a row to the TSV at `path`, writing the header first if the file
/// is new or empty.
pub fn append_stats(path: &Path, row: &StatsRow<'_>) -> Result<()> {
    let fresh = fs::metadata(path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    if fresh {
        writeln!(file, "{STATS_HEADER}")?;
    }
    let sol = row.solution;
    let (mut nodes, mut edges) = (0, 0);
    for x in &sol.elements {
        match x {
            Elem::Node(_) => nodes += 1,
            Elem::Edge(_) => edges += 1,
        }
    }
    writeln!(
        file,
        "{}\t{}\t{}\t{:.3}\t{nodes}\t{edges}\t{}\t{}\t{}\t{}",
        u8::from(sol.optimal),
        sol.stats.reduced_nodes,
        sol.stats.reduced_edges,
        sol.stats.elapsed.as_secs_f64(),
        row.nodes_in.display(),
        row.edges_in.display(),
        row.signals_in.map_or("-".to_string(), |p| p.display().to_string()),
        mwcs::VERSION,
    )?;
    Ok(())
}

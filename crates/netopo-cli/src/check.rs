//! Offline graph checks (`netopo check`).
//!
//! Runs a graph body through the same validation the server applies and
//! reports its derived metrics. It also lints what the document model
//! deliberately leaves alone: dangling id references and edges whose stored
//! consumption no longer matches `base × capacity × distance`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;

use netopo_core::{edge_consumption, parse_graph, GraphDocument, GraphMetrics, ValidationError};

const CONSUMPTION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckReport {
    pub name: String,
    pub mode: String,
    pub node_counts: BTreeMap<String, usize>,
    pub edges: usize,
    pub metrics: GraphMetrics,
    pub warnings: Vec<String>,
}

pub(crate) fn check_graph(body: serde_json::Value) -> Result<CheckReport, ValidationError> {
    let doc = parse_graph(body)?;
    Ok(report_for(&doc))
}

fn report_for(doc: &GraphDocument) -> CheckReport {
    let mut node_counts = BTreeMap::new();
    for node in &doc.nodes {
        *node_counts.entry(node.kind.as_str().to_string()).or_insert(0) += 1;
    }

    let ids: HashSet<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for node in &doc.nodes {
        if !seen.insert(node.id.as_str()) {
            warnings.push(format!("node id `{}` is used more than once", node.id));
        }
        if let Some(parent) = node.parent_id.as_deref() {
            if !ids.contains(parent) {
                warnings.push(format!("node `{}` has unknown parentId `{parent}`", node.id));
            }
        }
        if node.halo_id.is_some() && !node.is_antenna() {
            warnings.push(format!("node `{}` has a haloId but is not an antenna", node.id));
        }
        if !doc.mode.allows(node.kind) {
            warnings.push(format!(
                "node `{}` of type {} is not used in mode {}",
                node.id, node.kind, doc.mode
            ));
        }
    }

    for edge in &doc.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !ids.contains(endpoint.as_str()) {
                warnings.push(format!("edge `{}` references unknown node `{endpoint}`", edge.id));
            }
        }
        let expected = edge_consumption(edge.base_consumption, edge.capacity, edge.distance);
        if (expected - edge.consumption).abs() > CONSUMPTION_TOLERANCE * expected.abs().max(1.0) {
            warnings.push(format!(
                "edge `{}` stores consumption {} but base × capacity × distance = {expected}",
                edge.id, edge.consumption
            ));
        }
    }

    CheckReport {
        name: doc.name.clone(),
        mode: doc.mode.to_string(),
        node_counts,
        edges: doc.edges.len(),
        metrics: doc.metrics(),
        warnings,
    }
}

pub(crate) fn cmd_check(input: &Path, as_json: bool) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let body: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let report = match check_graph(body) {
        Ok(report) => report,
        Err(err) => {
            for violation in &err.violations {
                eprintln!("{} {violation}", "error:".red().bold());
            }
            return Err(anyhow!(
                "{} failed validation ({} problem(s))",
                input.display(),
                err.violations.len()
            ));
        }
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {} ({})", "graph".bold(), report.name, report.mode);
    for (kind, count) in &report.node_counts {
        println!("  {kind:<14} {count}");
    }
    println!("  {:<14} {}", "edges", report.edges);
    println!(
        "  total capacity    {}\n  total consumption {}",
        report.metrics.total_capacity, report.metrics.total_consumption
    );
    for warning in &report.warnings {
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }
    eprintln!(
        "{} {} ({} warning(s))",
        "ok".green().bold(),
        input.display(),
        report.warnings.len()
    );
    Ok(())
}

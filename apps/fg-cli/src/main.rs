mod error;
mod pipeline;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use fg_core::{EdgeKey, FlowConfig};
use fg_func::FunctionGraph;
use fg_graph::GraphEvent;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "fg-cli")]
#[command(about = "Flowgraph CLI - evaluate a small function graph", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a text file and print it upper-cased
    Upper {
        /// Path to the input text file
        path: PathBuf,
    },
    /// Build the upper-case pipeline and describe it while evaluating
    Inspect {
        /// Path to the input text file
        path: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FlowConfig::load(path)?,
        None => FlowConfig::default(),
    };

    match cli.command {
        Commands::Upper { path } => cmd_upper(&path, &config, cli.json),
        Commands::Inspect { path } => cmd_inspect(&path, &config, cli.json),
    }
}

fn cmd_upper(path: &Path, config: &FlowConfig, json: bool) -> CliResult<()> {
    let mut pipeline = pipeline::build(path, config)?;
    pipeline.graph.evaluate(&pipeline.upper)?;

    match pipeline.graph.cache(&pipeline.upper) {
        Ok(value) if json => println!("{}", serde_json::to_string_pretty(&value.to_json())?),
        Ok(value) => print!("{}", value),
        Err(_) => return Err(failure(&pipeline.graph, pipeline.upper.as_str())),
    }
    Ok(())
}

fn cmd_inspect(path: &Path, config: &FlowConfig, json: bool) -> CliResult<()> {
    let mut pipeline = pipeline::build(path, config)?;
    pipeline.graph.subscribe_all(|event, _| log_event(event));

    let report = pipeline.graph.evaluate(&pipeline.upper)?;
    let raw = pipeline.raw_text().map(|v| v.to_string());
    let graph = &pipeline.graph;

    if json {
        let nodes: Vec<serde_json::Value> = graph
            .nodes()
            .map(|id| {
                serde_json::json!({
                    "id": id.as_str(),
                    "inlets": graph.inlets(id).unwrap_or_default(),
                    "outlets": graph.outlets(id).unwrap_or_default(),
                    "order": graph.evaluation_order(id).ok(),
                    "cache": graph.cache(id).ok().map(|v| v.to_json()),
                    "error": graph.error(id).ok().map(|e| e.to_string()),
                })
            })
            .collect();
        let edges: Vec<String> = graph.edges().map(|e| e.to_string()).collect();
        let timings: serde_json::Map<String, serde_json::Value> = report
            .timings_ms
            .iter()
            .map(|(node, ms)| (node.to_string(), serde_json::json!(ms)))
            .collect();
        let doc = serde_json::json!({
            "nodes": nodes,
            "edges": edges,
            "raw": raw,
            "timings_ms": timings,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("Nodes:");
        for id in graph.nodes() {
            let order = graph
                .evaluation_order(id)
                .map(|n| n.to_string())
                .unwrap_or_else(|_| "-".to_string());
            println!(
                "  [{}] {} inlets={:?} outlets={:?}",
                order,
                id,
                graph.inlets(id).unwrap_or_default(),
                graph.outlets(id).unwrap_or_default()
            );
        }
        println!("Edges:");
        for edge in graph.edges() {
            if let EdgeKey::Ports { outlet, inlet } = &edge.key {
                println!("  {}.{} -> {}.{}", edge.source, outlet, edge.target, inlet);
            }
        }
        for (node, ms) in &report.timings_ms {
            println!("  {} took {:.3} ms", node, ms);
        }
        match &raw {
            Some(text) => println!("Read: {:?}", text),
            None => println!("Read: <none>"),
        }
        match graph.cache(&pipeline.upper) {
            Ok(value) => println!("Result: {:?}", value.to_string()),
            Err(_) => println!("Result: <none>"),
        }
    }

    if report.succeeded() {
        Ok(())
    } else {
        Err(failure(graph, pipeline.upper.as_str()))
    }
}

fn log_event(event: &GraphEvent) {
    match event {
        GraphEvent::NodeAttributesAdded { node, names } | GraphEvent::NodeAttributesChanged { node, names } => {
            info!(kind = ?event.kind(), node = %node, names = ?names, "graph event");
        }
        _ => info!(kind = ?event.kind(), "graph event"),
    }
}

/// The error recorded on the first failing node upstream of `target`.
fn failure(graph: &FunctionGraph, target: &str) -> CliError {
    let failed = graph
        .ancestors(target)
        .unwrap_or_default()
        .into_iter()
        .chain(std::iter::once(target.into()))
        .find_map(|id| graph.error(&id).ok().map(|err| (id, err.to_string())));

    match failed {
        Some((node, message)) => CliError::Evaluation {
            node: node.to_string(),
            message,
        },
        None => CliError::Evaluation {
            node: target.to_string(),
            message: "no result recorded".to_string(),
        },
    }
}

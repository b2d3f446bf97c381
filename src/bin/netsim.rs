//! netsim: command-line driver for the shortest-path and routing engine
//!
//! Loads a saved graph, then runs one of the shortest-path algorithms or a
//! packet-routing simulation and prints the result.

use netgraph::config::SimulatorConfig;
use netgraph::graph::Graph;
use netgraph::logging;
use netgraph::persist::GraphSnapshot;
use netgraph::routing::{RoutingSimulator, RoutingStrategy};
use netgraph::shortest_path::{all_pairs_report, compare_algorithms, dijkstra_to, AllPairs};
use netgraph::{format_path, VertexId};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Debug, Clone)]
struct CliArgs {
    graph: Option<String>,
    config: Option<String>,
    algorithm: String,
    start: Option<VertexId>,
    end: Option<VertexId>,
    packets: usize,
    seed: Option<u64>,
    protocol: String,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            graph: None,
            config: None,
            algorithm: "dijkstra".to_string(),
            start: None,
            end: None,
            packets: 1,
            seed: None,
            protocol: "IPv4".to_string(),
        }
    }
}

fn print_help() {
    println!("Usage: netsim --graph FILE [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -g, --graph FILE        Saved graph (JSON)");
    println!("  -c, --config FILE       Simulator configuration (JSON)");
    println!("  -a, --algorithm NAME    dijkstra, dijkstra-all, floyd, compare,");
    println!("                          random, flooding, historical (default: dijkstra)");
    println!("  -s, --start N           Start vertex (default: from graph file)");
    println!("  -e, --end N             End vertex (default: from graph file)");
    println!("  -p, --packets N         Packets to simulate (default: 1)");
    println!("      --seed N            Random seed for routing");
    println!("      --protocol LABEL    Protocol label shown with packets (default: IPv4)");
    println!("  -h, --help              Show this help");
}

/// `None` when help was requested.
fn parse_args(args: &[String]) -> Result<Option<CliArgs>, String> {
    let mut cli = CliArgs::default();
    let mut i = 1;

    fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
        args.get(i + 1)
            .map(String::as_str)
            .ok_or_else(|| format!("{} requires a value", flag))
    }

    fn number<T: std::str::FromStr>(raw: &str, flag: &str) -> Result<T, String> {
        raw.parse()
            .map_err(|_| format!("{} expects a number, got '{}'", flag, raw))
    }

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--graph" | "-g" => {
                cli.graph = Some(value(args, i, flag)?.to_string());
                i += 1;
            }
            "--config" | "-c" => {
                cli.config = Some(value(args, i, flag)?.to_string());
                i += 1;
            }
            "--algorithm" | "-a" => {
                cli.algorithm = value(args, i, flag)?.to_ascii_lowercase();
                i += 1;
            }
            "--start" | "-s" => {
                cli.start = Some(number(value(args, i, flag)?, flag)?);
                i += 1;
            }
            "--end" | "-e" => {
                cli.end = Some(number(value(args, i, flag)?, flag)?);
                i += 1;
            }
            "--packets" | "-p" => {
                cli.packets = number(value(args, i, flag)?, flag)?;
                i += 1;
            }
            "--seed" => {
                cli.seed = Some(number(value(args, i, flag)?, flag)?);
                i += 1;
            }
            "--protocol" => {
                cli.protocol = value(args, i, flag)?.to_string();
                i += 1;
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown option '{}'", other)),
        }
        i += 1;
    }

    Ok(Some(cli))
}

fn endpoints(cli: &CliArgs, snapshot: &GraphSnapshot) -> Result<(VertexId, VertexId), String> {
    let start = cli
        .start
        .or(snapshot.start_vertex)
        .ok_or("a start vertex is required (--start)")?;
    let end = cli
        .end
        .or(snapshot.end_vertex)
        .ok_or("an end vertex is required (--end)")?;
    Ok((start, end))
}

fn print_all_pairs(result: &AllPairs, elapsed_secs: f64) -> Result<(), String> {
    let report = all_pairs_report(result).map_err(|e| e.to_string())?;
    println!("=== {} ===", result.algorithm);
    println!("Elapsed: {:.6} s", elapsed_secs);
    println!();
    for line in report {
        println!("{}", line);
    }
    Ok(())
}

fn run(cli: CliArgs) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => SimulatorConfig::from_file(path).map_err(|e| e.to_string())?,
        None => SimulatorConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    logging::init(&config.log_filter);

    let graph_path = cli.graph.as_deref().ok_or("--graph is required")?;
    let snapshot = GraphSnapshot::load(graph_path).map_err(|e| e.to_string())?;
    let graph: Graph = snapshot
        .to_edge_list(config.max_vertices)
        .map_err(|e| e.to_string())?
        .build();

    println!(
        "Graph: {} vertices, {} edges",
        graph.vertex_count(),
        graph.edge_count()
    );
    println!();

    match cli.algorithm.as_str() {
        "dijkstra" => {
            let (start, end) = endpoints(&cli, &snapshot)?;
            let (distance, path) = dijkstra_to(&graph, start, end, true).map_err(|e| e.to_string())?;
            if path.is_empty() {
                println!("No path from {} to {}", start, end);
            } else {
                println!("Shortest path length: {}", distance);
                println!("Path: {}", format_path(&path));
            }
        }
        "dijkstra-all" => {
            let timer = Instant::now();
            let result = AllPairs::dijkstra(&graph);
            print_all_pairs(&result, timer.elapsed().as_secs_f64())?;
        }
        "floyd" | "floyd-warshall" => {
            let timer = Instant::now();
            let result = AllPairs::floyd_warshall(&graph);
            print_all_pairs(&result, timer.elapsed().as_secs_f64())?;
        }
        "compare" => {
            println!("{}", compare_algorithms(&graph));
        }
        name => {
            let strategy: RoutingStrategy = name.parse().map_err(|e: netgraph::RoutingError| e.to_string())?;
            let (start, end) = endpoints(&cli, &snapshot)?;
            let mut simulator = RoutingSimulator::from_config(&config);
            let run = simulator
                .simulate(&graph, strategy, start, end, cli.packets, &cli.protocol)
                .map_err(|e| e.to_string())?;
            print!("{}", run);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let cli = match parse_args(&args) {
        Ok(Some(cli)) => cli,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {}", e);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

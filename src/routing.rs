//! Packet routing simulation
//!
//! Three disciplines deliver a batch of packets from a start vertex to an end
//! vertex:
//!
//! - **Random** (datagram): every packet takes its own random walk over
//!   unvisited out-neighbors. A dead end aborts the run.
//! - **Flooding**: breadth-first search; the first discovery of the end vertex
//!   gives the path (minimal hop count).
//! - **Historical** (virtual circuit): one weighted shortest path from Dijkstra
//!   is reused by every packet and produces a forwarding table.
//!
//! The random source is injected so runs are reproducible under a fixed seed.

use crate::config::SimulatorConfig;
use crate::graph::{Graph, GraphError};
use crate::packet::{PacketRecord, DEFAULT_PACKET_SIZE};
use crate::shortest_path::dijkstra_to;
use crate::{format_path, VertexId, Weight};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Routing simulation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("packet {packet} hit a dead end at vertex {vertex}")]
    DeadEnd { packet: usize, vertex: VertexId },

    #[error("{strategy} found no path from {start} to {end}")]
    Unreachable {
        strategy: RoutingStrategy,
        start: VertexId,
        end: VertexId,
    },

    #[error("at least one packet is required")]
    NoPackets,

    #[error("unknown routing strategy: {0}")]
    UnknownStrategy(String),
}

/// Routing discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingStrategy {
    Random,
    Flooding,
    Historical,
}

impl RoutingStrategy {
    pub const ALL: [RoutingStrategy; 3] = [
        RoutingStrategy::Random,
        RoutingStrategy::Flooding,
        RoutingStrategy::Historical,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            RoutingStrategy::Random => "Random routing",
            RoutingStrategy::Flooding => "Flooding routing",
            RoutingStrategy::Historical => "Historical routing",
        }
    }
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for RoutingStrategy {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(RoutingStrategy::Random),
            "flooding" => Ok(RoutingStrategy::Flooding),
            "historical" => Ok(RoutingStrategy::Historical),
            other => Err(RoutingError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Per-destination entry in a node's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteEntry {
    /// Forwarding entry (historical routing)
    Forward { next_hop: VertexId, edge_weight: Weight },
    /// Hops remaining to the destination on a delivered path (random, flooding)
    Hops { hop_count: usize },
}

/// Per-node tables: node -> destination -> entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    tables: BTreeMap<VertexId, BTreeMap<VertexId, RouteEntry>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_forward(
        &mut self,
        node: VertexId,
        destination: VertexId,
        next_hop: VertexId,
        edge_weight: Weight,
    ) {
        self.tables.entry(node).or_default().insert(
            destination,
            RouteEntry::Forward {
                next_hop,
                edge_weight,
            },
        );
    }

    /// Record a hop count, keeping the smallest seen for this node/destination.
    pub fn record_hops(&mut self, node: VertexId, destination: VertexId, hop_count: usize) {
        let entry = self
            .tables
            .entry(node)
            .or_default()
            .entry(destination)
            .or_insert(RouteEntry::Hops { hop_count });
        if let RouteEntry::Hops { hop_count: best } = entry {
            *best = (*best).min(hop_count);
        }
    }

    pub fn get(&self, node: VertexId, destination: VertexId) -> Option<&RouteEntry> {
        self.tables.get(&node)?.get(&destination)
    }

    pub fn next_hop(&self, node: VertexId, destination: VertexId) -> Option<VertexId> {
        match self.get(node, destination)? {
            RouteEntry::Forward { next_hop, .. } => Some(*next_hop),
            RouteEntry::Hops { .. } => None,
        }
    }

    /// Follow forwarding entries from `start` to `destination`.
    ///
    /// `None` if an entry is missing or the chain loops.
    pub fn follow(&self, start: VertexId, destination: VertexId) -> Option<Vec<VertexId>> {
        let mut path = vec![start];
        let mut current = start;
        while current != destination {
            if path.len() > self.tables.len() {
                return None;
            }
            current = self.next_hop(current, destination)?;
            path.push(current);
        }
        Some(path)
    }

    /// Sum of edge weights along the forwarding chain from `node`.
    pub fn weight_to(&self, node: VertexId, destination: VertexId) -> Option<Weight> {
        let path = self.follow(node, destination)?;
        path.windows(2)
            .map(|hop| match self.get(hop[0], destination)? {
                RouteEntry::Forward { edge_weight, .. } => Some(*edge_weight),
                RouteEntry::Hops { .. } => None,
            })
            .sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.tables.keys().copied()
    }

    pub fn entries(
        &self,
        node: VertexId,
    ) -> impl Iterator<Item = (VertexId, &RouteEntry)> + '_ {
        self.tables
            .get(&node)
            .into_iter()
            .flat_map(|t| t.iter().map(|(d, e)| (*d, e)))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of entries over all nodes
    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node, table) in &self.tables {
            writeln!(f, "Node {}:", node)?;
            for (destination, entry) in table {
                match entry {
                    RouteEntry::Forward {
                        next_hop,
                        edge_weight,
                    } => {
                        let total = self
                            .weight_to(*node, *destination)
                            .map(|w| w.to_string())
                            .unwrap_or_else(|| "?".to_string());
                        writeln!(
                            f,
                            "  -> to {}: via {}, edge weight {}, weight to destination {}",
                            destination, next_hop, edge_weight, total
                        )?;
                    }
                    RouteEntry::Hops { hop_count } => {
                        writeln!(f, "  -> to {}: {} hops", destination, hop_count)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Result of one successful simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    /// 1-based attempt number for this simulator
    pub run: u64,
    pub strategy: RoutingStrategy,
    /// Caller-supplied label, display only
    pub protocol: String,
    pub start: VertexId,
    pub end: VertexId,
    pub packets: Vec<PacketRecord>,
    pub table: RoutingTable,
}

impl SimulationRun {
    pub fn algorithm_name(&self) -> &'static str {
        self.strategy.display_name()
    }

    pub fn paths(&self) -> impl Iterator<Item = &[VertexId]> {
        self.packets.iter().map(PacketRecord::path)
    }
}

impl fmt::Display for SimulationRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Routing run #{} ===", self.run)?;
        writeln!(f, "Algorithm: {}", self.algorithm_name())?;
        writeln!(f, "Protocol:  {}", self.protocol)?;
        writeln!(f, "From {} to {}, {} packet(s)", self.start, self.end, self.packets.len())?;
        for packet in &self.packets {
            writeln!(f, "{}", packet)?;
        }
        if !self.table.is_empty() {
            writeln!(f, "Routing tables:")?;
            write!(f, "{}", self.table)?;
        }
        Ok(())
    }
}

/// Packet routing simulator with an injected random source.
pub struct RoutingSimulator<R = StdRng> {
    rng: R,
    packet_sizes: RangeInclusive<u32>,
    runs: u64,
}

impl RoutingSimulator<StdRng> {
    /// Deterministic simulator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Simulator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        let simulator = match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        };
        simulator.with_packet_sizes(config.packet_sizes())
    }
}

impl<R: Rng> RoutingSimulator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            packet_sizes: DEFAULT_PACKET_SIZE,
            runs: 0,
        }
    }

    pub fn with_packet_sizes(mut self, sizes: RangeInclusive<u32>) -> Self {
        self.packet_sizes = sizes;
        self
    }

    /// Number of runs attempted so far, failed ones included
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Deliver `packets` packets from `start` to `end`.
    ///
    /// Each call builds a fresh routing table. A failure aborts the whole run.
    pub fn simulate(
        &mut self,
        graph: &Graph,
        strategy: RoutingStrategy,
        start: VertexId,
        end: VertexId,
        packets: usize,
        protocol: &str,
    ) -> Result<SimulationRun, RoutingError> {
        graph.check_vertex(start)?;
        graph.check_vertex(end)?;
        if packets == 0 {
            return Err(RoutingError::NoPackets);
        }

        self.runs += 1;
        info!(
            run = self.runs,
            strategy = %strategy,
            start,
            end,
            packets,
            protocol,
            "routing run started"
        );

        let result = match strategy {
            RoutingStrategy::Random => self.random_routing(graph, start, end, packets),
            RoutingStrategy::Flooding => self.flooding_routing(graph, start, end, packets),
            RoutingStrategy::Historical => self.historical_routing(graph, start, end, packets),
        };

        match result {
            Ok((packets, table)) => {
                info!(run = self.runs, delivered = packets.len(), "routing run complete");
                Ok(SimulationRun {
                    run: self.runs,
                    strategy,
                    protocol: protocol.to_string(),
                    start,
                    end,
                    packets,
                    table,
                })
            }
            Err(e) => {
                warn!(run = self.runs, error = %e, "routing run failed");
                Err(e)
            }
        }
    }

    fn packet(&mut self, number: usize, path: Vec<VertexId>) -> PacketRecord {
        PacketRecord::with_random_size(number, path, self.packet_sizes.clone(), &mut self.rng)
    }

    fn random_routing(
        &mut self,
        graph: &Graph,
        start: VertexId,
        end: VertexId,
        packets: usize,
    ) -> Result<(Vec<PacketRecord>, RoutingTable), RoutingError> {
        let mut records = Vec::with_capacity(packets);
        let mut table = RoutingTable::new();

        for number in 1..=packets {
            let path = random_walk(graph, start, end, number, &mut self.rng)?;
            debug!(packet = number, path = %format_path(&path), "random walk delivered");
            record_path_hops(&mut table, &path);
            records.push(self.packet(number, path));
        }

        Ok((records, table))
    }

    fn flooding_routing(
        &mut self,
        graph: &Graph,
        start: VertexId,
        end: VertexId,
        packets: usize,
    ) -> Result<(Vec<PacketRecord>, RoutingTable), RoutingError> {
        // BFS is deterministic, so every packet floods to the same first-found path
        let path = flood(graph, start, end)?.ok_or(RoutingError::Unreachable {
            strategy: RoutingStrategy::Flooding,
            start,
            end,
        })?;
        debug!(path = %format_path(&path), "flooding reached destination");

        let mut table = RoutingTable::new();
        record_path_hops(&mut table, &path);
        let records = (1..=packets)
            .map(|number| self.packet(number, path.clone()))
            .collect();
        Ok((records, table))
    }

    fn historical_routing(
        &mut self,
        graph: &Graph,
        start: VertexId,
        end: VertexId,
        packets: usize,
    ) -> Result<(Vec<PacketRecord>, RoutingTable), RoutingError> {
        let (distance, path) = dijkstra_to(graph, start, end, true)?;
        if path.is_empty() {
            return Err(RoutingError::Unreachable {
                strategy: RoutingStrategy::Historical,
                start,
                end,
            });
        }
        debug!(distance, path = %format_path(&path), "virtual circuit established");

        let table = forwarding_table(graph, &path)?;
        let records = (1..=packets)
            .map(|number| self.packet(number, path.clone()))
            .collect();
        Ok((records, table))
    }
}

/// Random walk of packet `packet` over unvisited out-neighbors.
///
/// Fails with [`RoutingError::DeadEnd`] when the walk gets stuck before `end`.
pub fn random_walk<R: Rng>(
    graph: &Graph,
    start: VertexId,
    end: VertexId,
    packet: usize,
    rng: &mut R,
) -> Result<Vec<VertexId>, RoutingError> {
    graph.check_vertex(start)?;
    graph.check_vertex(end)?;
    let mut visited = vec![false; graph.vertex_count()];
    let mut path = vec![start];
    let mut current = start;
    visited[start] = true;

    while current != end {
        let candidates: Vec<VertexId> = graph
            .neighbors(current)
            .map(|(v, _)| v)
            .filter(|&v| !visited[v])
            .collect();
        let next = *candidates.choose(rng).ok_or(RoutingError::DeadEnd {
            packet,
            vertex: current,
        })?;
        visited[next] = true;
        path.push(next);
        current = next;
    }

    Ok(path)
}

/// Breadth-first search in neighbor-index order; path to the first discovery of `end`.
///
/// `Ok(None)` when `end` is unreachable.
pub fn flood(
    graph: &Graph,
    start: VertexId,
    end: VertexId,
) -> Result<Option<Vec<VertexId>>, GraphError> {
    graph.check_vertex(start)?;
    graph.check_vertex(end)?;
    let n = graph.vertex_count();
    if start == end {
        return Ok(Some(vec![start]));
    }

    let mut visited = vec![false; n];
    let mut parent: Vec<Option<VertexId>> = vec![None; n];
    let mut queue = VecDeque::new();
    visited[start] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for (neighbor, _) in graph.neighbors(current) {
            if visited[neighbor] {
                continue;
            }
            visited[neighbor] = true;
            parent[neighbor] = Some(current);
            if neighbor == end {
                let mut path = vec![end];
                let mut node = end;
                while let Some(prev) = parent[node] {
                    path.push(prev);
                    node = prev;
                }
                path.reverse();
                return Ok(Some(path));
            }
            queue.push_back(neighbor);
        }
    }

    Ok(None)
}

/// Forwarding table for a virtual circuit: every vertex on `path` points at its
/// successor for the path's final vertex.
pub fn forwarding_table(graph: &Graph, path: &[VertexId]) -> Result<RoutingTable, GraphError> {
    let mut table = RoutingTable::new();
    if let Some(&destination) = path.last() {
        for hop in path.windows(2) {
            let weight = graph.weight(hop[0], hop[1])?;
            table.insert_forward(hop[0], destination, hop[1], weight);
        }
    }
    Ok(table)
}

fn record_path_hops(table: &mut RoutingTable, path: &[VertexId]) {
    if let Some(&destination) = path.last() {
        let hops = path.len() - 1;
        for (i, &node) in path[..hops].iter().enumerate() {
            table.record_hops(node, destination, hops - i);
        }
    }
}

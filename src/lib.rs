//! netgraph: shortest paths and packet-routing simulation over weighted digraphs
//!
//! Core library for all-pairs / single-source shortest paths on an adjacency
//! matrix and for simulating packet delivery under random, flooding and
//! historical (virtual-circuit) routing.

pub mod config;
pub mod graph;
pub mod logging;
pub mod packet;
pub mod persist;
pub mod routing;
pub mod shortest_path;

pub use graph::{Edge, EdgeList, Graph, GraphError};
pub use packet::PacketRecord;
pub use routing::{RoutingError, RoutingSimulator, RoutingStrategy, RoutingTable, SimulationRun};
pub use shortest_path::{dijkstra_all_pairs, dijkstra_from, dijkstra_to, floyd_warshall};

/// Dense vertex index in `0..n`.
pub type VertexId = usize;

/// Edge weight. A weight of `0` means "no edge".
pub type Weight = i64;

/// Shortest-path distance; unreachable pairs hold [`INFINITY`].
pub type Distance = f64;

/// Distance sentinel for unreachable pairs.
pub const INFINITY: Distance = f64::INFINITY;

/// Join a vertex sequence as `0 -> 1 -> 2`.
pub fn format_path(path: &[VertexId]) -> String {
    path.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

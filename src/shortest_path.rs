//! Shortest-path algorithms over an adjacency-matrix [`Graph`]
//!
//! - Floyd-Warshall all-pairs with a next-hop matrix
//! - Dijkstra (linear-scan, no heap) single-source, single-target and all-pairs
//! - Path reconstruction from parent arrays or the next-hop matrix
//!
//! Unreachable pairs are never errors: distances hold [`INFINITY`] and
//! reconstructed paths are empty. Out-of-range vertices are rejected with
//! [`GraphError::VertexOutOfRange`].

use crate::graph::{Graph, GraphError};
use crate::{format_path, Distance, VertexId, INFINITY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// `n × n` matrix of shortest distances.
pub type DistanceTable = Vec<Vec<Distance>>;

/// Floyd-Warshall auxiliary matrix: `next[i][j]` is the vertex to move to from
/// `i` when heading for `j`, `None` when there is no path.
pub type NextHopMatrix = Vec<Vec<Option<VertexId>>>;

/// Dijkstra auxiliary array: predecessor of each vertex on its shortest path
/// from the source, `None` when there is none.
pub type ParentArray = Vec<Option<VertexId>>;

/// Output of a single-source Dijkstra run.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleSource {
    pub source: VertexId,
    pub distances: Vec<Distance>,
    /// Present only when parent tracking was requested.
    pub parents: Option<ParentArray>,
}

/// Floyd-Warshall all-pairs shortest paths.
///
/// The intermediate vertex `k` must stay the outermost loop. No negative-cycle
/// detection is done.
pub fn floyd_warshall(graph: &Graph) -> (DistanceTable, NextHopMatrix) {
    let n = graph.vertex_count();
    let weights = graph.matrix();
    let mut dist = vec![vec![INFINITY; n]; n];
    let mut next = vec![vec![None; n]; n];

    for i in 0..n {
        for j in 0..n {
            if weights[i][j] != 0 {
                dist[i][j] = weights[i][j] as Distance;
                next[i][j] = Some(j);
            }
            if i == j {
                dist[i][j] = 0.0;
                next[i][j] = Some(i);
            }
        }
    }

    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                let through_k = dist[i][k] + dist[k][j];
                if through_k < dist[i][j] {
                    dist[i][j] = through_k;
                    next[i][j] = next[i][k];
                }
            }
        }
    }

    debug!(vertices = n, "floyd-warshall complete");
    (dist, next)
}

/// Single-source Dijkstra from `source` to every vertex.
///
/// Only edges with a positive weight are relaxed.
pub fn dijkstra_from(
    graph: &Graph,
    source: VertexId,
    track_parents: bool,
) -> Result<SingleSource, GraphError> {
    graph.check_vertex(source)?;
    Ok(dijkstra_run(graph, source, track_parents))
}

/// Dijkstra body; `source` must already be checked against the graph.
fn dijkstra_run(graph: &Graph, source: VertexId, track_parents: bool) -> SingleSource {
    let n = graph.vertex_count();
    let weights = graph.matrix();

    let mut dist = vec![INFINITY; n];
    let mut visited = vec![false; n];
    let mut parents: Option<ParentArray> = track_parents.then(|| vec![None; n]);
    dist[source] = 0.0;

    for _ in 0..n {
        // Linear scan for the closest unvisited vertex
        let mut u = None;
        let mut min_dist = INFINITY;
        for i in 0..n {
            if !visited[i] && dist[i] < min_dist {
                min_dist = dist[i];
                u = Some(i);
            }
        }

        let u = match u {
            Some(u) => u,
            None => break,
        };
        visited[u] = true;

        for v in 0..n {
            let w = weights[u][v];
            if w > 0 && !visited[v] {
                let candidate = dist[u] + w as Distance;
                if candidate < dist[v] {
                    dist[v] = candidate;
                    if let Some(parents) = parents.as_mut() {
                        parents[v] = Some(u);
                    }
                }
            }
        }
    }

    SingleSource {
        source,
        distances: dist,
        parents,
    }
}

/// Dijkstra restricted to one target: `(distance, path)`.
///
/// The path is reconstructed only when `track_parents` is set. Without it the
/// path is always empty, even when the distance is finite.
pub fn dijkstra_to(
    graph: &Graph,
    source: VertexId,
    target: VertexId,
    track_parents: bool,
) -> Result<(Distance, Vec<VertexId>), GraphError> {
    graph.check_vertex(target)?;
    let run = dijkstra_from(graph, source, track_parents)?;
    let path = match &run.parents {
        Some(parents) => reconstruct_path(parents, source, target)?,
        None => Vec::new(),
    };
    Ok((run.distances[target], path))
}

/// All-pairs Dijkstra: one tracked run per source vertex.
pub fn dijkstra_all_pairs(graph: &Graph) -> (DistanceTable, Vec<ParentArray>) {
    let n = graph.vertex_count();
    let mut dist_table = Vec::with_capacity(n);
    let mut parent_table = Vec::with_capacity(n);

    for source in 0..n {
        let run = dijkstra_run(graph, source, true);
        dist_table.push(run.distances);
        parent_table.push(run.parents.unwrap_or_default());
    }

    debug!(vertices = n, "all-pairs dijkstra complete");
    (dist_table, parent_table)
}

/// Walk parent pointers back from `end` to `start`.
///
/// Returns `[start]` when `start == end` and an empty path when `end` is not
/// reachable or the parent pointers loop. An index outside the array, whether
/// an argument or a stored parent, is a [`GraphError::VertexOutOfRange`].
pub fn reconstruct_path(
    parents: &[Option<VertexId>],
    start: VertexId,
    end: VertexId,
) -> Result<Vec<VertexId>, GraphError> {
    let count = parents.len();
    let check = |vertex: VertexId| {
        if vertex < count {
            Ok(())
        } else {
            Err(GraphError::VertexOutOfRange { vertex, count })
        }
    };
    check(start)?;
    check(end)?;

    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match parents[current] {
            Some(prev) if path.len() <= count => {
                check(prev)?;
                path.push(prev);
                current = prev;
            }
            _ => return Ok(Vec::new()),
        }
    }

    path.reverse();
    Ok(path)
}

/// Walk the next-hop matrix forward from `start` until `end`.
///
/// Empty when there is no path or the hops loop. Out-of-range indices and
/// ragged rows are errors.
pub fn next_hop_path(
    next: &NextHopMatrix,
    start: VertexId,
    end: VertexId,
) -> Result<Vec<VertexId>, GraphError> {
    let n = next.len();
    let hop_from = |vertex: VertexId| -> Result<Option<VertexId>, GraphError> {
        let row = next
            .get(vertex)
            .ok_or(GraphError::VertexOutOfRange { vertex, count: n })?;
        let hop = row.get(end).ok_or(GraphError::NotSquare {
            row: vertex,
            len: row.len(),
            expected: n,
        })?;
        match *hop {
            Some(hop) if hop >= n => Err(GraphError::VertexOutOfRange { vertex: hop, count: n }),
            hop => Ok(hop),
        }
    };
    if end >= n {
        return Err(GraphError::VertexOutOfRange { vertex: end, count: n });
    }

    let mut path = vec![start];
    let mut current = start;
    while current != end {
        match hop_from(current)? {
            Some(hop) if path.len() <= n => {
                path.push(hop);
                current = hop;
            }
            _ => return Ok(Vec::new()),
        }
    }
    Ok(path)
}

/// Which all-pairs algorithm produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    Dijkstra,
    FloydWarshall,
}

impl Algorithm {
    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "Dijkstra",
            Algorithm::FloydWarshall => "Floyd-Warshall",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Auxiliary path data from an all-pairs run.
#[derive(Debug, Clone, PartialEq)]
pub enum PathTrace {
    /// One parent array per source vertex
    Parents(Vec<ParentArray>),
    /// Floyd-Warshall next-hop matrix
    NextHop(NextHopMatrix),
}

impl PathTrace {
    pub fn path(&self, start: VertexId, end: VertexId) -> Result<Vec<VertexId>, GraphError> {
        match self {
            PathTrace::Parents(parents) => {
                let row = parents.get(start).ok_or(GraphError::VertexOutOfRange {
                    vertex: start,
                    count: parents.len(),
                })?;
                reconstruct_path(row, start, end)
            }
            PathTrace::NextHop(next) => next_hop_path(next, start, end),
        }
    }
}

/// Distances and path data for every ordered pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AllPairs {
    pub algorithm: Algorithm,
    pub distances: DistanceTable,
    pub trace: PathTrace,
}

impl AllPairs {
    pub fn dijkstra(graph: &Graph) -> Self {
        let (distances, parents) = dijkstra_all_pairs(graph);
        Self {
            algorithm: Algorithm::Dijkstra,
            distances,
            trace: PathTrace::Parents(parents),
        }
    }

    pub fn floyd_warshall(graph: &Graph) -> Self {
        let (distances, next) = floyd_warshall(graph);
        Self {
            algorithm: Algorithm::FloydWarshall,
            distances,
            trace: PathTrace::NextHop(next),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.distances.len()
    }

    pub fn distance(&self, start: VertexId, end: VertexId) -> Option<Distance> {
        self.distances.get(start)?.get(end).copied()
    }

    pub fn path(&self, start: VertexId, end: VertexId) -> Result<Vec<VertexId>, GraphError> {
        self.trace.path(start, end)
    }
}

/// One line of an all-pairs listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSummary {
    pub from: VertexId,
    pub to: VertexId,
    /// Empty when no path exists
    pub path: Vec<VertexId>,
    pub distance: Distance,
}

impl PathSummary {
    pub fn is_reachable(&self) -> bool {
        !self.path.is_empty()
    }
}

impl fmt::Display for PathSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reachable() {
            write!(
                f,
                "Path from {} to {}: {}, length: {}",
                self.from,
                self.to,
                format_path(&self.path),
                self.distance
            )
        } else {
            write!(f, "Path from {} to {}: does not exist", self.from, self.to)
        }
    }
}

/// Listing of every ordered pair `i != j` in row-major order.
pub fn all_pairs_report(result: &AllPairs) -> Result<Vec<PathSummary>, GraphError> {
    let n = result.vertex_count();
    let mut report = Vec::with_capacity(n * n.saturating_sub(1));
    for from in 0..n {
        for to in 0..n {
            if from == to {
                continue;
            }
            report.push(PathSummary {
                from,
                to,
                path: result.path(from, to)?,
                distance: result.distance(from, to).unwrap_or(INFINITY),
            });
        }
    }
    Ok(report)
}

/// Wall-clock comparison of the two all-pairs algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgorithmTiming {
    pub dijkstra: Duration,
    pub floyd_warshall: Duration,
    /// Whether both produced identical distance tables
    pub tables_agree: bool,
}

impl fmt::Display for AlgorithmTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dijkstra:       {:.6} s", self.dijkstra.as_secs_f64())?;
        writeln!(f, "Floyd-Warshall: {:.6} s", self.floyd_warshall.as_secs_f64())?;
        write!(
            f,
            "Distance tables {}",
            if self.tables_agree { "agree" } else { "differ" }
        )
    }
}

pub fn compare_algorithms(graph: &Graph) -> AlgorithmTiming {
    let start = Instant::now();
    let (dijkstra_table, _) = dijkstra_all_pairs(graph);
    let dijkstra = start.elapsed();

    let start = Instant::now();
    let (floyd_table, _) = floyd_warshall(graph);
    let floyd = start.elapsed();

    let timing = AlgorithmTiming {
        dijkstra,
        floyd_warshall: floyd,
        tables_agree: dijkstra_table == floyd_table,
    };
    debug!(
        vertices = graph.vertex_count(),
        dijkstra_us = dijkstra.as_micros() as u64,
        floyd_us = floyd.as_micros() as u64,
        agree = timing.tables_agree,
        "algorithm comparison"
    );
    timing
}

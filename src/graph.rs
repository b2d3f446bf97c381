//! Weighted directed graph stored as an adjacency matrix
//!
//! [`Graph`] is an immutable snapshot handed to the algorithms. All editing
//! goes through [`EdgeList`], which keeps the ordered list of
//! `(source, target, weight)` triples and rebuilds a fresh matrix on demand.

use crate::{VertexId, Weight};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default vertex cap used by the editor.
pub const DEFAULT_MAX_VERTICES: usize = 10;

/// Graph model errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("vertex {vertex} out of range (vertex count {count})")]
    VertexOutOfRange { vertex: VertexId, count: usize },

    #[error("no edge {from} -> {to}")]
    EdgeNotFound { from: VertexId, to: VertexId },

    #[error("self-loop on vertex {0} is not allowed")]
    SelfLoop(VertexId),

    #[error("vertex limit of {0} reached")]
    VertexLimit(usize),

    #[error("adjacency matrix is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare { row: usize, len: usize, expected: usize },
}

/// A directed, weighted edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: VertexId,
    pub target: VertexId,
    pub weight: Weight,
}

impl Edge {
    pub fn new(source: VertexId, target: VertexId, weight: Weight) -> Self {
        Self {
            source,
            target,
            weight,
        }
    }
}

impl From<Edge> for (VertexId, VertexId, Weight) {
    fn from(edge: Edge) -> Self {
        (edge.source, edge.target, edge.weight)
    }
}

impl From<(VertexId, VertexId, Weight)> for Edge {
    fn from((source, target, weight): (VertexId, VertexId, Weight)) -> Self {
        Self::new(source, target, weight)
    }
}

/// Square adjacency matrix. `weights[i][j] == 0` means there is no edge i -> j.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Graph {
    weights: Vec<Vec<Weight>>,
}

impl Graph {
    /// Graph with `n` vertices and no edges.
    pub fn new(n: usize) -> Self {
        Self {
            weights: vec![vec![0; n]; n],
        }
    }

    /// Rebuild the matrix from a vertex count and a list of triples.
    ///
    /// Every triple is checked before the matrix is built. When the same
    /// ordered pair appears twice the later weight wins.
    pub fn from_edges<I>(n: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (VertexId, VertexId, Weight)>,
    {
        let edges: Vec<Edge> = edges.into_iter().map(Edge::from).collect();
        for edge in &edges {
            check_index(edge.source, n)?;
            check_index(edge.target, n)?;
            if edge.source == edge.target && edge.weight != 0 {
                return Err(GraphError::SelfLoop(edge.source));
            }
        }
        Ok(Self::assemble(n, &edges))
    }

    /// Wrap an existing matrix, rejecting non-square input and self-loops.
    pub fn from_matrix(weights: Vec<Vec<Weight>>) -> Result<Self, GraphError> {
        let n = weights.len();
        for (row, entries) in weights.iter().enumerate() {
            if entries.len() != n {
                return Err(GraphError::NotSquare {
                    row,
                    len: entries.len(),
                    expected: n,
                });
            }
            if entries[row] != 0 {
                return Err(GraphError::SelfLoop(row));
            }
        }
        Ok(Self { weights })
    }

    /// Build without validation. Callers guarantee indices are in range.
    fn assemble(n: usize, edges: &[Edge]) -> Self {
        let mut graph = Self::new(n);
        for edge in edges {
            graph.weights[edge.source][edge.target] = edge.weight;
        }
        graph
    }

    pub fn vertex_count(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Fail with [`GraphError::VertexOutOfRange`] unless `v < vertex_count()`.
    pub fn check_vertex(&self, v: VertexId) -> Result<(), GraphError> {
        check_index(v, self.vertex_count())
    }

    /// Raw matrix entry; `0` for "no edge".
    pub fn weight(&self, from: VertexId, to: VertexId) -> Result<Weight, GraphError> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;
        Ok(self.weights[from][to])
    }

    /// Weight of edge `from -> to`, or `None` if absent or out of range.
    pub fn edge(&self, from: VertexId, to: VertexId) -> Option<Weight> {
        self.weights
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .filter(|&w| w != 0)
    }

    /// Out-neighbors of `v` with their weights, in ascending index order.
    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item = (VertexId, Weight)> + '_ {
        self.weights
            .get(v)
            .into_iter()
            .flat_map(|row| row.iter().copied().enumerate())
            .filter(|&(_, w)| w != 0)
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.neighbors(v).count()
    }

    /// All edges in row-major order.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for (source, row) in self.weights.iter().enumerate() {
            for (target, &weight) in row.iter().enumerate() {
                if weight != 0 {
                    edges.push(Edge::new(source, target, weight));
                }
            }
        }
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.weights
            .iter()
            .map(|row| row.iter().filter(|&&w| w != 0).count())
            .sum()
    }

    pub fn matrix(&self) -> &[Vec<Weight>] {
        &self.weights
    }

    /// Vertex × edge incidence matrix: `1` in the source row and `-1` in the
    /// target row of each column. Columns follow [`Graph::edges`] order.
    pub fn incidence_matrix(&self) -> Vec<Vec<i8>> {
        let edges = self.edges();
        let mut incidence = vec![vec![0i8; edges.len()]; self.vertex_count()];
        for (column, edge) in edges.iter().enumerate() {
            incidence[edge.source][column] = 1;
            incidence[edge.target][column] = -1;
        }
        incidence
    }
}

fn check_index(v: VertexId, count: usize) -> Result<(), GraphError> {
    if v < count {
        Ok(())
    } else {
        Err(GraphError::VertexOutOfRange { vertex: v, count })
    }
}

/// Editable graph description: a vertex count plus an ordered edge list.
///
/// Each failing operation leaves the list untouched. [`EdgeList::build`] is
/// the explicit rebuild step that produces a new [`Graph`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeList {
    vertex_count: usize,
    edges: Vec<Edge>,
    max_vertices: Option<usize>,
}

impl Default for EdgeList {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAX_VERTICES))
    }
}

impl EdgeList {
    /// Empty editor. `max_vertices = None` removes the vertex cap.
    pub fn new(max_vertices: Option<usize>) -> Self {
        Self {
            vertex_count: 0,
            edges: Vec::new(),
            max_vertices,
        }
    }

    /// Editor pre-populated from triples. Indices, self-loops and the vertex
    /// cap are all checked before anything is stored. A repeated pair keeps
    /// the first position and the last weight, matching [`Graph::from_edges`].
    pub fn from_edges<I>(
        vertex_count: usize,
        edges: I,
        max_vertices: Option<usize>,
    ) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (VertexId, VertexId, Weight)>,
    {
        if let Some(limit) = max_vertices {
            if vertex_count > limit {
                return Err(GraphError::VertexLimit(limit));
            }
        }
        let mut list = Self::new(max_vertices);
        list.vertex_count = vertex_count;
        for edge in edges {
            let edge = Edge::from(edge);
            check_index(edge.source, vertex_count)?;
            check_index(edge.target, vertex_count)?;
            if edge.source == edge.target {
                return Err(GraphError::SelfLoop(edge.source));
            }
            match list.position(edge.source, edge.target) {
                Some(idx) => list.edges[idx].weight = edge.weight,
                None => list.edges.push(edge),
            }
        }
        Ok(list)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn max_vertices(&self) -> Option<usize> {
        self.max_vertices
    }

    pub fn add_vertex(&mut self) -> Result<VertexId, GraphError> {
        if let Some(limit) = self.max_vertices {
            if self.vertex_count >= limit {
                return Err(GraphError::VertexLimit(limit));
            }
        }
        self.vertex_count += 1;
        Ok(self.vertex_count - 1)
    }

    /// Remove `v` and its incident edges; every index above `v` shifts down by one.
    pub fn remove_vertex(&mut self, v: VertexId) -> Result<(), GraphError> {
        check_index(v, self.vertex_count)?;
        let shift = |idx: VertexId| if idx > v { idx - 1 } else { idx };
        self.edges = self
            .edges
            .iter()
            .filter(|e| e.source != v && e.target != v)
            .map(|e| Edge::new(shift(e.source), shift(e.target), e.weight))
            .collect();
        self.vertex_count -= 1;
        Ok(())
    }

    fn position(&self, from: VertexId, to: VertexId) -> Option<usize> {
        self.edges
            .iter()
            .position(|e| e.source == from && e.target == to)
    }

    fn check_pair(&self, from: VertexId, to: VertexId) -> Result<(), GraphError> {
        check_index(from, self.vertex_count)?;
        check_index(to, self.vertex_count)?;
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        Ok(())
    }

    /// Add `from -> to`. A missing or zero weight becomes `1`; an existing edge
    /// between the same pair has its weight replaced.
    pub fn add_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        weight: Option<Weight>,
    ) -> Result<(), GraphError> {
        self.check_pair(from, to)?;
        let weight = match weight {
            Some(w) if w != 0 => w,
            _ => 1,
        };
        match self.position(from, to) {
            Some(idx) => self.edges[idx].weight = weight,
            None => self.edges.push(Edge::new(from, to, weight)),
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, from: VertexId, to: VertexId) -> Result<Edge, GraphError> {
        let idx = self
            .position(from, to)
            .ok_or(GraphError::EdgeNotFound { from, to })?;
        Ok(self.edges.remove(idx))
    }

    pub fn set_weight(
        &mut self,
        from: VertexId,
        to: VertexId,
        weight: Weight,
    ) -> Result<(), GraphError> {
        let idx = self
            .position(from, to)
            .ok_or(GraphError::EdgeNotFound { from, to })?;
        self.edges[idx].weight = weight;
        Ok(())
    }

    /// Turn `from -> to` into `to -> from`, keeping its weight. An edge that
    /// already ran `to -> from` is replaced.
    pub fn reverse_edge(&mut self, from: VertexId, to: VertexId) -> Result<(), GraphError> {
        let idx = self
            .position(from, to)
            .ok_or(GraphError::EdgeNotFound { from, to })?;
        self.edges[idx] = Edge::new(to, from, self.edges[idx].weight);
        if let Some(old) = self
            .edges
            .iter()
            .enumerate()
            .position(|(i, e)| i != idx && e.source == to && e.target == from)
        {
            self.edges.remove(old);
        }
        Ok(())
    }

    /// Rebuild the adjacency matrix from the current edge list.
    pub fn build(&self) -> Graph {
        Graph::assemble(self.vertex_count, &self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_edges() -> Vec<(usize, usize, Weight)> {
        vec![(0, 1, 1), (1, 2, 1), (0, 2, 5), (2, 3, 1)]
    }

    #[test]
    fn test_from_edges_builds_square_matrix() {
        let graph = Graph::from_edges(4, sample_edges()).unwrap();
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.matrix().iter().all(|row| row.len() == 4));
        assert_eq!(graph.edge(0, 2), Some(5));
        assert_eq!(graph.edge(2, 0), None);
        assert_eq!(graph.weight(3, 0).unwrap(), 0);
    }

    #[test]
    fn test_from_edges_rejects_out_of_range() {
        let err = Graph::from_edges(3, vec![(0, 1, 1), (1, 3, 2)]).unwrap_err();
        assert_eq!(err, GraphError::VertexOutOfRange { vertex: 3, count: 3 });
    }

    #[test]
    fn test_from_edges_later_duplicate_wins() {
        let graph = Graph::from_edges(2, vec![(0, 1, 4), (0, 1, 7)]).unwrap();
        assert_eq!(graph.edge(0, 1), Some(7));
    }

    #[test]
    fn test_from_matrix_rejects_non_square() {
        let err = Graph::from_matrix(vec![vec![0, 1], vec![0]]).unwrap_err();
        assert!(matches!(err, GraphError::NotSquare { row: 1, .. }));
        assert_eq!(
            Graph::from_matrix(vec![vec![3]]).unwrap_err(),
            GraphError::SelfLoop(0)
        );
    }

    #[test]
    fn test_weight_out_of_range_fails_loudly() {
        let graph = Graph::new(2);
        assert!(graph.weight(0, 2).is_err());
        assert_eq!(graph.edge(5, 0), None);
        assert_eq!(graph.neighbors(9).count(), 0);
    }

    #[test]
    fn test_neighbors_ascending() {
        let graph = Graph::from_edges(4, vec![(0, 3, 2), (0, 1, 1), (0, 2, 9)]).unwrap();
        let targets: Vec<_> = graph.neighbors(0).map(|(v, _)| v).collect();
        assert_eq!(targets, vec![1, 2, 3]);
        assert_eq!(graph.out_degree(0), 3);
        assert_eq!(graph.out_degree(1), 0);
    }

    #[test]
    fn test_incidence_matrix() {
        let graph = Graph::from_edges(3, vec![(0, 1, 1), (2, 0, 4)]).unwrap();
        let incidence = graph.incidence_matrix();
        assert_eq!(incidence, vec![vec![1, -1], vec![-1, 0], vec![0, 1]]);
    }

    #[test]
    fn test_remove_vertex_shifts_indices() {
        let mut list = EdgeList::from_edges(4, sample_edges(), None).unwrap();
        list.remove_vertex(1).unwrap();
        assert_eq!(list.vertex_count(), 3);
        // 0->2 becomes 0->1, 2->3 becomes 1->2, edges through 1 are gone
        assert_eq!(list.edges(), &[Edge::new(0, 1, 5), Edge::new(1, 2, 1)]);
        let graph = list.build();
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge(1, 2), Some(1));
    }

    #[test]
    fn test_vertex_limit() {
        let mut list = EdgeList::new(Some(2));
        assert_eq!(list.add_vertex().unwrap(), 0);
        assert_eq!(list.add_vertex().unwrap(), 1);
        assert_eq!(list.add_vertex().unwrap_err(), GraphError::VertexLimit(2));
        assert_eq!(list.vertex_count(), 2);
    }

    #[test]
    fn test_add_edge_defaults_weight_to_one() {
        let mut list = EdgeList::new(None);
        list.add_vertex().unwrap();
        list.add_vertex().unwrap();
        list.add_edge(0, 1, None).unwrap();
        assert_eq!(list.build().edge(0, 1), Some(1));
        list.add_edge(0, 1, Some(0)).unwrap();
        assert_eq!(list.edges().len(), 1);
        list.add_edge(0, 1, Some(6)).unwrap();
        assert_eq!(list.build().edge(0, 1), Some(6));
        assert_eq!(list.add_edge(1, 1, None).unwrap_err(), GraphError::SelfLoop(1));
    }

    #[test]
    fn test_failed_edit_leaves_list_unchanged() {
        let mut list = EdgeList::from_edges(3, vec![(0, 1, 2)], None).unwrap();
        let before = list.clone();
        assert!(list.add_edge(0, 7, Some(1)).is_err());
        assert!(list.remove_edge(1, 0).is_err());
        assert!(list.set_weight(2, 1, 4).is_err());
        assert!(list.remove_vertex(3).is_err());
        assert_eq!(list, before);
    }

    #[test]
    fn test_reverse_edge_replaces_opposite() {
        let mut list = EdgeList::from_edges(2, vec![(0, 1, 2), (1, 0, 9)], None).unwrap();
        list.reverse_edge(0, 1).unwrap();
        assert_eq!(list.edges(), &[Edge::new(1, 0, 2)]);
        let graph = list.build();
        assert_eq!(graph.edge(1, 0), Some(2));
        assert_eq!(graph.edge(0, 1), None);
    }

    #[test]
    fn test_set_weight_and_remove_edge() {
        let mut list = EdgeList::from_edges(3, vec![(0, 1, 2), (1, 2, 3)], None).unwrap();
        list.set_weight(1, 2, 8).unwrap();
        assert_eq!(list.build().edge(1, 2), Some(8));
        let removed = list.remove_edge(0, 1).unwrap();
        assert_eq!(removed, Edge::new(0, 1, 2));
        assert_eq!(list.build().edge_count(), 1);
    }

    #[test]
    fn test_editor_collapses_duplicate_pairs() {
        let mut list = EdgeList::from_edges(2, vec![(0, 1, 4), (0, 1, 7)], None).unwrap();
        assert_eq!(list.edges(), &[Edge::new(0, 1, 7)]);
        assert_eq!(list.build().edge(0, 1), Some(7));

        list.set_weight(0, 1, 2).unwrap();
        assert_eq!(list.build().edge(0, 1), Some(2));
        list.remove_edge(0, 1).unwrap();
        assert_eq!(list.build().edge(0, 1), None);
        assert!(list.edges().is_empty());
    }
}

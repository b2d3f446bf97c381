//! Persisted graph description
//!
//! The on-disk shape is a JSON object with optional start/end vertex
//! indices, per-vertex canvas coordinates and `[source, target, weight]`
//! edge triples. Coordinates are cosmetic; vertex count, edge set and weights
//! round-trip exactly.
//!
//! Loading is all-or-nothing: the whole snapshot is validated before an
//! [`EdgeList`] is built from it.

use crate::graph::{EdgeList, Graph, GraphError};
use crate::{VertexId, Weight};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid graph: {0}")]
    Invalid(#[from] GraphError),

    #[error("{role} vertex {vertex} out of range (vertex count {count})")]
    Selection {
        role: &'static str,
        vertex: VertexId,
        count: usize,
    },
}

/// Canvas bounding box of a vertex: `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub coords: [f64; 4],
}

impl VertexRecord {
    pub fn at(x: f64, y: f64) -> Self {
        const RADIUS: f64 = 15.0;
        Self {
            coords: [x - RADIUS, y - RADIUS, x + RADIUS, y + RADIUS],
        }
    }

    pub fn center(&self) -> (f64, f64) {
        let [x0, y0, x1, y1] = self.coords;
        ((x0 + x1) / 2.0, (y0 + y1) / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub start_vertex: Option<VertexId>,
    #[serde(default)]
    pub end_vertex: Option<VertexId>,
    pub vertices: Vec<VertexRecord>,
    pub edges: Vec<(VertexId, VertexId, Weight)>,
}

impl GraphSnapshot {
    /// Snapshot of an editor. Vertices without known coordinates are laid
    /// out on a row.
    pub fn from_edge_list(
        list: &EdgeList,
        vertices: &[VertexRecord],
        start_vertex: Option<VertexId>,
        end_vertex: Option<VertexId>,
    ) -> Self {
        let vertices = (0..list.vertex_count())
            .map(|i| {
                vertices
                    .get(i)
                    .copied()
                    .unwrap_or_else(|| VertexRecord::at(40.0 + 60.0 * i as f64, 40.0))
            })
            .collect();
        Self {
            start_vertex,
            end_vertex,
            vertices,
            edges: list
                .edges()
                .iter()
                .copied()
                .map(Into::into)
                .collect(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Check every edge index and the start/end selection.
    pub fn validate(&self) -> Result<(), PersistError> {
        let count = self.vertex_count();
        for (role, vertex) in [("start", self.start_vertex), ("end", self.end_vertex)] {
            if let Some(vertex) = vertex {
                if vertex >= count {
                    return Err(PersistError::Selection {
                        role,
                        vertex,
                        count,
                    });
                }
            }
        }
        EdgeList::from_edges(count, self.edges.iter().copied(), None)?;
        Ok(())
    }

    /// Rebuild the editor. `max_vertices` applies the editor's vertex cap.
    pub fn to_edge_list(&self, max_vertices: Option<usize>) -> Result<EdgeList, PersistError> {
        self.validate()?;
        Ok(EdgeList::from_edges(
            self.vertex_count(),
            self.edges.iter().copied(),
            max_vertices,
        )?)
    }

    pub fn to_graph(&self) -> Result<Graph, PersistError> {
        Ok(self.to_edge_list(None)?.build())
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), vertices = self.vertex_count(), edges = self.edges.len(), "graph saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;
        debug!(path = %path.display(), vertices = snapshot.vertex_count(), "graph loaded");
        Ok(snapshot)
    }
}

/// Default save location for a numbered task, as `saves/graph_<task>.json`.
pub fn save_path(dir: impl AsRef<Path>, task: &str) -> std::path::PathBuf {
    dir.as_ref().join(format!("graph_{}.json", task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_original_shape() {
        let json = r#"{
            "start_vertex": 0,
            "end_vertex": 2,
            "vertices": [
                {"coords": [85.0, 85.0, 115.0, 115.0]},
                {"coords": [185.0, 85.0, 215.0, 115.0]},
                {"coords": [285.0, 85.0, 315.0, 115.0]}
            ],
            "edges": [[0, 1, 4], [1, 2, 6]]
        }"#;
        let snapshot = GraphSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.vertex_count(), 3);
        assert_eq!(snapshot.vertices[1].center(), (200.0, 100.0));
        let graph = snapshot.to_graph().unwrap();
        assert_eq!(graph.edge(1, 2), Some(6));
    }

    #[test]
    fn test_missing_selection_defaults_to_none() {
        let snapshot =
            GraphSnapshot::from_json(r#"{"vertices": [{"coords": [0,0,30,30]}], "edges": []}"#)
                .unwrap();
        assert_eq!(snapshot.start_vertex, None);
        assert_eq!(snapshot.end_vertex, None);
    }

    #[test]
    fn test_rejects_bad_edge_index() {
        let json = r#"{"vertices": [{"coords": [0,0,30,30]}], "edges": [[0, 3, 1]]}"#;
        assert!(matches!(
            GraphSnapshot::from_json(json),
            Err(PersistError::Invalid(GraphError::VertexOutOfRange { vertex: 3, .. }))
        ));
    }

    #[test]
    fn test_rejects_bad_selection() {
        let json = r#"{"end_vertex": 5, "vertices": [], "edges": []}"#;
        assert!(matches!(
            GraphSnapshot::from_json(json),
            Err(PersistError::Selection { role: "end", vertex: 5, count: 0 })
        ));
    }

    #[test]
    fn test_missing_field_is_error() {
        assert!(matches!(
            GraphSnapshot::from_json(r#"{"vertices": []}"#),
            Err(PersistError::Json(_))
        ));
    }

    #[test]
    fn test_save_path() {
        assert_eq!(
            save_path("saves", "3"),
            std::path::PathBuf::from("saves/graph_3.json")
        );
    }
}

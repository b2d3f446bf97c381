//! Simulated packet records

use crate::{format_path, VertexId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Default packet size range in bytes
pub const DEFAULT_PACKET_SIZE: RangeInclusive<u32> = 100..=1000;

/// One delivered packet. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// 1-based number within the run
    number: usize,
    path: Vec<VertexId>,
    size_bytes: u32,
    hop_limit: usize,
}

impl PacketRecord {
    /// The hop limit is derived from the path: `len(path) - 1`.
    pub fn new(number: usize, path: Vec<VertexId>, size_bytes: u32) -> Self {
        let hop_limit = path.len().saturating_sub(1);
        Self {
            number,
            path,
            size_bytes,
            hop_limit,
        }
    }

    /// Record with a size drawn uniformly from `sizes`.
    pub fn with_random_size<R: Rng>(
        number: usize,
        path: Vec<VertexId>,
        sizes: RangeInclusive<u32>,
        rng: &mut R,
    ) -> Self {
        let size = rng.gen_range(sizes);
        Self::new(number, path, size)
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn path(&self) -> &[VertexId] {
        &self.path
    }

    pub fn size_bytes(&self) -> u32 {
        self.size_bytes
    }

    pub fn hop_limit(&self) -> usize {
        self.hop_limit
    }

    pub fn sender(&self) -> Option<VertexId> {
        self.path.first().copied()
    }

    pub fn receiver(&self) -> Option<VertexId> {
        self.path.last().copied()
    }
}

impl fmt::Display for PacketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let endpoint = |v: Option<VertexId>| v.map(|v| v.to_string()).unwrap_or_default();
        writeln!(f, "Packet #{}", self.number)?;
        writeln!(f, "  Sender:    vertex {}", endpoint(self.sender()))?;
        writeln!(f, "  Receiver:  vertex {}", endpoint(self.receiver()))?;
        writeln!(f, "  Route:     {}", format_path(&self.path))?;
        writeln!(f, "  Size:      {} bytes", self.size_bytes)?;
        write!(f, "  Hop limit: {} hops", self.hop_limit)
    }
}

//! Tolerance-based vertex merging.
//!
//! A new vertex merges into the lowest-indexed pooled vertex within the
//! tolerance on every axis. The pooled vertex moves to the midpoint of the
//! two, so later lookups see the moved position. Equality under a tolerance
//! is not transitive, which makes the result depend on insertion order;
//! that order is the face order of the source mesh.
//!
//! Lookups go through a uniform grid with cells twice as wide as the
//! tolerance, so any match lies in the 27 cells around the query. Taking
//! the smallest matching index gives the same answer as scanning the pool
//! from the start.

use crate::types::Vertex;
use std::collections::HashMap;

type Cell = (i64, i64, i64);

/// Vertex pool for one mesh.
#[derive(Debug, Clone)]
pub struct VertexPool {
    vertices: Vec<Vertex>,
    grid: HashMap<Cell, Vec<usize>>,
    tolerance: f64,
    cell_size: f64,
    merge: bool,
}

impl VertexPool {
    /// Pool that merges vertices within `tolerance`.
    pub fn merging(tolerance: f64) -> Self {
        Self {
            vertices: Vec::new(),
            grid: HashMap::new(),
            tolerance,
            cell_size: if tolerance > 0.0 { tolerance * 2.0 } else { 1.0 },
            merge: true,
        }
    }

    /// Pool that keeps every vertex, for meshes too big to merge.
    pub fn raw() -> Self {
        Self {
            merge: false,
            ..Self::merging(0.0)
        }
    }

    /// Add a vertex, returning the index it ended up at.
    pub fn insert(&mut self, vertex: Vertex) -> usize {
        if !self.merge {
            self.vertices.push(vertex);
            return self.vertices.len() - 1;
        }

        if let Some(existing) = self.find(&vertex) {
            let before = self.cell_of(&self.vertices[existing]);
            self.vertices[existing].merge_midpoint(&vertex);
            let after = self.cell_of(&self.vertices[existing]);
            if before != after {
                if let Some(bucket) = self.grid.get_mut(&before) {
                    bucket.retain(|&i| i != existing);
                }
                self.grid.entry(after).or_default().push(existing);
            }
            return existing;
        }

        let index = self.vertices.len();
        let cell = self.cell_of(&vertex);
        self.vertices.push(vertex);
        self.grid.entry(cell).or_default().push(index);
        index
    }

    /// Lowest pooled index equal to `vertex` under the tolerance.
    fn find(&self, vertex: &Vertex) -> Option<usize> {
        let (cx, cy, cz) = self.cell_of(vertex);
        let mut best: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &i in bucket {
                        if best.map_or(true, |b| i < b)
                            && self.vertices[i].equals(vertex, self.tolerance)
                        {
                            best = Some(i);
                        }
                    }
                }
            }
        }
        best
    }

    fn cell_of(&self, v: &Vertex) -> Cell {
        (
            (v.x / self.cell_size).floor() as i64,
            (v.y / self.cell_size).floor() as i64,
            (v.z / self.cell_size).floor() as i64,
        )
    }

    pub fn get(&self, index: usize) -> &Vertex {
        &self.vertices[index]
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}

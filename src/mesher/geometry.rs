//! Face and mesh types produced by the mesh builder.

use crate::types::{FaceFlags, Uv, Vertex};

/// A triangle or quad referencing vertices in its mesh's pool.
///
/// Corner order is the winding order and encodes the front face.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Indices into the owning mesh's vertex pool.
    pub vertices: Vec<usize>,
    /// One UV per corner.
    pub uvs: Vec<Uv>,
    pub flags: FaceFlags,
    /// Panel face whose UVs stay inside the legal 1024x768 panel area.
    pub kosher: bool,
    /// Index of the source polygon, for error reporting.
    pub source: usize,
}

impl Face {
    pub fn new(flags: FaceFlags, source: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(4),
            uvs: Vec::with_capacity(4),
            flags,
            kosher: false,
            source,
        }
    }

    pub fn add_corner(&mut self, vertex: usize, uv: Uv) {
        self.vertices.push(vertex);
        self.uvs.push(uv);
    }

    /// Number of corners (3 or 4 once built).
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_triangle(&self) -> bool {
        self.vertices.len() == 3
    }

    pub fn is_quad(&self) -> bool {
        self.vertices.len() == 4
    }
}

/// Faces built from one scene object, plus the vertex pool they share.
///
/// Faces can be taken out of the pool while strips are assembled. A taken
/// face keeps its index so vertex back-references stay valid.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    available: Vec<bool>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>) -> Self {
        Self {
            name: name.into(),
            vertices,
            faces: Vec::new(),
            available: Vec::new(),
        }
    }

    /// Add a face and record it on each of its vertices. Returns its index.
    pub fn add_face(&mut self, face: Face) -> usize {
        let index = self.faces.len();
        for &v in &face.vertices {
            self.vertices[v].add_face(index);
        }
        self.faces.push(face);
        self.available.push(true);
        index
    }

    pub fn vertex(&self, index: usize) -> &Vertex {
        &self.vertices[index]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn face(&self, index: usize) -> &Face {
        &self.faces[index]
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the face is still waiting to be placed in a strip.
    pub fn is_available(&self, index: usize) -> bool {
        self.available[index]
    }

    /// Take a face out of the pool.
    pub fn take(&mut self, index: usize) {
        self.available[index] = false;
    }

    /// Put a previously taken face back.
    pub fn restore(&mut self, index: usize) {
        self.available[index] = true;
    }

    pub fn available_count(&self) -> usize {
        self.available.iter().filter(|a| **a).count()
    }

    /// Tolerance comparison of two pooled vertices.
    pub fn vertices_equal(&self, a: usize, b: usize, tolerance: f64) -> bool {
        self.vertices[a].equals(&self.vertices[b], tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<Vertex> {
        vec![
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0),
            Vertex::new(1.0, 1.0, 0.0),
            Vertex::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_add_face_records_back_references() {
        let mut mesh = Mesh::new("m", pool());
        let mut a = Face::new(FaceFlags::NONE, 0);
        for v in [0, 1, 2] {
            a.add_corner(v, Uv::default());
        }
        let mut b = Face::new(FaceFlags::NONE, 1);
        for v in [0, 2, 3] {
            b.add_corner(v, Uv::default());
        }
        assert_eq!(mesh.add_face(a), 0);
        assert_eq!(mesh.add_face(b), 1);

        assert_eq!(mesh.vertex(0).faces(), &[0, 1]);
        assert_eq!(mesh.vertex(1).faces(), &[0]);
        assert_eq!(mesh.vertex(3).faces(), &[1]);
    }

    #[test]
    fn test_take_and_restore() {
        let mut mesh = Mesh::new("m", pool());
        let mut a = Face::new(FaceFlags::NONE, 0);
        for v in [0, 1, 2] {
            a.add_corner(v, Uv::default());
        }
        mesh.add_face(a);

        assert_eq!(mesh.available_count(), 1);
        mesh.take(0);
        assert!(!mesh.is_available(0));
        mesh.restore(0);
        assert!(mesh.is_available(0));
    }
}

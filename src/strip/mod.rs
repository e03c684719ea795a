//! Strip and fan assembly.
//!
//! Groups the faces of one bucket into `tri_fan` and `quad_strip`
//! primitives. Two faces join when they have the same flags and corner
//! count, share an edge walked in opposite directions (same facing), and
//! carry matching UVs along that edge. Anything that doesn't join is
//! written as a single `tri` or `quad`.

use crate::mesher::Mesh;
use crate::types::{BucketKey, VERTEX_TOLERANCE};

/// Tri fans shorter than this render with a bad apex normal unless the
/// object is a CSL.
pub const MIN_FAN_FACES: usize = 8;

/// An ordered run of faces from one mesh, written as a single primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strip {
    /// Index of the mesh in the layer's mesh list.
    pub mesh: usize,
    /// Face indices within that mesh, in output order.
    pub faces: Vec<usize>,
    /// Corner of the first face the primitive starts from.
    pub first_vertex: usize,
    /// Corners per face: 3 or 4.
    pub sides: usize,
}

impl Strip {
    pub fn single(mesh: usize, face: usize, sides: usize) -> Self {
        Self {
            mesh,
            faces: vec![face],
            first_vertex: 0,
            sides,
        }
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.faces.len() == 1
    }

    pub fn is_triangles(&self) -> bool {
        self.sides == 3
    }
}

/// Builds strips out of the available faces of a mesh.
#[derive(Debug, Clone)]
pub struct StripBuilder {
    csl: bool,
    tolerance: f64,
}

impl Default for StripBuilder {
    fn default() -> Self {
        Self {
            csl: false,
            tolerance: VERTEX_TOLERANCE,
        }
    }
}

impl StripBuilder {
    pub fn new(csl: bool, tolerance: f64) -> Self {
        Self { csl, tolerance }
    }

    /// Take every available face of `mesh` in `bucket` and group it into
    /// strips. Faces are consumed in mesh order, each exactly once.
    pub fn make_strips(&self, mesh: &mut Mesh, mesh_index: usize, bucket: BucketKey) -> Vec<Strip> {
        let mut strips = Vec::new();
        for start in 0..mesh.face_count() {
            if !mesh.is_available(start) || mesh.face(start).flags.bucket() != bucket {
                continue;
            }
            mesh.take(start);

            let face = mesh.face(start);
            let strip = if face.flags.is_hard() || face.flags.is_panel() {
                Strip::single(mesh_index, start, face.len())
            } else if face.is_triangle() {
                self.grow_fan(mesh, mesh_index, start, bucket)
            } else {
                self.grow_quad_strip(mesh, mesh_index, start)
            };
            strips.push(strip);
        }
        strips
    }

    /// Try to grow a tri fan around the start face's busiest vertex.
    fn grow_fan(&self, mesh: &mut Mesh, mesh_index: usize, start: usize, bucket: BucketKey) -> Strip {
        let face = mesh.face(start);
        let flat = face.flags.is_flat();
        let counts: Vec<usize> = face
            .vertices
            .iter()
            .map(|&v| {
                mesh.vertex(v)
                    .faces()
                    .iter()
                    .filter(|&&fi| {
                        mesh.is_available(fi)
                            && mesh.face(fi).is_triangle()
                            && mesh.face(fi).flags.bucket() == bucket
                    })
                    .count()
            })
            .collect();
        let centre = if counts[0] >= counts[1] && counts[0] >= counts[2] {
            0
        } else if counts[1] >= counts[2] {
            1
        } else {
            2
        };

        let mut first_vertex = (centre + 2) % 3;
        let mut faces = vec![start];
        for order in [0, 2] {
            let mut current = start;
            let mut v = (centre + order) % 3;
            while let Some((next, i)) = find_face(mesh, current, v) {
                current = next;
                if order == 0 {
                    faces.push(next);
                    v = (i + 1) % 3;
                } else {
                    faces.insert(0, next);
                    v = (i + 2) % 3;
                    first_vertex = v;
                }
                mesh.take(next);
            }
        }

        if faces.len() >= MIN_FAN_FACES || self.csl {
            let closed = self.shared_corners(mesh, faces[0], faces[faces.len() - 1]) == 2;
            if closed || !flat {
                log::debug!(
                    "Found tri_fan of {:2} faces in mesh \"{}\"",
                    faces.len(),
                    mesh.name
                );
                return Strip {
                    mesh: mesh_index,
                    faces,
                    first_vertex,
                    sides: 3,
                };
            }
        }

        for &f in faces.iter().filter(|&&f| f != start) {
            mesh.restore(f);
        }
        Strip::single(mesh_index, start, 3)
    }

    /// Grow a quad strip outwards from the start face's most horizontal edge.
    fn grow_quad_strip(&self, mesh: &mut Mesh, mesh_index: usize, start: usize) -> Strip {
        let face = mesh.face(start);
        let flat = face.flags.is_flat();
        let mut edge = 0;
        let mut min_slope = f64::MAX;
        for i in 0..4 {
            let a = mesh.vertex(face.vertices[i]);
            let b = mesh.vertex(face.vertices[(i + 1) % 4]);
            let slope = (a - b).normalize().y.abs();
            if slope < min_slope {
                edge = i;
                min_slope = slope;
            }
        }

        // Smooth surfaces (fuselages) strip vertically first, flat ones
        // horizontally.
        let turns: [usize; 2] = if flat { [1, 0] } else { [0, 1] };
        let mut faces = vec![start];
        let mut first_vertex = 0;
        for turn in turns {
            first_vertex = (edge + 2 + turn) % 4;
            for order in [0, 2] {
                let mut current = start;
                let mut v = (edge + order + turn) % 4;
                while let Some((next, i)) = find_face(mesh, current, v) {
                    current = next;
                    v = (i + 2) % 4;
                    if order == 0 {
                        faces.push(next);
                    } else {
                        faces.insert(0, next);
                        first_vertex = v;
                    }
                    mesh.take(next);
                }
            }
            if faces.len() > 1 {
                break;
            }
        }

        if faces.len() > 1 {
            log::debug!(
                "Found quad_strip of {:2} faces in mesh \"{}\"",
                faces.len(),
                mesh.name
            );
        }
        Strip {
            mesh: mesh_index,
            faces,
            first_vertex,
            sides: 4,
        }
    }

    /// Corner pairs of two faces at the same position.
    fn shared_corners(&self, mesh: &Mesh, a: usize, b: usize) -> usize {
        let (a, b) = (mesh.face(a), mesh.face(b));
        let mut common = 0;
        for &va in &a.vertices {
            for &vb in &b.vertices {
                if mesh.vertices_equal(va, vb, self.tolerance) {
                    common += 1;
                }
            }
        }
        common
    }
}

/// Find an available face that continues `face` across the edge starting
/// at corner `v`.
///
/// The neighbour must have the same flags and corner count, and must walk
/// the shared edge the other way round with matching UVs. Returns the
/// neighbour and the corner its copy of the edge starts at.
pub fn find_face(mesh: &Mesh, face: usize, v: usize) -> Option<(usize, usize)> {
    let f = mesh.face(face);
    let n = f.len();
    let (v1, v2) = (f.vertices[v], f.vertices[(v + 1) % n]);
    let (uv1, uv2) = (f.uvs[v], f.uvs[(v + 1) % n]);

    for &candidate in mesh.vertex(v1).faces() {
        if candidate == face || !mesh.is_available(candidate) {
            continue;
        }
        let g = mesh.face(candidate);
        if g.flags != f.flags || g.len() != n {
            continue;
        }
        for i in 0..n {
            let j = (i + 1) % n;
            if g.vertices[i] == v2
                && g.vertices[j] == v1
                && g.uvs[i].equals(&uv2)
                && g.uvs[j].equals(&uv1)
            {
                return Some((candidate, i));
            }
        }
    }
    None
}

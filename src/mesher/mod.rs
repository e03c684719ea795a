//! Mesh building from scene polygons.
//!
//! Converts each host mesh into a [`Mesh`]: vertices moved to the output
//! frame and merged under the configured tolerance, polygons turned into
//! triangles and quads with UVs and attribute flags. Degenerate polygons are
//! dropped and reported.

pub mod dedup;
pub mod geometry;

pub use dedup::VertexPool;
pub use geometry::{Face, Mesh};

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::report::{ExportLog, ObjectRef};
use crate::resolver::{uvs_within_panel, SceneInfo};
use crate::scene::{MeshData, Polygon, SceneObject, LAYER_1};
use crate::types::{Attribute, FaceFlags, Uv, Vertex};

const FORWARD_TRI: [usize; 3] = [0, 1, 2];
const FORWARD_QUAD: [usize; 4] = [0, 1, 2, 3];
const MIRRORED_TRI: [usize; 3] = [2, 1, 0];
const MIRRORED_QUAD: [usize; 4] = [3, 2, 1, 0];

/// Builds [`Mesh`]es for one layer of one export.
pub struct MeshBuilder<'a> {
    config: &'a ExportConfig,
    info: &'a SceneInfo,
}

/// Source polygons worth reporting, by reason.
#[derive(Default)]
struct FaceReport {
    degenerate: Vec<usize>,
    hard: Vec<usize>,
    two_sided: Vec<usize>,
}

impl<'a> MeshBuilder<'a> {
    pub fn new(config: &'a ExportConfig, info: &'a SceneInfo) -> Self {
        Self { config, info }
    }

    /// Build the mesh of `object` as exported in `layer`.
    ///
    /// Fails only if a textured polygon lacks UVs for some of its corners.
    pub fn build(
        &self,
        object: &SceneObject,
        data: &MeshData,
        layer: u32,
        log: &mut ExportLog,
    ) -> Result<Mesh> {
        log::debug!(
            "Exporting mesh \"{}\" ({} faces)",
            object.name,
            data.faces.len()
        );

        let mirrored = object.matrix.is_mirrored();
        let mut pool = if data.vertices.len() < self.config.dedup_limit {
            VertexPool::merging(self.config.vertex_tolerance)
        } else {
            VertexPool::raw()
        };
        let mut report = FaceReport::default();
        let mut faces = Vec::with_capacity(data.faces.len());

        for (index, polygon) in data.faces.iter().enumerate() {
            let corners: &[usize] = match (polygon.indices.len(), mirrored) {
                (3, false) => &FORWARD_TRI,
                (3, true) => &MIRRORED_TRI,
                (4, false) => &FORWARD_QUAD,
                (4, true) => &MIRRORED_QUAD,
                _ => {
                    report.degenerate.push(index);
                    continue;
                }
            };

            let textured = data.has_uv_layer && polygon.textured;
            if textured && polygon.uvs.len() != polygon.indices.len() {
                return Err(ExportError::MissingUv {
                    object: ObjectRef::with_faces(&object.name, vec![index]),
                });
            }

            let mut face = Face::new(FaceFlags::NONE, index);
            self.classify(&mut face, polygon, data.has_uv_layer, layer, &mut report);

            let region = polygon
                .image
                .as_deref()
                .filter(|_| textured)
                .and_then(|image| self.info.regions.get(image));
            for &k in corners {
                let vertex = Vertex::from_local(data.vertices[polygon.indices[k]], &object.matrix);
                let uv = if textured {
                    let [s, t] = polygon.uvs[k];
                    match region {
                        Some(mapping) => mapping.map(s, t),
                        None => Uv::new(s, t),
                    }
                } else {
                    Uv::default()
                };
                face.add_corner(pool.insert(vertex), uv);
            }

            self.merge_corners(&mut face, &pool);
            if face.len() < 3 {
                report.degenerate.push(index);
                continue;
            }
            faces.push(face);
        }

        let mut mesh = Mesh::new(object.name.clone(), pool.into_vertices());
        for face in faces {
            mesh.add_face(face);
        }

        report.log(&object.name, log);
        Ok(mesh)
    }

    /// Work out a face's attribute flags from its polygon.
    fn classify(
        &self,
        face: &mut Face,
        polygon: &Polygon,
        has_uv_layer: bool,
        layer: u32,
        report: &mut FaceReport,
    ) {
        let textured = has_uv_layer && polygon.textured;
        let dynamic = !has_uv_layer || polygon.dynamic;
        let tiled = has_uv_layer && polygon.tiled;

        if textured && polygon.alpha {
            face.flags.insert(Attribute::Alpha);
        }
        if !tiled || self.config.forces_no_poly_offset() {
            face.flags.insert(Attribute::NoPolyOffset);
        }
        if has_uv_layer && polygon.two_sided {
            face.flags.insert(Attribute::TwoSide);
            report.two_sided.push(face.source);
        }
        if !polygon.smooth && !self.config.is_csl() {
            face.flags.insert(Attribute::Flat);
        }

        let panel_image = polygon
            .image
            .as_deref()
            .filter(|image| textured && self.config.cockpit && self.is_panel_image(image));
        if let Some(image) = panel_image {
            face.flags.insert(Attribute::Panel);
            face.kosher = self
                .info
                .panel_heights
                .get(image)
                .map_or(false, |&height| uvs_within_panel(&polygon.uvs, height));
        } else if polygon.indices.len() == 4
            && !dynamic
            && !self.config.cockpit
            && !self.config.is_csl()
            && layer == LAYER_1
        {
            face.flags.insert(Attribute::Hard);
            report.hard.push(face.source);
        }
    }

    fn is_panel_image(&self, image: &str) -> bool {
        self.info.regions.contains_key(image) || image.to_lowercase().contains("panel.")
    }

    /// Collapse corners of one face that landed on the same point, averaging
    /// their UVs.
    fn merge_corners(&self, face: &mut Face, pool: &VertexPool) {
        let tolerance = self.config.vertex_tolerance;
        let mut i = 0;
        while i < face.len() {
            for j in 0..face.len() {
                if i != j && pool.get(face.vertices[i]).equals(pool.get(face.vertices[j]), tolerance) {
                    let other = face.uvs[j];
                    face.uvs[i].merge_midpoint(&other);
                    face.vertices.remove(j);
                    face.uvs.remove(j);
                    break;
                }
            }
            i += 1;
        }
    }
}

impl FaceReport {
    fn log(self, name: &str, log: &mut ExportLog) {
        if !self.degenerate.is_empty() {
            log.info(
                format!(
                    "Ignoring {} degenerate face(s) in mesh \"{}\"",
                    self.degenerate.len(),
                    name
                ),
                vec![ObjectRef::with_faces(name, self.degenerate)],
            );
        }
        if !self.hard.is_empty() {
            log.info(
                format!("Found {} hard face(s) in mesh \"{}\"", self.hard.len(), name),
                vec![ObjectRef::with_faces(name, self.hard)],
            );
        }
        if !self.two_sided.is_empty() {
            log.info(
                format!(
                    "Found {} two-sided face(s) in mesh \"{}\"",
                    self.two_sided.len(),
                    name
                ),
                vec![ObjectRef::with_faces(name, self.two_sided)],
            );
        }
    }
}

//! OBJ7 export.
//!
//! Geometry is written layer by layer. Within a layer, faces go out bucket
//! by bucket in [`BucketKey`] order, then lines and lights. The whole
//! document is built in memory so a fatal error never leaves a partial file.

pub mod lamp;
pub mod writer;

pub use lamp::{is_line, light_colour};
pub use writer::{AttributeState, LightColour, Obj7Writer, PolyOffset};

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::mesher::{Mesh, MeshBuilder};
use crate::report::{ExportLog, ObjectRef};
use crate::resolver::{check_layers, resolve_scene, SceneInfo, TextureSource};
use crate::scene::{ObjectKind, PropertyValue, Scene};
use crate::strip::{Strip, StripBuilder};
use crate::types::BucketKey;
use std::path::Path;

/// Order strips are written in within a bucket: (triangles, single face).
/// Fans first, then loose triangles, then quad strips, then loose quads.
const STRIP_ORDER: [(bool, bool); 4] = [(true, false), (true, true), (false, false), (false, true)];

/// Result of a successful export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// The OBJ7 document.
    pub text: String,
    /// Number of primitives written.
    pub primitives: usize,
    /// Non-fatal problems found along the way.
    pub log: ExportLog,
}

impl ExportOutput {
    /// Write the document to `path`.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.text)?;
        Ok(())
    }
}

/// Exports scenes as OBJ7.
#[derive(Debug, Clone)]
pub struct Obj7Exporter {
    config: ExportConfig,
}

/// State shared by every step of one export.
struct ExportContext<'a> {
    config: &'a ExportConfig,
    info: SceneInfo,
    writer: Obj7Writer,
    log: ExportLog,
}

impl Obj7Exporter {
    /// Fails if the configuration asks for a cockpit CSL.
    pub fn new(config: ExportConfig) -> Result<Self> {
        if config.cockpit && config.is_csl() {
            return Err(ExportError::CockpitCsl);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export `scene`, looking texture sizes up in `textures` when the scene
    /// doesn't supply them.
    pub fn export(&self, scene: &Scene, textures: &dyn TextureSource) -> Result<ExportOutput> {
        log::info!("Starting OBJ export to {}", self.config.output_path.display());
        scene.validate()?;
        let mut log = ExportLog::new();
        let info = resolve_scene(scene, &self.config, textures, &mut log)?;

        let mut ctx = ExportContext {
            config: &self.config,
            writer: Obj7Writer::new(&self.config),
            info,
            log,
        };
        ctx.writer.header(ctx.config, ctx.info.texture.as_deref())?;
        for layer in ctx.info.layers() {
            let lod = ctx.info.has_lods().then(|| ctx.info.lod_range(layer));
            ctx.writer.begin_layer(ctx.config, layer, lod)?;
            ctx.write_layer(scene, layer)?;
        }
        ctx.writer.footer(ctx.config)?;
        check_layers(scene, ctx.config, &mut ctx.log);

        let (text, primitives) = ctx.writer.finish();
        log::info!("Finished - exported {} primitives", primitives);
        Ok(ExportOutput {
            text,
            primitives,
            log: ctx.log,
        })
    }
}

impl ExportContext<'_> {
    fn write_layer(&mut self, scene: &Scene, layer: u32) -> Result<()> {
        let mut meshes = self.build_meshes(scene, layer)?;

        // Panel faces outside the legal area confuse X-Plane when they come
        // last, so one known-good panel face is held back for the end.
        let panel = if self.config.cockpit {
            hold_back_panel_face(&mut meshes)
        } else {
            None
        };

        if self.config.optimise {
            let builder = StripBuilder::new(self.config.is_csl(), self.config.vertex_tolerance);
            for bucket in BucketKey::all() {
                let mut strips = Vec::new();
                for (index, mesh) in meshes.iter_mut().enumerate() {
                    strips.extend(builder.make_strips(mesh, index, bucket));
                }
                for (triangles, single) in STRIP_ORDER {
                    for strip in strips
                        .iter()
                        .filter(|s| s.is_triangles() == triangles && s.is_single() == single)
                    {
                        self.writer.strip(&meshes[strip.mesh], strip)?;
                    }
                }
            }
        } else {
            for (index, mesh) in meshes.iter().enumerate() {
                for face in (0..mesh.face_count()).filter(|&f| mesh.is_available(f)) {
                    let strip = Strip::single(index, face, mesh.face(face).len());
                    self.writer.strip(mesh, &strip)?;
                }
            }
        }

        if let Some(strip) = panel {
            self.writer.strip(&meshes[strip.mesh], &strip)?;
        }

        for object in scene.objects.iter().rev().filter(|o| o.in_layer(layer)) {
            match &object.kind {
                ObjectKind::Mesh(data) if is_line(object, data, self.config.line_width) => {
                    lamp::write_line(&mut self.writer, object, data, self.config)?;
                }
                ObjectKind::Lamp(data) => {
                    lamp::write_lamp(&mut self.writer, object, data, self.config, &mut self.log)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Build the layer's meshes, writing layer groups as they're found.
    fn build_meshes(&mut self, scene: &Scene, layer: u32) -> Result<Vec<Mesh>> {
        let builder = MeshBuilder::new(self.config, &self.info);
        let mut meshes = Vec::new();

        for object in scene.objects.iter().rev().filter(|o| o.in_layer(layer)) {
            match &object.kind {
                ObjectKind::Mesh(data) if data.halo => {
                    self.log.warn(
                        format!("Ignoring custom light \"{}\"", object.name),
                        vec![ObjectRef::new(&object.name)],
                    );
                }
                ObjectKind::Mesh(data) => {
                    if !is_line(object, data, self.config.line_width) {
                        meshes.push(builder.build(object, data, layer, &mut self.log)?);
                    }
                }
                ObjectKind::Empty(empty) => {
                    for prop in &empty.properties {
                        let Some(group) = prop.name.strip_prefix("group ") else {
                            continue;
                        };
                        let offset = match prop.value {
                            PropertyValue::String(_) => continue,
                            ref numeric => numeric.as_int().unwrap_or_default(),
                        };
                        self.writer.layer_group(group.trim(), offset)?;
                    }
                }
                ObjectKind::Lamp(_) => {}
            }
        }
        Ok(meshes)
    }
}

/// Take the first panel face inside the legal area, searching meshes from
/// the last built.
fn hold_back_panel_face(meshes: &mut [Mesh]) -> Option<Strip> {
    for (index, mesh) in meshes.iter_mut().enumerate().rev() {
        let Some(face) = (0..mesh.face_count()).find(|&f| mesh.face(f).kosher) else {
            continue;
        };
        mesh.take(face);
        return Some(Strip::single(index, face, mesh.face(face).len()));
    }
    None
}

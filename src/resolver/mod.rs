//! Scene-wide checks run before anything is written.
//!
//! Finds the single texture the object uses, the detail levels present and
//! their ranges, and the cockpit panel regions in use. All texture-level
//! problems are fatal and surface here, before the output exists.

pub mod texture;

pub use texture::{FsTextureSource, TextureSource};

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::report::{ExportLog, ObjectRef};
use crate::scene::{
    LampType, ObjectKind, PanelRegion, PropertyValue, Scene, SceneObject, DETAIL_LAYERS, LAYER_1,
};
use crate::types::Uv;
use std::collections::HashMap;
use std::path::PathBuf;

/// Default LOD limits for scenery objects.
pub const DEFAULT_LODS: [u32; 4] = [0, 1000, 4000, 10000];
/// Default LOD limits for CSL objects.
pub const CSL_LODS: [u32; 4] = [0, 1000, 4000, 100000];

/// Panel rows usable by `quad_cockpit` faces.
pub const PANEL_LEGAL_HEIGHT: f64 = 768.0;

/// Maps a panel region's own UV space into the full panel texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMapping {
    pub x_offset: f64,
    pub y_offset: f64,
    pub x_scale: f64,
    pub y_scale: f64,
}

impl RegionMapping {
    fn new(region: &PanelRegion, panel_size: [u32; 2]) -> Self {
        let (pw, ph) = (panel_size[0] as f64, panel_size[1] as f64);
        Self {
            x_offset: region.x as f64 / pw,
            y_offset: region.y as f64 / ph,
            x_scale: region.width as f64 / pw,
            y_scale: region.height as f64 / ph,
        }
    }

    pub fn map(&self, s: f64, t: f64) -> Uv {
        Uv::new(self.x_offset + s * self.x_scale, self.y_offset + t * self.y_scale)
    }
}

/// Scene-level facts the rest of the pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInfo {
    /// Texture reference to write in the header, if any face is textured.
    pub texture: Option<String>,
    /// Layers exported: [`LAYER_1`] alone, or all three detail layers.
    pub layer_mask: u32,
    /// LOD limits; layer `n` spans `lods[n]..lods[n + 1]`.
    pub lods: [u32; 4],
    /// Panel regions in use, by image name.
    pub regions: HashMap<String, RegionMapping>,
    /// Heights of panel and region images, by image name.
    pub panel_heights: HashMap<String, u32>,
}

impl SceneInfo {
    /// More than one detail level is exported.
    pub fn has_lods(&self) -> bool {
        self.layer_mask != LAYER_1
    }

    /// Layers to export, in output order.
    pub fn layers(&self) -> Vec<u32> {
        if self.has_lods() {
            vec![1, 2, 4]
        } else {
            vec![1]
        }
    }

    /// LOD range of a layer bit.
    pub fn lod_range(&self, layer: u32) -> (u32, u32) {
        let i = (layer / 2) as usize;
        (self.lods[i], self.lods[i + 1])
    }
}

/// Looks up image sizes, preferring sizes the host supplied.
pub struct ImageSizes<'a> {
    scene: &'a Scene,
    config: &'a ExportConfig,
    textures: &'a dyn TextureSource,
}

impl<'a> ImageSizes<'a> {
    pub fn new(scene: &'a Scene, config: &'a ExportConfig, textures: &'a dyn TextureSource) -> Self {
        Self {
            scene,
            config,
            textures,
        }
    }

    /// Pixel size of a named image or panel region.
    pub fn size(&self, name: &str) -> Option<(u32, u32)> {
        if let Some(region) = self.region(name) {
            return Some((region.width, region.height));
        }
        let image = self.scene.image(name)?;
        if let Some([w, h]) = image.size {
            return Some((w, h));
        }
        self.textures.dimensions(&self.path(name)?)
    }

    /// Canonical file path of a named image.
    pub fn path(&self, name: &str) -> Option<PathBuf> {
        self.scene
            .image(name)
            .map(|i| texture::canonical_path(&i.filename, &self.config.scene_dir))
    }

    pub fn region(&self, name: &str) -> Option<&'a PanelRegion> {
        self.scene
            .panel
            .as_ref()
            .and_then(|p| p.regions.iter().find(|r| r.image == name))
    }
}

/// Walk the scene once, collecting [`SceneInfo`] and rejecting scenes that
/// can't be exported.
pub fn resolve_scene(
    scene: &Scene,
    config: &ExportConfig,
    textures: &dyn TextureSource,
    log: &mut ExportLog,
) -> Result<SceneInfo> {
    let sizes = ImageSizes::new(scene, config, textures);
    let mut tracker = TextureTracker::default();

    let mut info = SceneInfo {
        texture: None,
        layer_mask: LAYER_1,
        lods: if config.is_csl() { CSL_LODS } else { DEFAULT_LODS },
        regions: HashMap::new(),
        panel_heights: HashMap::new(),
    };

    let mut panel_unchecked = config.cockpit;
    let mut panel_objects: Vec<ObjectRef> = Vec::new();
    let mut first_layers = 0;

    for object in scene.objects.iter().rev() {
        if info.layer_mask == LAYER_1 && !config.cockpit {
            let layers = object.layers & DETAIL_LAYERS;
            if first_layers == 0 {
                first_layers = layers;
            } else if layers != 0 && layers != first_layers {
                info.layer_mask = DETAIL_LAYERS;
                log.info("Multiple Levels Of Detail found", Vec::new());
            }
        }

        if let ObjectKind::Empty(empty) = &object.kind {
            if !config.cockpit {
                for prop in &empty.properties {
                    let Some(layer) = lod_property_layer(&prop.name) else {
                        continue;
                    };
                    let Some(value) = numeric(&prop.value) else {
                        continue;
                    };
                    info.lods[layer] = value.max(0) as u32;
                    if layer < 3 && info.lods[layer + 1] <= info.lods[layer] {
                        info.lods[layer + 1] = info.lods[layer] + 1;
                    }
                    if info.layer_mask != DETAIL_LAYERS {
                        info.layer_mask = DETAIL_LAYERS;
                        log.info("Multiple Levels Of Detail found", Vec::new());
                    }
                }
            }
        }

        if !object.in_layer(info.layer_mask) {
            continue;
        }

        match &object.kind {
            ObjectKind::Mesh(mesh) if mesh.halo => match &mesh.halo_image {
                Some(image) => tracker.add(image, object, &sizes)?,
                None => log.warn(
                    format!("Ignoring custom light \"{}\" with no texture", object.name),
                    vec![ObjectRef::new(&object.name)],
                ),
            },
            ObjectKind::Mesh(mesh) if mesh.has_uv_layer => {
                for (fi, face) in mesh.faces.iter().enumerate() {
                    let Some(image) = face.image.as_deref().filter(|_| face.textured) else {
                        continue;
                    };
                    if !config.cockpit {
                        tracker.add(image, object, &sizes)?;
                        continue;
                    }

                    let region = sizes.region(image);
                    if let (Some(region), Some(panel)) = (region, scene.panel.as_ref()) {
                        info.regions
                            .insert(image.to_string(), RegionMapping::new(region, panel.size));
                    }
                    let named_panel = scene.image(image).map_or(false, |i| i.is_panel_named());
                    if !(named_panel || region.is_some()) {
                        tracker.add(image, object, &sizes)?;
                        continue;
                    }

                    if face.indices.len() == 3 {
                        return Err(ExportError::PanelTriangle {
                            object: ObjectRef::with_faces(&object.name, vec![fi]),
                        });
                    }
                    if !panel_objects.iter().any(|o| o.name == object.name) {
                        panel_objects.push(ObjectRef::new(&object.name));
                    }
                    if let Some((_, height)) = sizes.size(image) {
                        info.panel_heights.insert(image.to_string(), height);
                    }
                    if panel_unchecked {
                        if region.is_some() {
                            panel_unchecked = false;
                        } else {
                            let (_, height) =
                                sizes.size(image).ok_or_else(|| ExportError::TextureUnreadable {
                                    file: image.to_string(),
                                })?;
                            if uvs_within_panel(&face.uvs, height) {
                                panel_unchecked = false;
                            }
                        }
                    }
                }
            }
            ObjectKind::Lamp(lamp) if config.cockpit && lamp.lamp_type == LampType::Point => {
                return Err(ExportError::CockpitLight {
                    object: ObjectRef::new(&object.name),
                });
            }
            _ => {}
        }
    }

    if tracker.multiple() {
        return Err(ExportError::MultipleTextures {
            objects: tracker.offenders,
            files: tracker.files,
        });
    }
    if !panel_objects.is_empty() && panel_unchecked {
        return Err(ExportError::PanelOutsideRegion {
            objects: panel_objects,
        });
    }

    let Some(path) = tracker.texture else {
        return Ok(info);
    };
    let text = path.to_string_lossy().to_string();
    let size = tracker
        .size
        .or_else(|| textures.dimensions(&path))
        .ok_or_else(|| ExportError::TextureUnreadable { file: text.clone() })?;
    let stem = texture::validate_texture(&text, size)?;

    info.texture = Some(if config.cockpit {
        log.info("Using algorithms appropriate for a cockpit object", Vec::new());
        texture::basename(&stem).to_string()
    } else {
        match texture::guess_texture_path(&stem, &config.output_path) {
            Some(guessed) => guessed,
            None => {
                log.warn(
                    "Can't guess path for texture file. Please edit the .obj file to fix",
                    Vec::new(),
                );
                texture::basename(&stem).to_string()
            }
        }
    });
    Ok(info)
}

/// Warn about objects the chosen layers leave out.
pub fn check_layers(scene: &Scene, config: &ExportConfig, log: &mut ExportLog) {
    let mask = if config.cockpit { LAYER_1 } else { DETAIL_LAYERS };
    let outside: Vec<ObjectRef> = scene
        .objects
        .iter()
        .filter(|o| o.layers != 0 && !o.in_layer(mask))
        .map(|o| ObjectRef::new(&o.name))
        .collect();
    if outside.is_empty() {
        return;
    }
    let message = if config.cockpit {
        "Objects were found outside layer 1 and were not exported"
    } else {
        "Objects were found outside layers 1-3 and were not exported"
    };
    log.warn(message, outside);
}

/// True if every UV is inside the panel and within its top 768 rows.
pub fn uvs_within_panel(uvs: &[[f64; 2]], height: u32) -> bool {
    uvs.iter().all(|&[s, t]| {
        (0.0..=1.0).contains(&s) && t <= 1.0 && (1.0 - t) * height as f64 <= PANEL_LEGAL_HEIGHT
    })
}

/// `lod_0`..`lod_3`, case-insensitive.
fn lod_property_layer(name: &str) -> Option<usize> {
    let lower = name.to_lowercase();
    let digit = lower.strip_prefix("lod_")?;
    match digit {
        "0" => Some(0),
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        _ => None,
    }
}

fn numeric(value: &PropertyValue) -> Option<i64> {
    match value {
        PropertyValue::String(_) => None,
        other => other.as_int(),
    }
}

/// Tracks the texture file in use and anything that disagrees with it.
#[derive(Default)]
struct TextureTracker {
    texture: Option<PathBuf>,
    size: Option<(u32, u32)>,
    files: Vec<String>,
    offenders: Vec<ObjectRef>,
}

impl TextureTracker {
    fn add(&mut self, image: &str, object: &SceneObject, sizes: &ImageSizes<'_>) -> Result<()> {
        let path = sizes.path(image).ok_or_else(|| {
            ExportError::InvalidScene(format!(
                "\"{}\" uses unknown image \"{}\"",
                object.name, image
            ))
        })?;
        let lower = path.to_string_lossy().to_lowercase();

        match &self.texture {
            Some(current) if current.to_string_lossy().to_lowercase() != lower => {
                if self.offenders.is_empty() {
                    log::warn!("Multiple texture files found: {:?}", current);
                }
                if !self.offenders.iter().any(|o| o.name == object.name) {
                    self.offenders.push(ObjectRef::new(&object.name));
                }
            }
            Some(_) => {}
            None => {
                self.texture = Some(path.clone());
                self.size = sizes.scene.image(image).and_then(|i| i.size).map(|[w, h]| (w, h));
            }
        }
        if !self.files.contains(&lower) {
            self.files.push(lower);
        }
        Ok(())
    }

    fn multiple(&self) -> bool {
        !self.offenders.is_empty()
    }
}

//! Normalized scene description supplied by the host application.
//!
//! The host flattens its live scene into these plain types (or into the
//! equivalent JSON) before export. Nothing here knows about the host's own
//! object model.

use crate::error::{ExportError, Result};
use crate::types::ObjectTransform;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layer bits used for the three detail levels.
pub const LAYER_1: u32 = 1;
pub const LAYER_2: u32 = 2;
pub const LAYER_3: u32 = 4;
pub const DETAIL_LAYERS: u32 = LAYER_1 | LAYER_2 | LAYER_3;

/// Everything the exporter reads from the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Objects in host listing order.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    /// Images referenced by polygons and custom lights.
    #[serde(default)]
    pub images: Vec<ImageRef>,
    /// Cockpit panel texture and its regions, if the host defines any.
    #[serde(default)]
    pub panel: Option<PanelDefinition>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a scene from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Load a scene from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_object(mut self, object: SceneObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.images.push(image);
        self
    }

    /// Look up an image by name.
    pub fn image(&self, name: &str) -> Option<&ImageRef> {
        self.images.iter().find(|i| i.name == name)
    }

    /// Check polygon vertex indices and UV counts that can be checked
    /// without exporting.
    pub fn validate(&self) -> Result<()> {
        for object in &self.objects {
            if let ObjectKind::Mesh(mesh) = &object.kind {
                for (fi, face) in mesh.faces.iter().enumerate() {
                    if let Some(&bad) = face.indices.iter().find(|&&i| i >= mesh.vertices.len()) {
                        return Err(ExportError::InvalidScene(format!(
                            "face {} of \"{}\" references vertex {} of {}",
                            fi,
                            object.name,
                            bad,
                            mesh.vertices.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// One object in the host scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// Host layer bitmask. Bits 1, 2 and 4 are the three detail levels.
    #[serde(default = "default_layers")]
    pub layers: u32,
    /// Object-to-world transform, 16 floats column-major.
    #[serde(default)]
    pub matrix: ObjectTransform,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

fn default_layers() -> u32 {
    LAYER_1
}

impl SceneObject {
    pub fn mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            name: name.into(),
            layers: LAYER_1,
            matrix: ObjectTransform::identity(),
            kind: ObjectKind::Mesh(mesh),
        }
    }

    pub fn lamp(name: impl Into<String>, lamp: LampData) -> Self {
        Self {
            name: name.into(),
            layers: LAYER_1,
            matrix: ObjectTransform::identity(),
            kind: ObjectKind::Lamp(lamp),
        }
    }

    pub fn empty(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            layers: LAYER_1,
            matrix: ObjectTransform::identity(),
            kind: ObjectKind::Empty(EmptyData { properties }),
        }
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_matrix(mut self, matrix: ObjectTransform) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn in_layer(&self, mask: u32) -> bool {
        self.layers & mask != 0
    }
}

/// Object payload by host object type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    Mesh(MeshData),
    Lamp(LampData),
    Empty(EmptyData),
}

/// Polygon mesh with shared vertices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshData {
    /// Object-space vertex positions (Z up).
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Polygon>,
    /// Whether the mesh carries per-face UV and render-mode data at all.
    /// Without it every face is treated as untextured and dynamic.
    #[serde(default = "default_true")]
    pub has_uv_layer: bool,
    /// Material colours (RGB, 0..1) by material slot.
    #[serde(default)]
    pub materials: Vec<[f64; 3]>,
    /// First material is a halo: the mesh stands in for a custom light.
    #[serde(default)]
    pub halo: bool,
    /// Texture image of the halo material, if any.
    #[serde(default)]
    pub halo_image: Option<String>,
}

impl Default for MeshData {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            has_uv_layer: true,
            materials: Vec::new(),
            halo: false,
            halo_image: None,
        }
    }
}

/// One polygon of a mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    /// Indices into [`MeshData::vertices`], in winding order.
    pub indices: Vec<usize>,
    /// One UV per corner when textured.
    #[serde(default)]
    pub uvs: Vec<[f64; 2]>,
    /// Name of the image the polygon is textured with.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub material: usize,
    #[serde(default)]
    pub textured: bool,
    /// "Tiles" render mode: keep polygon offset.
    #[serde(default)]
    pub tiled: bool,
    #[serde(default)]
    pub two_sided: bool,
    #[serde(default = "default_true")]
    pub dynamic: bool,
    #[serde(default = "default_true")]
    pub smooth: bool,
    /// Alpha transparency mode.
    #[serde(default)]
    pub alpha: bool,
}

fn default_true() -> bool {
    true
}

impl Polygon {
    /// Untextured, smooth, dynamic polygon.
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices,
            uvs: Vec::new(),
            image: None,
            material: 0,
            textured: false,
            tiled: false,
            two_sided: false,
            dynamic: true,
            smooth: true,
            alpha: false,
        }
    }

    pub fn textured(mut self, image: impl Into<String>, uvs: Vec<[f64; 2]>) -> Self {
        self.textured = true;
        self.image = Some(image.into());
        self.uvs = uvs;
        self
    }

    pub fn two_sided(mut self) -> Self {
        self.two_sided = true;
        self
    }

    pub fn flat(mut self) -> Self {
        self.smooth = false;
        self
    }

    pub fn tiled(mut self) -> Self {
        self.tiled = true;
        self
    }

    pub fn hard(mut self) -> Self {
        self.dynamic = false;
        self
    }

    pub fn alpha(mut self) -> Self {
        self.alpha = true;
        self
    }
}

/// Host lamp types. Only point lamps are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LampType {
    Point,
    Spot,
    Sun,
    Area,
    Hemi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LampData {
    pub lamp_type: LampType,
    /// RGB, 0..1.
    pub color: [f64; 3],
    #[serde(default = "default_energy")]
    pub energy: f64,
}

fn default_energy() -> f64 {
    1.0
}

impl LampData {
    pub fn point(color: [f64; 3]) -> Self {
        Self {
            lamp_type: LampType::Point,
            color,
            energy: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyData {
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// A custom property on an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Int(value),
        }
    }

    pub fn float(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Float(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Integer value of numeric properties, truncating floats.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            PropertyValue::Float(f) => Some(*f as i64),
            PropertyValue::String(_) => None,
        }
    }
}

/// A named image and the file it was loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,
    /// Path as the host records it. A leading `//` is relative to the scene file.
    pub filename: String,
    /// Pixel size, when the host already knows it.
    #[serde(default)]
    pub size: Option<[u32; 2]>,
}

impl ImageRef {
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some([width, height]);
        self
    }

    /// Whether the image name marks it as the cockpit panel texture.
    pub fn is_panel_named(&self) -> bool {
        self.name.to_lowercase().contains("panel.")
    }
}

/// Cockpit panel texture with up to [`MAX_PANEL_REGIONS`] sub-regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelDefinition {
    /// Image name of the full panel texture.
    pub image: String,
    /// Panel texture size in pixels.
    pub size: [u32; 2],
    #[serde(default)]
    pub regions: Vec<PanelRegion>,
}

/// X-Plane allows up to four panel regions.
pub const MAX_PANEL_REGIONS: usize = 4;

/// A rectangle of the panel texture standing in for its own image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelRegion {
    /// Image name faces use to refer to this region.
    pub image: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_json() {
        let json = r#"{
            "objects": [
                {
                    "name": "Box",
                    "type": "mesh",
                    "vertices": [[0,0,0],[1,0,0],[1,1,0]],
                    "faces": [{"indices": [0,1,2], "two_sided": true}]
                },
                {
                    "name": "Beacon",
                    "type": "lamp",
                    "layers": 3,
                    "lamp_type": "point",
                    "color": [1.0, 0.0, 0.0]
                },
                {
                    "name": "LODs",
                    "type": "empty",
                    "properties": [{"name": "lod_1", "value": 2000}]
                }
            ]
        }"#;
        let scene = Scene::from_json(json).unwrap();
        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.objects[0].layers, LAYER_1);
        match &scene.objects[0].kind {
            ObjectKind::Mesh(m) => {
                assert!(m.faces[0].two_sided);
                assert!(m.faces[0].smooth);
                assert!(m.faces[0].dynamic);
                assert!(m.has_uv_layer);
            }
            other => panic!("expected mesh, got {:?}", other),
        }
        assert!(scene.objects[1].in_layer(LAYER_2));
        match &scene.objects[2].kind {
            ObjectKind::Empty(e) => assert_eq!(e.properties[0].value.as_int(), Some(2000)),
            other => panic!("expected empty, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_vertex_index_rejected() {
        let json = r#"{"objects": [{"name": "Bad", "type": "mesh",
            "vertices": [[0,0,0]], "faces": [{"indices": [0,1,2]}]}]}"#;
        let err = Scene::from_json(json).unwrap_err();
        assert!(matches!(err, ExportError::InvalidScene(_)));
    }

    #[test]
    fn test_default_mesh_has_uv_layer() {
        assert!(MeshData::default().has_uv_layer);
        let parsed: MeshData =
            serde_json::from_str(r#"{"vertices": [], "faces": []}"#).unwrap();
        assert_eq!(parsed.has_uv_layer, MeshData::default().has_uv_layer);
    }

    #[test]
    fn test_panel_name_detection() {
        assert!(ImageRef::new("Panel.png", "//panel.png").is_panel_named());
        assert!(!ImageRef::new("wing.png", "//wing.png").is_panel_named());
    }
}

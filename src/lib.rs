//! # xplane-obj7
//!
//! A Rust library for exporting polygon-mesh scenes to the X-Plane 7 text
//! object format (OBJ7).
//!
//! ## Overview
//!
//! The host application flattens its scene into a [`Scene`]: meshes with
//! per-face render attributes, point lamps and empties carrying custom
//! properties. The exporter checks the scene, merges vertices, groups faces
//! into tri fans and quad strips, and writes an OBJ7 document with the
//! minimal set of attribute changes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use xplane_obj7::{export_scene, ExportConfig, Scene};
//!
//! let scene = Scene::load("hangar.json")?;
//! let config = ExportConfig::for_output("hangar.obj").with_scene_dir(".");
//!
//! let output = export_scene(&scene, config)?;
//! output.write_to("hangar.obj")?;
//! for entry in output.log.entries() {
//!     eprintln!("{}", entry.message);
//! }
//! ```
//!
//! ## Texture Sizes
//!
//! Only texture sizes are ever read. Hosts that already know them can put
//! them in [`ImageRef::size`] or pass any [`TextureSource`] to
//! [`Obj7Exporter::export`].

pub mod error;
pub mod types;
pub mod config;
pub mod report;
pub mod scene;
pub mod resolver;
pub mod mesher;
pub mod strip;
pub mod export;

// Re-export main types for convenience
pub use error::{ExportError, Result};
pub use types::{Attribute, BucketKey, FaceFlags, ObjectTransform, Uv, Vertex};
pub use config::{ExportConfig, Platform, Variant};
pub use report::{ExportLog, LogEntry, ObjectRef};
pub use scene::{ImageRef, LampData, LampType, MeshData, Polygon, Property, Scene, SceneObject};
pub use resolver::{resolve_scene, FsTextureSource, SceneInfo, TextureSource};
pub use mesher::{Face, Mesh, MeshBuilder};
pub use strip::{Strip, StripBuilder};
pub use export::{ExportOutput, Obj7Exporter, Obj7Writer};

/// Export a scene, reading texture sizes from disk when the scene doesn't
/// supply them.
pub fn export_scene(scene: &Scene, config: ExportConfig) -> Result<ExportOutput> {
    Obj7Exporter::new(config)?.export(scene, &FsTextureSource::new())
}

//! Export configuration.

use crate::types::VERTEX_TOLERANCE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which flavour of OBJ7 to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Scenery, aircraft or cockpit object.
    #[default]
    Scenery,
    /// Multiplayer CSL aircraft.
    Csl,
}

/// Platform marker on the first line of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Ibm,
    Apple,
}

impl Platform {
    pub fn marker(self) -> char {
        match self {
            Platform::Ibm => 'I',
            Platform::Apple => 'A',
        }
    }
}

/// Main exporter configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub variant: Variant,
    /// Cockpit objects get panel handling and no LODs.
    pub cockpit: bool,
    /// Build strips and fans and order output by attribute bucket.
    pub optimise: bool,
    /// Distance under which vertices are merged.
    pub vertex_tolerance: f64,
    /// Maximum end width of a quad that stands in for a line.
    pub line_width: f64,
    /// Meshes with this many source vertices or more skip vertex merging.
    pub dedup_limit: usize,
    pub platform: Platform,
    /// Host application named in the trailing comment.
    pub host: String,
    /// Exporter named in the trailing comment.
    pub generator: String,
    /// Directory `//`-relative image paths are resolved against.
    pub scene_dir: PathBuf,
    /// Where the object file will be written. Used to derive relative
    /// texture paths.
    pub output_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Scenery,
            cockpit: false,
            optimise: true,
            vertex_tolerance: VERTEX_TOLERANCE,
            line_width: 0.101,
            dedup_limit: 1000,
            platform: Platform::Ibm,
            host: "Blender".to_string(),
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            scene_dir: PathBuf::new(),
            output_path: PathBuf::new(),
        }
    }
}

impl ExportConfig {
    /// Config for writing to `path`, recognising cockpit objects by name.
    pub fn for_output<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self {
            cockpit: is_cockpit_filename(path),
            output_path: path.to_path_buf(),
            ..Self::default()
        }
    }

    /// Switch to the CSL variant. CSL objects are never cockpits.
    pub fn with_csl(mut self) -> Self {
        self.variant = Variant::Csl;
        self.cockpit = false;
        self
    }

    pub fn with_cockpit(mut self, cockpit: bool) -> Self {
        self.cockpit = cockpit;
        self
    }

    pub fn with_optimise(mut self, optimise: bool) -> Self {
        self.optimise = optimise;
        self
    }

    pub fn with_vertex_tolerance(mut self, tolerance: f64) -> Self {
        self.vertex_tolerance = tolerance;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_scene_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.scene_dir = dir.into();
        self
    }

    pub fn is_csl(&self) -> bool {
        self.variant == Variant::Csl
    }

    /// Cockpit and CSL objects default to no polygon offset.
    pub fn forces_no_poly_offset(&self) -> bool {
        self.cockpit || self.is_csl()
    }
}

/// `*_cockpit.obj`, `*_cockpit_inn.obj` and `*_cockpit_out.obj` are cockpits.
pub fn is_cockpit_filename(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    ["_cockpit.obj", "_cockpit_inn.obj", "_cockpit_out.obj"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

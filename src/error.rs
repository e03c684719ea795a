//! Error types for the OBJ7 exporter.

use crate::report::ObjectRef;
use thiserror::Error;

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Fatal export errors. Any of these aborts the whole export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A textured polygon has fewer UVs than corners.
    #[error("Missing UV in mesh \"{}\"", .object.name)]
    MissingUv { object: ObjectRef },

    /// The OBJ format supports a single texture file.
    #[error("The OBJ format supports one texture file, but you've used multiple texture files: {}", .files.join(", "))]
    MultipleTextures {
        objects: Vec<ObjectRef>,
        files: Vec<String>,
    },

    /// Texture dimensions must both be powers of two.
    #[error("Texture file \"{file}\" is {width}x{height}; height and width must be powers of two")]
    TextureNotPowerOfTwo {
        file: String,
        width: u32,
        height: u32,
    },

    /// The texture's file name contains spaces.
    #[error("Texture filename \"{file}\" contains spaces")]
    TextureNameHasSpaces { file: String },

    /// Only DDS, PNG and BMP textures are accepted.
    #[error("Texture file \"{file}\" must be in DDS, PNG or BMP format")]
    UnsupportedTextureFormat { file: String },

    /// The texture source could not report the texture's size.
    #[error("Can't load texture file \"{file}\"")]
    TextureUnreadable { file: String },

    /// Cockpit objects can't carry lamps.
    #[error("Cockpit objects can't contain lights")]
    CockpitLight { object: ObjectRef },

    /// The CSL variant can't be combined with a cockpit object.
    #[error("Can't export a cockpit object as a CSL")]
    CockpitCsl,

    /// Only quads may use the instrument panel texture.
    #[error("Only quads can use the instrument panel texture, but found a tri using it in \"{}\"", .object.name)]
    PanelTriangle { object: ObjectRef },

    /// Every panel face lies outside the legal panel area.
    #[error("At least one face that uses the instrument panel texture must be within the top 768 lines of the panel texture")]
    PanelOutsideRegion { objects: Vec<ObjectRef> },

    /// The scene description is inconsistent.
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// Failed to parse a JSON scene description.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Formatting the output document failed.
    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl ExportError {
    /// Objects (and faces) responsible for the error, for highlighting in the host.
    pub fn objects(&self) -> Vec<ObjectRef> {
        match self {
            ExportError::MissingUv { object }
            | ExportError::CockpitLight { object }
            | ExportError::PanelTriangle { object } => vec![object.clone()],
            ExportError::MultipleTextures { objects, .. }
            | ExportError::PanelOutsideRegion { objects } => objects.clone(),
            _ => Vec::new(),
        }
    }
}

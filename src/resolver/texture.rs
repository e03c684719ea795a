//! Texture lookup and path handling.

use crate::error::{ExportError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of texture pixel sizes.
///
/// The exporter never reads pixels; it only needs sizes to validate the
/// texture and to check panel UVs.
pub trait TextureSource {
    /// Width and height of the texture at `path`, if it can be read.
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)>;
}

/// Reads image headers from disk with the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct FsTextureSource;

impl FsTextureSource {
    pub fn new() -> Self {
        Self
    }
}

impl TextureSource for FsTextureSource {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        match image::image_dimensions(path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                log::debug!("Can't read texture header {:?}: {}", path, e);
                None
            }
        }
    }
}

/// Fixed sizes by path, for hosts that already know them.
impl TextureSource for HashMap<PathBuf, (u32, u32)> {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        self.get(path).copied()
    }
}

/// Absolute form of an image path as the host records it.
///
/// A leading `//` (or `\\`) means relative to the scene file's directory.
pub fn canonical_path(filename: &str, scene_dir: &Path) -> PathBuf {
    if filename.starts_with("//") || filename.starts_with("\\\\") {
        scene_dir.join(&filename[2..])
    } else {
        let path = PathBuf::from(filename);
        if path.is_absolute() {
            path
        } else {
            scene_dir.join(path)
        }
    }
}

/// Check extension, size and name of the single texture and strip the
/// extension, which OBJ7 leaves implicit.
pub fn validate_texture(path: &str, size: (u32, u32)) -> Result<String> {
    let (width, height) = size;
    if !width.is_power_of_two() || !height.is_power_of_two() {
        return Err(ExportError::TextureNotPowerOfTwo {
            file: path.to_string(),
            width,
            height,
        });
    }

    let name = basename(path);
    if name.contains(' ') {
        return Err(ExportError::TextureNameHasSpaces {
            file: name.to_string(),
        });
    }

    let lower = path.to_ascii_lowercase();
    if [".dds", ".png", ".bmp"].iter().any(|ext| lower.ends_with(ext)) {
        Ok(path[..path.len() - 4].to_string())
    } else {
        Err(ExportError::UnsupportedTextureFormat {
            file: path.to_string(),
        })
    }
}

/// Texture reference as written in the object file, for non-cockpit objects.
///
/// Returns `None` when no sensible path can be derived; the caller falls
/// back to the bare file name.
pub fn guess_texture_path(texture: &str, output_path: &Path) -> Option<String> {
    let texture = texture.replace('\\', "/");
    let lower = texture.to_ascii_lowercase();
    for prefix in ["custom object textures", "autogen textures"] {
        if let Some(at) = lower.rfind(prefix) {
            let start = (at + prefix.len() + 1).min(texture.len());
            return Some(texture[start..].to_string());
        }
    }

    // Relative to the object file, through their common prefix.
    let output = output_path.to_string_lossy().replace('\\', "/");
    let a: Vec<&str> = output.split('/').collect();
    let b: Vec<&str> = texture.split('/').collect();
    if output.is_empty() {
        return None;
    }
    for i in 0..a.len().min(b.len()) {
        if a[i].to_lowercase() != b[i].to_lowercase() {
            if i == 0 {
                return None;
            }
            let mut relative = String::new();
            for _ in i..a.len() - 1 {
                relative.push_str("../");
            }
            for part in &b[i..b.len() - 1] {
                relative.push_str(part);
                relative.push('/');
            }
            if relative.contains(' ') {
                return None;
            }
            if ["/Custom Scenery", "/Aircraft", "/X-Plane"]
                .iter()
                .any(|root| relative.contains(root))
            {
                return None;
            }
            return Some(relative + basename(&texture));
        }
    }
    None
}

/// Final path component, accepting either separator.
pub fn basename(path: &str) -> &str {
    match path.rfind(&['/', '\\'][..]) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_path() {
        let dir = Path::new("/scenery/objects");
        assert_eq!(
            canonical_path("//tex/wall.png", dir),
            PathBuf::from("/scenery/objects/tex/wall.png")
        );
        assert_eq!(
            canonical_path("/abs/wall.png", dir),
            PathBuf::from("/abs/wall.png")
        );
        assert_eq!(
            canonical_path("wall.png", dir),
            PathBuf::from("/scenery/objects/wall.png")
        );
    }

    #[test]
    fn test_validate_texture() {
        assert_eq!(
            validate_texture("/x/wall.png", (256, 512)).unwrap(),
            "/x/wall"
        );
        assert!(matches!(
            validate_texture("/x/wall.png", (300, 512)),
            Err(ExportError::TextureNotPowerOfTwo { width: 300, .. })
        ));
        assert!(matches!(
            validate_texture("/x/my wall.png", (256, 256)),
            Err(ExportError::TextureNameHasSpaces { .. })
        ));
        assert!(matches!(
            validate_texture("/x/wall.jpg", (256, 256)),
            Err(ExportError::UnsupportedTextureFormat { .. })
        ));
    }

    #[test]
    fn test_guess_from_library_prefix() {
        let guessed = guess_texture_path(
            "/XP/Custom Scenery/Pack/custom object textures/sub/wall",
            Path::new("/elsewhere/out.obj"),
        );
        assert_eq!(guessed.as_deref(), Some("sub/wall"));
    }

    #[test]
    fn test_guess_from_library_prefix_after_non_ascii_folder() {
        let guessed = guess_texture_path(
            "/İİİİ/Custom Object Textures/sub/wall",
            Path::new("/elsewhere/out.obj"),
        );
        assert_eq!(guessed.as_deref(), Some("sub/wall"));
    }

    #[test]
    fn test_guess_relative_to_output() {
        let guessed = guess_texture_path(
            "/pack/objects/textures/wall",
            Path::new("/pack/objects/hangar/hangar.obj"),
        );
        assert_eq!(guessed.as_deref(), Some("../textures/wall"));
    }

    #[test]
    fn test_guess_gives_up_without_common_root() {
        assert_eq!(guess_texture_path("wall", Path::new("")), None);
    }

    #[test]
    fn test_static_sizes() {
        let mut sizes: HashMap<PathBuf, (u32, u32)> = HashMap::new();
        sizes.insert(PathBuf::from("/t/a.png"), (64, 64));
        assert_eq!(sizes.dimensions(Path::new("/t/a.png")), Some((64, 64)));
        assert_eq!(sizes.dimensions(Path::new("/t/b.png")), None);
    }
}

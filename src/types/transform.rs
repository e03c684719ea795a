//! Object-to-world transform.

use glam::{DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

/// Object-to-world transform supplied with each scene object.
///
/// Stored column-major, the layout `glam` uses; the translation sits in the
/// last column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 16]", into = "[f64; 16]")]
pub struct ObjectTransform {
    matrix: DMat4,
}

impl ObjectTransform {
    pub fn identity() -> Self {
        Self {
            matrix: DMat4::IDENTITY,
        }
    }

    pub fn from_matrix(matrix: DMat4) -> Self {
        Self { matrix }
    }

    pub fn from_translation(t: [f64; 3]) -> Self {
        Self::from_matrix(DMat4::from_translation(DVec3::from_array(t)))
    }

    pub fn from_scale_translation(scale: [f64; 3], t: [f64; 3]) -> Self {
        Self::from_matrix(DMat4::from_scale_rotation_translation(
            DVec3::from_array(scale),
            glam::DQuat::IDENTITY,
            DVec3::from_array(t),
        ))
    }

    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Transform a point from object space to world space.
    pub fn apply(&self, point: DVec3) -> DVec3 {
        self.matrix.transform_point3(point)
    }

    /// World position of the object origin.
    pub fn origin(&self) -> DVec3 {
        self.matrix.w_axis.truncate()
    }

    /// True if the transform flips handedness, which reverses face winding.
    pub fn is_mirrored(&self) -> bool {
        DMat3::from_mat4(self.matrix).determinant() < 0.0
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 16]> for ObjectTransform {
    fn from(cols: [f64; 16]) -> Self {
        Self::from_matrix(DMat4::from_cols_array(&cols))
    }
}

impl From<ObjectTransform> for [f64; 16] {
    fn from(t: ObjectTransform) -> Self {
        t.matrix.to_cols_array()
    }
}

//! Point and texture-coordinate value types.

use super::{round_places, short_float, ObjectTransform};
use glam::DVec3;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Decimal places kept for coordinates.
pub const PRECISION: i32 = 4;

/// Default distance under which two vertices are considered the same point.
pub const VERTEX_TOLERANCE: f64 = 0.0001;

/// Distance under which two UVs are the same (about 1 pixel in 2048).
pub const UV_TOLERANCE: f64 = 0.0004;

/// A point in output space (Y up, Z towards the viewer).
///
/// Vertices in a mesh pool also record the faces that use them, which the
/// strip builder walks to find neighbours.
#[derive(Debug, Clone, Default)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    faces: Vec<usize>,
}

impl Vertex {
    /// Create a vertex already in output space. Coordinates are kept as given.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            faces: Vec::new(),
        }
    }

    /// Transform a Z-up object-space point into the Y-up output frame,
    /// rounding each coordinate to [`PRECISION`] places.
    ///
    /// The world point `(x, y, z)` becomes `(x, z, -y)`.
    pub fn from_local(point: [f64; 3], transform: &ObjectTransform) -> Self {
        let world = transform.apply(DVec3::from_array(point));
        Self {
            x: round_places(world.x, PRECISION),
            y: round_places(world.z, PRECISION),
            z: -round_places(world.y, PRECISION),
            faces: Vec::new(),
        }
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn to_dvec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Per-axis comparison within `tolerance`. Not transitive.
    pub fn equals(&self, other: &Vertex, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }

    /// Move this vertex to the midpoint between itself and `other`.
    pub fn merge_midpoint(&mut self, other: &Vertex) {
        self.x = (self.x + other.x) / 2.0;
        self.y = (self.y + other.y) / 2.0;
        self.z = (self.z + other.z) / 2.0;
    }

    /// Unit vector in the same direction, or zero for a zero-length vertex.
    pub fn normalize(&self) -> Vertex {
        let n = self.to_dvec3().normalize_or_zero();
        Vertex {
            x: n.x,
            y: n.y,
            z: n.z,
            faces: Vec::new(),
        }
    }

    /// Indices of the mesh faces using this vertex, in insertion order.
    pub fn faces(&self) -> &[usize] {
        &self.faces
    }

    pub(crate) fn add_face(&mut self, face: usize) {
        self.faces.push(face);
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:9.4} {:9.4} {:9.4}", self.x, self.y, self.z)
    }
}

impl Add for &Vertex {
    type Output = Vertex;

    fn add(self, rhs: &Vertex) -> Vertex {
        Vertex::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for &Vertex {
    type Output = Vertex;

    fn sub(self, rhs: &Vertex) -> Vertex {
        Vertex::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for &Vertex {
    type Output = Vertex;

    fn mul(self, rhs: f64) -> Vertex {
        Vertex::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for &Vertex {
    type Output = Vertex;

    fn div(self, rhs: f64) -> Vertex {
        Vertex::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for &Vertex {
    type Output = Vertex;

    fn neg(self) -> Vertex {
        Vertex::new(-self.x, -self.y, -self.z)
    }
}

/// A texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Uv {
    pub s: f64,
    pub t: f64,
}

impl Uv {
    /// Create a UV, rounding to [`PRECISION`] places.
    pub fn new(s: f64, t: f64) -> Self {
        Self {
            s: round_places(s, PRECISION),
            t: round_places(t, PRECISION),
        }
    }

    /// Per-axis comparison within [`UV_TOLERANCE`].
    pub fn equals(&self, other: &Uv) -> bool {
        (self.s - other.s).abs() <= UV_TOLERANCE && (self.t - other.t).abs() <= UV_TOLERANCE
    }

    /// Average with another UV in place.
    pub fn merge_midpoint(&mut self, other: &Uv) {
        self.s = (self.s + other.s) / 2.0;
        self.t = (self.t + other.t) / 2.0;
    }
}

impl fmt::Display for Uv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} {:<6}",
            short_float(round_places(self.s, PRECISION)),
            short_float(round_places(self.t, PRECISION))
        )
    }
}

impl Add for Uv {
    type Output = Uv;

    fn add(self, rhs: Uv) -> Uv {
        Uv {
            s: self.s + rhs.s,
            t: self.t + rhs.t,
        }
    }
}

impl Sub for Uv {
    type Output = Uv;

    fn sub(self, rhs: Uv) -> Uv {
        Uv {
            s: self.s - rhs.s,
            t: self.t - rhs.t,
        }
    }
}

impl Mul<f64> for Uv {
    type Output = Uv;

    fn mul(self, rhs: f64) -> Uv {
        Uv {
            s: self.s * rhs,
            t: self.t * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_on_construction() {
        let v = Vertex::from_local([1.234_56, 2.0, -0.000_04], &ObjectTransform::identity());
        assert_eq!(v.coords(), [1.2346, 0.0, -2.0]);

        let uv = Uv::new(0.123_449, 0.5);
        assert_eq!(uv.s, 0.1234);
    }

    #[test]
    fn test_axis_convention() {
        let t = ObjectTransform::from_translation([1.0, 2.0, 3.0]);
        let v = Vertex::from_local([0.0, 0.0, 0.0], &t);
        assert_eq!(v.coords(), [1.0, 3.0, -2.0]);
    }

    #[test]
    fn test_tolerance_equality() {
        let a = Vertex::new(0.0, 0.0, 0.0);
        let b = Vertex::new(0.000_05, 0.0, 0.0);
        assert!(a.equals(&b, 0.0001));
        assert!(b.equals(&a, 0.0001));
        assert!(!a.equals(&b, 0.000_01));
    }

    #[test]
    fn test_midpoint_merge() {
        let mut a = Vertex::new(0.0, 0.0, 0.0);
        a.merge_midpoint(&Vertex::new(0.000_05, 0.0, 0.0));
        assert!((a.x - 0.000_025).abs() < 1e-12);
    }

    #[test]
    fn test_vertex_display() {
        let v = Vertex::new(1.5, -2.25, 0.0);
        assert_eq!(v.to_string(), "   1.5000   -2.2500    0.0000");
    }

    #[test]
    fn test_uv_display() {
        assert_eq!(Uv::new(0.5, 1.0).to_string(), "0.5    1.0   ");
        assert_eq!(Uv::new(0.1234, 0.0).to_string(), "0.1234 0.0   ");
    }

    #[test]
    fn test_uv_equality_is_one_pixel() {
        let a = Uv::new(0.5, 0.5);
        assert!(a.equals(&Uv::new(0.5003, 0.4997)));
        assert!(!a.equals(&Uv::new(0.5005, 0.5)));
    }

    #[test]
    fn test_normalize() {
        let a = Vertex::new(1.0, 0.0, 0.0);
        let b = Vertex::new(3.0, 4.0, 0.0);
        let n = (&b - &a).normalize();
        assert!((n.x - 0.447_213_6).abs() < 1e-6);
        assert!((n.y - 0.894_427_2).abs() < 1e-6);
    }
}

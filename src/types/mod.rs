//! Shared types used throughout the library.

mod flags;
mod transform;
mod vertex;

pub use flags::{Attribute, BucketKey, FaceFlags};
pub use transform::ObjectTransform;
pub use vertex::{Uv, Vertex, PRECISION, UV_TOLERANCE, VERTEX_TOLERANCE};

/// Round to a fixed number of decimal places, halves away from zero.
pub fn round_places(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Shortest text that reads back as `value`, always with a decimal point
/// for finite numbers (`1.0`, `0.25`, `-0.0`).
pub fn short_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') && !text.contains('e') {
        format!("{}.0", text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_places() {
        assert_eq!(round_places(1.234_56, 4), 1.2346);
        assert_eq!(round_places(-2.5, 0), -3.0);
        assert_eq!(round_places(0.123, 3), 0.123);
    }

    #[test]
    fn test_short_float() {
        assert_eq!(short_float(1.0), "1.0");
        assert_eq!(short_float(0.25), "0.25");
        assert_eq!(short_float(-0.0), "-0.0");
        assert_eq!(short_float(-9.9), "-9.9");
        assert_eq!(short_float(10.0), "10.0");
    }
}

// Angle and 2D vector helpers used by the drive kinematics.
// Angles are in degrees everywhere in the public API; positive is counter-clockwise.

use nalgebra::{Rotation2, Vector2};

pub fn to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

pub fn from_radians(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Cosine of an angle given in degrees
pub fn cos_deg(degrees: f64) -> f64 {
    to_radians(degrees).cos()
}

/// Rotate a vector counter-clockwise by `degrees`
pub fn rotate_deg(v: Vector2<f64>, degrees: f64) -> Vector2<f64> {
    Rotation2::new(to_radians(degrees)) * v
}

/// Direction of a vector in degrees, in (-180, 180].
/// Returns `None` for the zero vector, whose direction is undefined.
pub fn direction_deg(v: Vector2<f64>) -> Option<f64> {
    if v.x == 0.0 && v.y == 0.0 {
        None
    } else {
        Some(from_radians(v.y.atan2(v.x)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cos_deg() {
        assert_relative_eq!(cos_deg(0.0), 1.0);
        assert_relative_eq!(cos_deg(60.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(cos_deg(180.0), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate_deg(Vector2::new(1.0, 0.0), 90.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_keeps_magnitude() {
        let v = Vector2::new(3.0, -4.0);
        assert_relative_eq!(rotate_deg(v, -45.0).norm(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_direction() {
        assert_relative_eq!(direction_deg(Vector2::new(1.0, 1.0)).unwrap(), 45.0, epsilon = 1e-12);
        assert_relative_eq!(direction_deg(Vector2::new(0.0, -2.0)).unwrap(), -90.0, epsilon = 1e-12);
        assert!(direction_deg(Vector2::zeros()).is_none());
    }
}

use crate::Point;
use std::fmt;

/// Point in cylindrical coordinates, ordered as openEMS expects them:
/// azimuth first, then radius, then height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylindricalPoint {
    pub theta: f64,
    pub r: f64,
    pub z: f64,
}

impl fmt::Display for CylindricalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2);
        write!(
            f,
            "Cyl({:.prec$} rad, {:.prec$}, {:.prec$})",
            self.theta,
            self.r,
            self.z,
            prec = prec
        )
    }
}

/// Converts a Cartesian point into `(theta, r, z)`.
///
/// The origin maps to `theta = 0`, which is what `atan2(0, 0)` returns.
pub fn cartesian_to_cylindrical(pt: Point) -> CylindricalPoint {
    CylindricalPoint {
        theta: pt.y.atan2(pt.x),
        r: pt.x.hypot(pt.y),
        z: pt.z,
    }
}

/// Inverse of [`cartesian_to_cylindrical`].
pub fn cylindrical_to_cartesian(cyl: CylindricalPoint) -> Point {
    Point::new(cyl.r * cyl.theta.cos(), cyl.r * cyl.theta.sin(), cyl.z)
}

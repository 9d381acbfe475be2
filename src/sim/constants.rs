//! Physical constants in SI units.

use std::f64::consts::PI;

/// Speed of light in vacuum (m/s).
pub const C0: f64 = 299_792_458.0;

/// Vacuum permeability (H/m).
pub const MUE0: f64 = 4e-7 * PI;

/// Vacuum permittivity (F/m).
pub const EPS0: f64 = 1.0 / (MUE0 * C0 * C0);

/// Free-space wave impedance (Ohm).
pub const Z0: f64 = C0 * MUE0;

pub mod axis;
pub mod bboxes;
pub mod mesh;
pub mod point;
pub mod vector;

/// Geometric precision
const EPS: f64 = 1e-13;

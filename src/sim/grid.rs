use crate::vecutils::{arange_with_endpoint, max_gap, sort_unique};
use crate::{Axis, Point};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Lines closer than this (in drawing units) are treated as one line.
pub const LINE_TOL: f64 = 1e-9;

/// Upper limit on the lines a single fixed-step range may add.
pub const MAX_RANGE_LINES: f64 = 1e7;

/// Rectilinear FDTD mesh: one list of line coordinates per axis.
///
/// Coordinates are in drawing units; `delta_unit` converts them to metres
/// (0.001 when the model is drawn in millimetres). Lines are kept in
/// insertion order while the mesh is assembled and only sorted and
/// deduplicated when read through [`RectilinearGrid::sorted_lines`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectilinearGrid {
    delta_unit: f64,
    lines: [Vec<f64>; 3],
}

impl Default for RectilinearGrid {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RectilinearGrid {
    pub fn new(delta_unit: f64) -> Self {
        Self {
            delta_unit,
            lines: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    pub fn delta_unit(&self) -> f64 {
        self.delta_unit
    }

    pub fn set_delta_unit(&mut self, delta_unit: f64) -> Result<()> {
        if !(delta_unit > 0.0 && delta_unit.is_finite()) {
            bail!("Grid delta unit must be positive, got {delta_unit}");
        }
        self.delta_unit = delta_unit;
        Ok(())
    }

    /// Raw lines of `axis`, in insertion order.
    pub fn lines(&self, axis: Axis) -> &[f64] {
        &self.lines[axis.index()]
    }

    pub fn add_lines(&mut self, axis: Axis, values: &[f64]) {
        self.lines[axis.index()].extend_from_slice(values);
    }

    pub fn clear_lines(&mut self, axis: Axis) {
        self.lines[axis.index()].clear();
    }

    /// Deletes every line of `axis` inside the closed interval `[lo, hi]`.
    ///
    /// Returns the number of removed lines.
    pub fn remove_lines_within(&mut self, axis: Axis, lo: f64, hi: f64) -> usize {
        let lines = &mut self.lines[axis.index()];
        let before = lines.len();
        lines.retain(|&v| !(v >= lo && v <= hi));
        before - lines.len()
    }

    /// Replaces the lines of `axis` inside `[lo, hi]` with a fixed-step
    /// range over that interval (endpoint included when a whole number of
    /// steps reaches it).
    pub fn replace_range(&mut self, axis: Axis, lo: f64, hi: f64, step: f64) -> Result<()> {
        if !(lo.is_finite() && hi.is_finite()) || lo > hi {
            bail!("Invalid mesh interval on {axis}: [{lo}, {hi}]");
        }
        if lo < hi && !(step > 0.0 && step.is_finite()) {
            bail!("Mesh step on {axis} must be positive, got {step}");
        }
        let count = (hi - lo) / step;
        if count > MAX_RANGE_LINES {
            bail!("Mesh step {step} on {axis} gives {count:.3e} lines over [{lo}, {hi}]");
        }
        self.remove_lines_within(axis, lo, hi);
        let fresh = arange_with_endpoint(lo, hi, step);
        self.add_lines(axis, &fresh);
        Ok(())
    }

    /// Sorted lines of `axis` with duplicates removed.
    pub fn sorted_lines(&self, axis: Axis) -> Vec<f64> {
        sort_unique(self.lines(axis), LINE_TOL)
    }

    /// Number of distinct lines on `axis`.
    pub fn line_count(&self, axis: Axis) -> usize {
        self.sorted_lines(axis).len()
    }

    /// Total number of cells, `None` if an axis has fewer than 2 lines.
    pub fn cell_count(&self) -> Option<usize> {
        Axis::ALL.iter().try_fold(1usize, |acc, &axis| {
            let n = self.line_count(axis);
            (n >= 2).then(|| acc * (n - 1))
        })
    }

    /// Largest line spacing on `axis`, in drawing units.
    pub fn max_cell_size(&self, axis: Axis) -> Option<f64> {
        max_gap(&self.sorted_lines(axis))
    }

    /// Simulation domain spanned by the lines, `None` if an axis is empty.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let mut lo = [0.0; 3];
        let mut hi = [0.0; 3];
        for axis in Axis::ALL {
            let lines = self.sorted_lines(axis);
            lo[axis.index()] = *lines.first()?;
            hi[axis.index()] = *lines.last()?;
        }
        Some((Point::from(lo), Point::from(hi)))
    }

    /// Axes whose coarsest cell exceeds `max_res` metres, paired with
    /// that cell size in metres.
    pub fn coarse_axes(&self, max_res: f64) -> Vec<(Axis, f64)> {
        Axis::ALL
            .iter()
            .filter_map(|&axis| {
                let cell = self.max_cell_size(axis)? * self.delta_unit;
                (cell > max_res).then_some((axis, cell))
            })
            .collect()
    }

    /// Fails if an axis has fewer than two distinct lines.
    pub fn validate(&self) -> Result<()> {
        for axis in Axis::ALL {
            let n = self.line_count(axis);
            if n < 2 {
                bail!("Mesh needs at least 2 lines along {axis}, found {n}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_range_in_empty_grid() {
        let mut grid = RectilinearGrid::new(0.001);
        grid.replace_range(Axis::Z, -1., 3., 1.).unwrap();
        assert_eq!(grid.lines(Axis::Z), &[-1., 0., 1., 2., 3.]);
        assert!(grid.lines(Axis::X).is_empty());
    }

    #[test]
    fn test_replace_range_keeps_outside_lines() {
        let mut grid = RectilinearGrid::new(0.001);
        grid.add_lines(Axis::X, &[-5., 0., 0.5, 2., 10.]);
        grid.replace_range(Axis::X, 0., 2., 1.).unwrap();
        assert_eq!(grid.sorted_lines(Axis::X), vec![-5., 0., 1., 2., 10.]);
    }

    #[test]
    fn test_replace_range_degenerate_interval() {
        let mut grid = RectilinearGrid::new(1.0);
        grid.add_lines(Axis::Y, &[4., 5., 6.]);
        grid.replace_range(Axis::Y, 5., 5., 0.).unwrap();
        assert_eq!(grid.sorted_lines(Axis::Y), vec![4., 5., 6.]);
    }

    #[test]
    fn test_replace_range_errors() {
        let mut grid = RectilinearGrid::new(1.0);
        assert!(grid.replace_range(Axis::X, 3., 1., 0.1).is_err());
        assert!(grid.replace_range(Axis::X, 0., 1., 0.).is_err());
        assert!(grid.replace_range(Axis::X, 0., 1., -0.1).is_err());
        assert!(grid.replace_range(Axis::X, 0., 1., 1e-300).is_err());
        assert!(grid.replace_range(Axis::X, 64., 137., 1e-6).is_err());
        assert!(grid.lines(Axis::X).is_empty());
    }

    #[test]
    fn test_sorted_lines_unique() {
        let mut grid = RectilinearGrid::new(1.0);
        grid.add_lines(Axis::X, &[3., 1., 2.]);
        grid.add_lines(Axis::X, &[2., 1.]);
        assert_eq!(grid.sorted_lines(Axis::X), vec![1., 2., 3.]);
        assert_eq!(grid.lines(Axis::X).len(), 5);

        grid.clear_lines(Axis::X);
        assert!(grid.lines(Axis::X).is_empty());
    }

    #[test]
    fn test_cells_and_bounds() {
        let mut grid = RectilinearGrid::new(0.001);
        assert!(grid.bounds().is_none());
        assert!(grid.validate().is_err());

        grid.replace_range(Axis::X, 0., 4., 1.).unwrap();
        grid.replace_range(Axis::Y, 0., 2., 1.).unwrap();
        grid.replace_range(Axis::Z, 0., 1., 0.5).unwrap();
        assert_eq!(grid.cell_count(), Some(4 * 2 * 2));
        assert_eq!(grid.max_cell_size(Axis::X), Some(1.));

        let (lo, hi) = grid.bounds().unwrap();
        assert!(lo.is_close(&Point::new(0., 0., 0.)));
        assert!(hi.is_close(&Point::new(4., 2., 1.)));
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_coarse_axes() {
        let mut grid = RectilinearGrid::new(0.001);
        grid.add_lines(Axis::X, &[0., 10.]);
        grid.add_lines(Axis::Y, &[0., 1.]);
        grid.add_lines(Axis::Z, &[0., 1.]);
        // 10 mm cell on x, limit 5 mm
        let coarse = grid.coarse_axes(0.005);
        assert_eq!(coarse.len(), 1);
        assert_eq!(coarse[0].0, Axis::X);
        assert!((coarse[0].1 - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_delta_unit() {
        let mut grid = RectilinearGrid::default();
        assert_eq!(grid.delta_unit(), 1.0);
        grid.set_delta_unit(0.001).unwrap();
        assert_eq!(grid.delta_unit(), 0.001);
        assert!(grid.set_delta_unit(0.0).is_err());
    }
}

//! Builds openEMS FDTD simulation decks and drives the external solver.
//!
//! A deck declares boundary conditions, an excitation, material regions
//! imported from STL solid models, rectilinear mesh lines, lumped ports and
//! field dump boxes. The crate serializes the deck to the openEMS/CSXCAD XML
//! dialect and hands it to the `openEMS` binary.

pub mod geom;
pub mod io;
pub mod sim;
pub mod vecutils;

// Prelude
pub use geom::axis::Axis;
pub use geom::mesh::{Mesh, TriangleIndex};
pub use geom::point::Point;
pub use geom::point::convert::{CylindricalPoint, cartesian_to_cylindrical};
pub use geom::vector::Vector;
pub use sim::boundary::{BoundaryCondition, BoundarySet};
pub use sim::config::Deck;
pub use sim::excitation::Excitation;
pub use sim::fdtd::Fdtd;
pub use sim::grid::RectilinearGrid;
pub use sim::runner::RunOptions;
pub use sim::structure::ContinuousStructure;
pub use vecutils::arange_with_endpoint;

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Example
///
/// ```rust,ignore
/// emsim3d::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

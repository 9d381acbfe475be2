//! Simulation deck: every parameter record of a simulation in one
//! serializable structure.

use crate::sim::boundary::{BoundaryCondition, BoundarySet};
use crate::sim::excitation::Excitation;
use crate::sim::fdtd::Fdtd;
use crate::sim::materials::{MaterialProperties, MaterialSpec};
use crate::sim::nf2ff::Nf2ffSpec;
use crate::sim::port::LumpedPortSpec;
use crate::sim::probes::{DumpBoxSpec, DumpFileType, DumpMode, DumpType, ProbeSpec};
use crate::sim::runner::RunOptions;
use crate::{Axis, Point};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Fixed-step mesh lines over `[start, stop]` on one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRange {
    /// Mesh region this range belongs to (informational).
    #[serde(default)]
    pub region: String,
    pub axis: Axis,
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

/// Complete description of a simulation.
///
/// Coordinates are in drawing units (`unit` metres each), frequencies in Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    /// Drawing unit in metres.
    pub unit: f64,
    pub max_timesteps: u64,
    /// Energy decay at which the solver stops (1e-5 is -50 dB).
    pub min_decrement: f64,
    pub boundary: BoundarySet,
    pub excitation: Excitation,
    /// Cells per shortest wavelength used for the resolution check.
    #[serde(default = "default_resolution_divisor")]
    pub resolution_divisor: f64,
    #[serde(default)]
    pub materials: Vec<MaterialSpec>,
    #[serde(default)]
    pub mesh: Vec<MeshRange>,
    #[serde(default)]
    pub ports: Vec<LumpedPortSpec>,
    #[serde(default)]
    pub dumps: Vec<DumpBoxSpec>,
    #[serde(default)]
    pub probes: Vec<ProbeSpec>,
    #[serde(default)]
    pub nf2ff: Vec<Nf2ffSpec>,
    #[serde(default)]
    pub run: RunOptions,
}

fn default_resolution_divisor() -> f64 {
    20.0
}

impl Deck {
    /// Main board FEA deck: a 24 MHz sinusoidal source driving the `hse`
    /// port of the board, PML on all walls, a 0.1 mm mesh over the board
    /// region and time-domain E and H dumps over the same region.
    pub fn board_default() -> Self {
        let sim_lo = Point::new(64., -90., -1.);
        let sim_hi = Point::new(137., -31., 3.);

        let mesh = Axis::ALL
            .iter()
            .map(|&axis| MeshRange {
                region: "Sim".to_string(),
                axis,
                start: sim_lo.coord(axis),
                stop: sim_hi.coord(axis),
                step: 0.1,
            })
            .collect();

        Self {
            name: "main_board".to_string(),
            unit: 0.001,
            max_timesteps: 1_000_000,
            min_decrement: 1e-5,
            boundary: BoundarySet::uniform(BoundaryCondition::Pml(8)),
            excitation: Excitation::Sinus { f0: 24.0 * 1e6 },
            resolution_divisor: default_resolution_divisor(),
            materials: vec![
                MaterialSpec::metal("PEC"),
                MaterialSpec::metal("copper").with_solid("copper_gen_model.stl", 9700),
                MaterialSpec::material("air", MaterialProperties::new(1.0, 1.0, 0.0, 0.0))
                    .with_solid("Air_gen_model.stl", 9800),
                MaterialSpec::material("fr4", MaterialProperties::new(4.6, 1.0, 0.0, 0.0))
                    .with_solid("fr4_gen_model.stl", 9900),
            ],
            mesh,
            ports: vec![LumpedPortSpec {
                number: 1,
                name: "hse".to_string(),
                start: Point::new(103.5, -51.5, 1.46),
                stop: Point::new(104.5, -51., 1.495),
                resistance: 50.0,
                direction: Axis::X,
                priority: 10000,
                excite: 6600.0,
            }],
            dumps: vec![
                DumpBoxSpec {
                    name: "ht_Sim".to_string(),
                    dump_type: DumpType::HFieldTime,
                    dump_mode: DumpMode::Cell,
                    file_type: DumpFileType::Vtk,
                    frequency: Vec::new(),
                    start: sim_lo,
                    stop: sim_hi,
                },
                DumpBoxSpec {
                    name: "et_Sim".to_string(),
                    dump_type: DumpType::EFieldTime,
                    dump_mode: DumpMode::Cell,
                    file_type: DumpFileType::Vtk,
                    frequency: Vec::new(),
                    start: sim_lo,
                    stop: sim_hi,
                },
            ],
            probes: Vec::new(),
            nf2ff: Vec::new(),
            run: RunOptions::default(),
        }
    }

    /// Largest cell size (drawing units) that still resolves the excitation.
    pub fn max_resolution(&self) -> f64 {
        self.excitation.resolution_hint(self.resolution_divisor) / self.unit
    }

    /// Builds the solver setup. Solid-model paths are resolved against
    /// `base_dir` and stored as absolute paths.
    pub fn build(&self, base_dir: &Path) -> Result<Fdtd> {
        info!(deck = %self.name, "Building simulation setup");
        let base_dir = std::path::absolute(base_dir)
            .with_context(|| format!("Cannot resolve deck directory: {}", base_dir.display()))?;
        if !(self.resolution_divisor > 0.0 && self.resolution_divisor.is_finite()) {
            bail!(
                "Resolution divisor must be positive, got {}",
                self.resolution_divisor
            );
        }

        let mut fdtd = Fdtd::new(self.max_timesteps, self.min_decrement);
        fdtd.set_boundary_cond(self.boundary);
        fdtd.set_excitation(self.excitation)?;
        fdtd.csx_mut().grid_mut().set_delta_unit(self.unit)?;

        let csx = fdtd.csx_mut();
        for spec in &self.materials {
            let prop = match spec.properties {
                None => csx.add_metal(&spec.name)?,
                Some(props) => csx.add_material(&spec.name)?.set_material_property(props)?,
            };
            for solid in &spec.solids {
                prop.add_polyhedron_reader(&base_dir.join(&solid.file), solid.priority);
            }
        }

        let grid = csx.grid_mut();
        for range in &self.mesh {
            grid.replace_range(range.axis, range.start, range.stop, range.step)
                .with_context(|| format!("Invalid mesh range in region '{}'", range.region))?;
        }
        for axis in Axis::ALL {
            debug!(axis = %axis, lines = grid.line_count(axis), "Mesh lines");
        }

        let max_res = self.max_resolution();
        for (axis, cell) in grid.coarse_axes(max_res * self.unit) {
            warn!(
                axis = %axis,
                cell_m = cell,
                max_res_m = max_res * self.unit,
                "Mesh is too coarse for the excitation frequency"
            );
        }

        for port in &self.ports {
            fdtd.add_lumped_port(port)?;
        }

        let csx = fdtd.csx_mut();
        for dump in &self.dumps {
            csx.add_dump(
                &dump.name,
                dump.dump_type,
                dump.dump_mode,
                dump.file_type,
                dump.frequency.clone(),
            )?
            .add_box(dump.start, dump.stop, 0);
        }
        for probe in &self.probes {
            csx.add_probe(&probe.name, probe.probe_type, probe.weight, probe.norm_dir)?
                .add_box(probe.start, probe.stop, 0);
        }

        for nf2ff in &self.nf2ff {
            fdtd.add_nf2ff_box(nf2ff)?;
        }

        info!(
            properties = fdtd.csx().properties().len(),
            cells = fdtd.csx().grid().cell_count().unwrap_or(0),
            "Simulation setup ready"
        );
        Ok(fdtd)
    }
}

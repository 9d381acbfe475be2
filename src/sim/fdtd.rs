use crate::sim::boundary::BoundarySet;
use crate::sim::excitation::Excitation;
use crate::sim::nf2ff::{Nf2ffBox, Nf2ffSpec};
use crate::sim::port::{LumpedPort, LumpedPortSpec};
use crate::sim::structure::ContinuousStructure;
use anyhow::{Result, bail};
use tracing::info;

/// FDTD solver setup bound to a continuous structure.
///
/// Holds the global stopping criteria: the simulation ends after
/// `nr_ts` timesteps or once the field energy has decayed by
/// `end_criteria` (1e-5 is -50 dB).
#[derive(Debug, Clone)]
pub struct Fdtd {
    pub nr_ts: u64,
    pub end_criteria: f64,
    excitation: Option<Excitation>,
    boundary: BoundarySet,
    csx: ContinuousStructure,
    ports: Vec<LumpedPort>,
    nf2ff: Vec<Nf2ffBox>,
}

impl Fdtd {
    /// New setup with an empty structure and PEC walls.
    pub fn new(nr_ts: u64, end_criteria: f64) -> Self {
        Self {
            nr_ts,
            end_criteria,
            excitation: None,
            boundary: BoundarySet::default(),
            csx: ContinuousStructure::new(),
            ports: Vec::new(),
            nf2ff: Vec::new(),
        }
    }

    pub fn set_csx(&mut self, csx: ContinuousStructure) {
        self.csx = csx;
    }

    pub fn csx(&self) -> &ContinuousStructure {
        &self.csx
    }

    pub fn csx_mut(&mut self) -> &mut ContinuousStructure {
        &mut self.csx
    }

    pub fn set_boundary_cond(&mut self, boundary: BoundarySet) {
        self.boundary = boundary;
    }

    pub fn boundary(&self) -> &BoundarySet {
        &self.boundary
    }

    pub fn set_excitation(&mut self, excitation: Excitation) -> Result<()> {
        excitation.validate()?;
        self.excitation = Some(excitation);
        Ok(())
    }

    /// Single-frequency sinusoidal excitation at `f0` Hz.
    pub fn set_sinus_excite(&mut self, f0: f64) -> Result<()> {
        self.set_excitation(Excitation::Sinus { f0 })
    }

    pub fn excitation(&self) -> Option<&Excitation> {
        self.excitation.as_ref()
    }

    /// Adds a lumped port; its number must not be taken yet.
    pub fn add_lumped_port(&mut self, spec: &LumpedPortSpec) -> Result<&LumpedPort> {
        if self.ports.iter().any(|p| p.number == spec.number) {
            bail!("Port number {} is already used", spec.number);
        }
        let port = LumpedPort::create(&mut self.csx, spec)?;
        info!(
            number = port.number,
            name = %port.name,
            direction = %port.direction,
            resistance = port.resistance,
            excite = port.excite,
            "Added lumped port"
        );
        self.ports.push(port);
        Ok(&self.ports[self.ports.len() - 1])
    }

    pub fn ports(&self) -> &[LumpedPort] {
        &self.ports
    }

    /// Port number registered under `name`.
    pub fn port_number(&self, name: &str) -> Option<u32> {
        self.ports.iter().find(|p| p.name == name).map(|p| p.number)
    }

    pub fn add_nf2ff_box(&mut self, spec: &Nf2ffSpec) -> Result<&Nf2ffBox> {
        let nf2ff = Nf2ffBox::create(&mut self.csx, spec)?;
        self.nf2ff.push(nf2ff);
        Ok(&self.nf2ff[self.nf2ff.len() - 1])
    }

    pub fn nf2ff_boxes(&self) -> &[Nf2ffBox] {
        &self.nf2ff
    }

    /// Checks that the setup can be handed to the solver.
    pub fn validate(&self) -> Result<()> {
        if self.nr_ts == 0 {
            bail!("Number of timesteps must be positive");
        }
        if !(self.end_criteria > 0.0 && self.end_criteria < 1.0) {
            bail!("End criteria must lie in (0, 1), got {}", self.end_criteria);
        }
        if self.excitation.is_none() {
            bail!("No excitation defined");
        }
        self.csx.grid().validate()
    }
}

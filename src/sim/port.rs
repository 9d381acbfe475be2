use crate::sim::probes::ProbeType;
use crate::sim::structure::ContinuousStructure;
use crate::{Axis, Point};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Lumped port record as written in a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumpedPortSpec {
    pub number: u32,
    /// Label used to look the port up by name.
    #[serde(default)]
    pub name: String,
    pub start: Point,
    pub stop: Point,
    /// Port resistance in Ohm; 0 shorts the port with a metal box.
    pub resistance: f64,
    pub direction: Axis,
    pub priority: i32,
    /// Excitation amplitude; 0 declares a passive port.
    #[serde(default)]
    pub excite: f64,
}

/// A lumped port after it has been expanded into CSX properties.
#[derive(Debug, Clone, PartialEq)]
pub struct LumpedPort {
    pub number: u32,
    pub name: String,
    pub start: Point,
    pub stop: Point,
    pub resistance: f64,
    pub direction: Axis,
    /// +1 or -1: orientation of `start -> stop` along `direction`.
    pub sign: f64,
    pub excite: f64,
    pub element_name: String,
    pub excitation_name: Option<String>,
    pub voltage_probe: String,
    pub current_probe: String,
}

fn label(kind: &str, number: u32) -> String {
    format!("port_{kind}_{number}")
}

impl LumpedPort {
    /// Adds the port's properties to `csx`:
    ///
    /// - `port_resist_<n>`: lumped resistor (metal when the resistance is 0)
    /// - `port_excite_<n>`: soft E-field source, only for excited ports
    /// - `port_ut_<n>`: voltage probe along the port axis through its centre
    /// - `port_it_<n>`: current probe across the port mid-plane
    pub fn create(csx: &mut ContinuousStructure, spec: &LumpedPortSpec) -> Result<Self> {
        let ny = spec.direction;
        let (a, b) = (spec.start.coord(ny), spec.stop.coord(ny));
        if a == b {
            bail!(
                "Lumped port {}: start and stop must differ along the {ny} direction",
                spec.number
            );
        }
        if !(spec.resistance >= 0.0) {
            bail!(
                "Lumped port {}: resistance must be non-negative, got {}",
                spec.number,
                spec.resistance
            );
        }
        let sign = (b - a).signum();

        let element_name = label("resist", spec.number);
        let element = if spec.resistance > 0.0 {
            csx.add_lumped_element(&element_name, ny, true, spec.resistance)?
        } else {
            csx.add_metal(&element_name)?
        };
        element.add_box(spec.start, spec.stop, spec.priority);

        let excitation_name = if spec.excite != 0.0 {
            let name = label("excite", spec.number);
            let mut vector = [0.0; 3];
            vector[ny.index()] = -sign * spec.excite;
            csx.add_excitation(&name, 0, vector)?
                .add_box(spec.start, spec.stop, spec.priority);
            Some(name)
        } else {
            None
        };

        let centre = spec.start.midpoint(&spec.stop);

        let voltage_probe = label("ut", spec.number);
        csx.add_probe(&voltage_probe, ProbeType::Voltage, -sign, None)?
            .add_box(centre.with_coord(ny, a), centre.with_coord(ny, b), 0);

        let current_probe = label("it", spec.number);
        let mid = centre.coord(ny);
        csx.add_probe(&current_probe, ProbeType::Current, sign, Some(ny))?
            .add_box(spec.start.with_coord(ny, mid), spec.stop.with_coord(ny, mid), 0);

        Ok(Self {
            number: spec.number,
            name: spec.name.clone(),
            start: spec.start,
            stop: spec.stop,
            resistance: spec.resistance,
            direction: ny,
            sign,
            excite: spec.excite,
            element_name,
            excitation_name,
            voltage_probe,
            current_probe,
        })
    }

    pub fn is_excited(&self) -> bool {
        self.excitation_name.is_some()
    }
}

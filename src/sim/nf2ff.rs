use crate::sim::probes::{DumpFileType, DumpMode, DumpType};
use crate::sim::structure::ContinuousStructure;
use crate::{Axis, Point};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Near-field to far-field recording box as written in a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nf2ffSpec {
    pub name: String,
    pub start: Point,
    pub stop: Point,
    /// Record frequency-domain fields at these frequencies (Hz); time-domain
    /// fields are recorded when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frequency: Vec<f64>,
}

/// Recording box whose six faces dump the tangential E and H fields
/// needed for a near-field to far-field transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Nf2ffBox {
    pub name: String,
    pub start: Point,
    pub stop: Point,
    pub frequency: Vec<f64>,
    /// Names of the E-field dumps, one per face.
    pub e_dumps: Vec<String>,
    /// Names of the H-field dumps, one per face.
    pub h_dumps: Vec<String>,
}

/// Face suffixes: negative and positive side of each axis.
const FACES: [(Axis, &str, &str); 3] = [
    (Axis::X, "xn", "xp"),
    (Axis::Y, "yn", "yp"),
    (Axis::Z, "zn", "zp"),
];

impl Nf2ffBox {
    /// Adds twelve dump boxes (`<name>_E_xn`, `<name>_H_xn`, ...) to `csx`.
    pub fn create(csx: &mut ContinuousStructure, spec: &Nf2ffSpec) -> Result<Self> {
        for axis in Axis::ALL {
            if spec.start.coord(axis) == spec.stop.coord(axis) {
                bail!("NF2FF box '{}' is flat along {axis}", spec.name);
            }
        }

        let e_type = if spec.frequency.is_empty() {
            DumpType::EFieldTime
        } else {
            DumpType::EFieldFreq
        };

        let mut e_dumps = Vec::with_capacity(6);
        let mut h_dumps = Vec::with_capacity(6);

        for (axis, neg, pos) in FACES {
            let faces = [
                (neg, spec.start.coord(axis)),
                (pos, spec.stop.coord(axis)),
            ];
            for (suffix, plane) in faces {
                let lo = spec.start.with_coord(axis, plane);
                let hi = spec.stop.with_coord(axis, plane);
                for (field, dump_type, names) in [
                    ("E", e_type, &mut e_dumps),
                    ("H", e_type.dual(), &mut h_dumps),
                ] {
                    let name = format!("{}_{field}_{suffix}", spec.name);
                    csx.add_dump(
                        &name,
                        dump_type,
                        DumpMode::Node,
                        DumpFileType::Hdf5,
                        spec.frequency.clone(),
                    )?
                    .add_box(lo, hi, 0);
                    names.push(name);
                }
            }
        }

        Ok(Self {
            name: spec.name.clone(),
            start: spec.start,
            stop: spec.stop,
            frequency: spec.frequency.clone(),
            e_dumps,
            h_dumps,
        })
    }
}

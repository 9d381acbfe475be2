//! Field dumps and probes recorded by the solver.

use crate::Point;
use serde::{Deserialize, Serialize};

/// Quantity written by a dump box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpType {
    EFieldTime,
    HFieldTime,
    CurrentTime,
    CurrentDensityTime,
    EFieldFreq,
    HFieldFreq,
    CurrentFreq,
    CurrentDensityFreq,
}

impl DumpType {
    /// openEMS `DumpType` code.
    pub fn code(self) -> u8 {
        match self {
            DumpType::EFieldTime => 0,
            DumpType::HFieldTime => 1,
            DumpType::CurrentTime => 2,
            DumpType::CurrentDensityTime => 3,
            DumpType::EFieldFreq => 10,
            DumpType::HFieldFreq => 11,
            DumpType::CurrentFreq => 12,
            DumpType::CurrentDensityFreq => 13,
        }
    }

    pub fn is_frequency_domain(self) -> bool {
        self.code() >= 10
    }

    /// The magnetic counterpart of an electric dump (and vice versa).
    pub fn dual(self) -> Self {
        match self {
            DumpType::EFieldTime => DumpType::HFieldTime,
            DumpType::HFieldTime => DumpType::EFieldTime,
            DumpType::EFieldFreq => DumpType::HFieldFreq,
            DumpType::HFieldFreq => DumpType::EFieldFreq,
            other => other,
        }
    }
}

/// Where field values are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpMode {
    NoInterpolation,
    Node,
    #[default]
    Cell,
}

impl DumpMode {
    pub fn code(self) -> u8 {
        match self {
            DumpMode::NoInterpolation => 0,
            DumpMode::Node => 1,
            DumpMode::Cell => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFileType {
    #[default]
    Vtk,
    Hdf5,
}

impl DumpFileType {
    pub fn code(self) -> u8 {
        match self {
            DumpFileType::Vtk => 0,
            DumpFileType::Hdf5 => 1,
        }
    }
}

/// Quantity integrated by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeType {
    Voltage,
    Current,
    EField,
    HField,
}

impl ProbeType {
    pub fn code(self) -> u8 {
        match self {
            ProbeType::Voltage => 0,
            ProbeType::Current => 1,
            ProbeType::EField => 2,
            ProbeType::HField => 3,
        }
    }
}

/// Dump box record as written in a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpBoxSpec {
    pub name: String,
    pub dump_type: DumpType,
    #[serde(default)]
    pub dump_mode: DumpMode,
    #[serde(default)]
    pub file_type: DumpFileType,
    /// Sample frequencies (Hz), only used by frequency-domain dumps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frequency: Vec<f64>,
    pub start: Point,
    pub stop: Point,
}

/// Probe record as written in a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub name: String,
    pub probe_type: ProbeType,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm_dir: Option<crate::Axis>,
    pub start: Point,
    pub stop: Point,
}

fn default_weight() -> f64 {
    1.0
}

use crate::sim::constants::C0;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Time signal of the FDTD excitation.
///
/// All frequencies are in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Excitation {
    /// Gaussian pulse with center frequency `f0` and 20 dB cutoff `fc`.
    Gauss { f0: f64, fc: f64 },
    /// Single-frequency sinusoid.
    Sinus { f0: f64 },
    /// Dirac pulse, resolved up to `f_max`.
    Dirac { f_max: f64 },
    /// Unit step, resolved up to `f_max`.
    Step { f_max: f64 },
}

impl Excitation {
    /// openEMS excitation type code.
    pub fn type_id(&self) -> u8 {
        match self {
            Excitation::Gauss { .. } => 0,
            Excitation::Sinus { .. } => 1,
            Excitation::Dirac { .. } => 2,
            Excitation::Step { .. } => 3,
        }
    }

    /// Highest frequency the mesh has to resolve.
    pub fn max_frequency(&self) -> f64 {
        match *self {
            Excitation::Gauss { f0, fc } => f0 + fc,
            Excitation::Sinus { f0 } => f0,
            Excitation::Dirac { f_max } | Excitation::Step { f_max } => f_max,
        }
    }

    /// Attributes of the `<Excitation>` XML element besides `Type`.
    pub fn attributes(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Excitation::Gauss { f0, fc } => vec![("f0", f0), ("fc", fc)],
            Excitation::Sinus { f0 } => vec![("f0", f0)],
            Excitation::Dirac { f_max } | Excitation::Step { f_max } => vec![("f_max", f_max)],
        }
    }

    /// Largest cell size in metres: the shortest wavelength divided by
    /// `divisor` (20 is the usual rule of thumb).
    pub fn resolution_hint(&self, divisor: f64) -> f64 {
        C0 / self.max_frequency() / divisor
    }

    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            Excitation::Gauss { f0, fc } => f0 >= 0.0 && fc > 0.0,
            Excitation::Sinus { f0 } => f0 > 0.0,
            Excitation::Dirac { f_max } | Excitation::Step { f_max } => f_max > 0.0,
        };
        if !ok || !self.max_frequency().is_finite() {
            bail!("Invalid excitation frequencies: {self:?}");
        }
        Ok(())
    }
}

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Boundary condition of one domain face.
///
/// Serialized with the same tags openEMS accepts in `<BoundaryCond>`:
/// `PEC`, `PMC`, `MUR`, `PML_<cells>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BoundaryCondition {
    /// Perfect electric conductor
    Pec,
    /// Perfect magnetic conductor
    Pmc,
    /// First-order Mur absorbing boundary
    Mur,
    /// Perfectly matched layer with the given thickness in cells
    Pml(u32),
}

impl BoundaryCondition {
    /// Number of mesh cells the boundary occupies inside the domain.
    pub fn cells(&self) -> u32 {
        match self {
            BoundaryCondition::Pml(n) => *n,
            _ => 0,
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryCondition::Pec => f.write_str("PEC"),
            BoundaryCondition::Pmc => f.write_str("PMC"),
            BoundaryCondition::Mur => f.write_str("MUR"),
            BoundaryCondition::Pml(n) => write!(f, "PML_{n}"),
        }
    }
}

impl FromStr for BoundaryCondition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_uppercase();
        match tag.as_str() {
            "PEC" | "0" => Ok(BoundaryCondition::Pec),
            "PMC" | "1" => Ok(BoundaryCondition::Pmc),
            "MUR" | "2" => Ok(BoundaryCondition::Mur),
            _ => {
                let cells = tag
                    .strip_prefix("PML_")
                    .ok_or_else(|| anyhow!("Unknown boundary condition: {s}"))?;
                let cells: u32 = cells
                    .parse()
                    .with_context(|| format!("Invalid PML size in boundary condition: {s}"))?;
                if cells == 0 {
                    bail!("PML needs at least one cell: {s}");
                }
                Ok(BoundaryCondition::Pml(cells))
            }
        }
    }
}

impl TryFrom<String> for BoundaryCondition {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BoundaryCondition> for String {
    fn from(bc: BoundaryCondition) -> Self {
        bc.to_string()
    }
}

/// Attribute names of the six domain faces, in openEMS order.
pub const FACE_NAMES: [&str; 6] = ["xmin", "xmax", "ymin", "ymax", "zmin", "zmax"];

/// Boundary conditions of all six domain faces
/// (x-min, x-max, y-min, y-max, z-min, z-max).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundarySet(pub [BoundaryCondition; 6]);

impl BoundarySet {
    /// Same condition on every face.
    pub fn uniform(bc: BoundaryCondition) -> Self {
        Self([bc; 6])
    }

    /// Parses six openEMS tags, e.g. `["PML_8"; 6]`.
    pub fn from_tags(tags: &[&str]) -> Result<Self> {
        if tags.len() != 6 {
            bail!("Expected 6 boundary conditions, got {}", tags.len());
        }
        let mut faces = [BoundaryCondition::Pec; 6];
        for (face, tag) in faces.iter_mut().zip(tags) {
            *face = tag.parse()?;
        }
        Ok(Self(faces))
    }

    /// Iterates over `(attribute name, condition)` pairs.
    pub fn faces(&self) -> impl Iterator<Item = (&'static str, BoundaryCondition)> + '_ {
        FACE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl Default for BoundarySet {
    fn default() -> Self {
        Self::uniform(BoundaryCondition::Pec)
    }
}

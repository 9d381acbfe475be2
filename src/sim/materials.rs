//! CSXCAD properties: named regions (metals, dielectrics, lumped elements,
//! excitations, probes, dumps) and the primitives that give them a shape.

use crate::sim::probes::{DumpFileType, DumpMode, DumpType, ProbeType};
use crate::{Axis, Point};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Electromagnetic constants of an isotropic material.
///
/// `epsilon` and `mue` are relative; `kappa` is the electric conductivity
/// (S/m), `sigma` the magnetic one (Ohm/m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    pub epsilon: f64,
    pub mue: f64,
    pub kappa: f64,
    pub sigma: f64,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self::vacuum()
    }
}

impl MaterialProperties {
    pub fn new(epsilon: f64, mue: f64, kappa: f64, sigma: f64) -> Self {
        Self {
            epsilon,
            mue,
            kappa,
            sigma,
        }
    }

    pub fn vacuum() -> Self {
        Self::new(1.0, 1.0, 0.0, 0.0)
    }

    /// Lossless dielectric with relative permittivity `epsilon`.
    pub fn dielectric(epsilon: f64) -> Self {
        Self::new(epsilon, 1.0, 0.0, 0.0)
    }
}

/// Solid-model file type understood by the polyhedron reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolidFileType {
    Stl,
    Ply,
}

impl SolidFileType {
    pub fn code(self) -> u8 {
        match self {
            SolidFileType::Stl => 1,
            SolidFileType::Ply => 2,
        }
    }

    /// Picks the type from the file extension, STL when unknown.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ply") => SolidFileType::Ply,
            _ => SolidFileType::Stl,
        }
    }
}

/// Shape attached to a property.
///
/// The priority resolves overlaps between properties: the higher value wins.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Box {
        start: Point,
        stop: Point,
        priority: i32,
    },
    PolyhedronReader {
        path: PathBuf,
        file_type: SolidFileType,
        priority: i32,
    },
}

impl Primitive {
    pub fn priority(&self) -> i32 {
        match self {
            Primitive::Box { priority, .. } | Primitive::PolyhedronReader { priority, .. } => {
                *priority
            }
        }
    }
}

/// What a property does inside the solver.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// Perfect electric conductor
    Metal,
    Material(MaterialProperties),
    LumpedElement {
        direction: Axis,
        caps: bool,
        r: f64,
        c: Option<f64>,
        l: Option<f64>,
    },
    Excitation {
        /// 0 = soft E-field, 1 = soft H-field, 2 = hard E-field, 3 = hard H-field
        exc_type: u8,
        vector: [f64; 3],
        delay: f64,
    },
    Probe {
        probe_type: ProbeType,
        weight: f64,
        norm_dir: Option<Axis>,
    },
    Dump {
        dump_type: DumpType,
        dump_mode: DumpMode,
        file_type: DumpFileType,
        frequency: Vec<f64>,
    },
}

impl PropertyKind {
    /// XML element name of the property.
    pub fn tag(&self) -> &'static str {
        match self {
            PropertyKind::Metal => "Metal",
            PropertyKind::Material(_) => "Material",
            PropertyKind::LumpedElement { .. } => "LumpedElement",
            PropertyKind::Excitation { .. } => "Excitation",
            PropertyKind::Probe { .. } => "ProbeBox",
            PropertyKind::Dump { .. } => "DumpBox",
        }
    }
}

/// A named property with its primitives.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: usize,
    pub name: String,
    pub kind: PropertyKind,
    pub primitives: Vec<Primitive>,
}

impl Property {
    pub fn new(id: usize, name: &str, kind: PropertyKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            primitives: Vec::new(),
        }
    }

    /// Adds an axis-aligned box between two corners.
    pub fn add_box(&mut self, start: Point, stop: Point, priority: i32) -> &mut Self {
        self.primitives.push(Primitive::Box {
            start,
            stop,
            priority,
        });
        self
    }

    /// Attaches a triangulated solid model read by the solver from `path`.
    pub fn add_polyhedron_reader(&mut self, path: &Path, priority: i32) -> &mut Self {
        self.primitives.push(Primitive::PolyhedronReader {
            path: path.to_path_buf(),
            file_type: SolidFileType::from_path(path),
            priority,
        });
        self
    }

    /// Sets the constants of a material property.
    pub fn set_material_property(&mut self, props: MaterialProperties) -> Result<&mut Self> {
        match &mut self.kind {
            PropertyKind::Material(current) => {
                *current = props;
                Ok(self)
            }
            _ => bail!(
                "Property '{}' is a {}, material constants cannot be set",
                self.name,
                self.kind.tag()
            ),
        }
    }

    /// Paths of all solid-model files attached to this property.
    pub fn solid_files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::PolyhedronReader { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }
}

/// Deck entry of a material region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub name: String,
    /// `None` declares a perfect conductor (metal).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<MaterialProperties>,
    #[serde(default)]
    pub solids: Vec<SolidSpec>,
}

/// Solid-model file attached to a material, relative to the deck directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidSpec {
    pub file: PathBuf,
    pub priority: i32,
}

impl MaterialSpec {
    pub fn metal(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: None,
            solids: Vec::new(),
        }
    }

    pub fn material(name: &str, properties: MaterialProperties) -> Self {
        Self {
            name: name.to_string(),
            properties: Some(properties),
            solids: Vec::new(),
        }
    }

    pub fn with_solid(mut self, file: &str, priority: i32) -> Self {
        self.solids.push(SolidSpec {
            file: PathBuf::from(file),
            priority,
        });
        self
    }
}

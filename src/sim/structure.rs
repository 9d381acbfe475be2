use crate::geom::bboxes::are_bboxes_overlapping;
use crate::io::stl::read_stl;
use crate::sim::grid::RectilinearGrid;
use crate::sim::materials::{MaterialProperties, Property, PropertyKind};
use crate::sim::probes::{DumpFileType, DumpMode, DumpType, ProbeType};
use crate::{Axis, Point};
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Geometry container: the ordered list of properties plus the mesh.
///
/// Property IDs follow insertion order and names are unique.
#[derive(Debug, Clone, Default)]
pub struct ContinuousStructure {
    properties: Vec<Property>,
    grid: RectilinearGrid,
}

/// Summary of one solid-model file after it has been read.
#[derive(Debug, Clone)]
pub struct SolidSummary {
    pub property: String,
    pub path: PathBuf,
    pub triangles: usize,
    pub bounds: Option<(Point, Point)>,
}

impl ContinuousStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self) -> &RectilinearGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut RectilinearGrid {
        &mut self.grid
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    fn add_property(&mut self, name: &str, kind: PropertyKind) -> Result<&mut Property> {
        if name.is_empty() {
            bail!("Property name must not be empty");
        }
        if self.property(name).is_some() {
            bail!("Property '{name}' is already defined");
        }
        let id = self.properties.len();
        debug!(id, name, kind = kind.tag(), "Adding property");
        self.properties.push(Property::new(id, name, kind));
        Ok(&mut self.properties[id])
    }

    /// Adds a perfect electric conductor.
    pub fn add_metal(&mut self, name: &str) -> Result<&mut Property> {
        self.add_property(name, PropertyKind::Metal)
    }

    /// Adds a material with vacuum constants; see
    /// [`Property::set_material_property`].
    pub fn add_material(&mut self, name: &str) -> Result<&mut Property> {
        self.add_property(name, PropertyKind::Material(MaterialProperties::default()))
    }

    pub fn add_lumped_element(
        &mut self,
        name: &str,
        direction: Axis,
        caps: bool,
        r: f64,
    ) -> Result<&mut Property> {
        self.add_property(
            name,
            PropertyKind::LumpedElement {
                direction,
                caps,
                r,
                c: None,
                l: None,
            },
        )
    }

    /// Adds an excitation region. `exc_type` 0 is a soft E-field source.
    pub fn add_excitation(
        &mut self,
        name: &str,
        exc_type: u8,
        vector: [f64; 3],
    ) -> Result<&mut Property> {
        self.add_property(
            name,
            PropertyKind::Excitation {
                exc_type,
                vector,
                delay: 0.0,
            },
        )
    }

    pub fn add_probe(
        &mut self,
        name: &str,
        probe_type: ProbeType,
        weight: f64,
        norm_dir: Option<Axis>,
    ) -> Result<&mut Property> {
        self.add_property(
            name,
            PropertyKind::Probe {
                probe_type,
                weight,
                norm_dir,
            },
        )
    }

    pub fn add_dump(
        &mut self,
        name: &str,
        dump_type: DumpType,
        dump_mode: DumpMode,
        file_type: DumpFileType,
        frequency: Vec<f64>,
    ) -> Result<&mut Property> {
        if dump_type.is_frequency_domain() && frequency.is_empty() {
            bail!("Frequency-domain dump '{name}' needs at least one frequency");
        }
        self.add_property(
            name,
            PropertyKind::Dump {
                dump_type,
                dump_mode,
                file_type,
                frequency,
            },
        )
    }

    /// Reads every solid-model file referenced by a polyhedron reader.
    ///
    /// Fails on the first missing or malformed file. Solids lying entirely
    /// outside the mesh are reported with a warning.
    pub fn read_solid_models(&self) -> Result<Vec<SolidSummary>> {
        let domain = self.grid.bounds();
        let mut summaries = Vec::new();

        for prop in &self.properties {
            for path in prop.solid_files() {
                let mesh = read_stl(path)
                    .with_context(|| format!("Cannot import solid model of '{}'", prop.name))?;
                let bounds = mesh.bounds();
                if mesh.face_count() == 0 {
                    warn!(
                        property = %prop.name,
                        file = %path.display(),
                        "Solid model has no triangles"
                    );
                }
                info!(
                    property = %prop.name,
                    file = %path.display(),
                    triangles = mesh.face_count(),
                    "Read solid model"
                );

                if let (Some((lo, hi)), Some((dlo, dhi))) = (bounds, domain)
                    && !are_bboxes_overlapping(lo, hi, dlo, dhi)
                {
                    warn!(
                        property = %prop.name,
                        file = %path.display(),
                        "Solid model lies outside the mesh domain"
                    );
                }

                summaries.push(SolidSummary {
                    property: prop.name.clone(),
                    path: path.to_path_buf(),
                    triangles: mesh.face_count(),
                    bounds,
                });
            }
        }

        Ok(summaries)
    }
}

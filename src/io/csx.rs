//! openEMS XML writer.
//!
//! Produces the document `openEMS <file>` consumes: an `<FDTD>` element with
//! the stopping criteria, excitation and boundaries, followed by the
//! `<ContinuousStructure>` holding every property and the rectilinear grid.

use crate::Axis;
use crate::Point;
use crate::sim::fdtd::Fdtd;
use crate::sim::materials::{Primitive, Property, PropertyKind};
use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

type Attrs<'a> = &'a [(&'a str, String)];

/// Thin helper over the quick-xml writer for element/attribute output.
struct XmlOut<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlOut<W> {
    fn new(inner: W) -> Self {
        Self {
            writer: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    fn element(name: &str, attrs: Attrs) -> BytesStart<'static> {
        let mut elem = BytesStart::new(name.to_string());
        for (key, value) in attrs {
            elem.push_attribute((*key, value.as_str()));
        }
        elem
    }

    fn decl(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    fn start(&mut self, name: &str, attrs: Attrs) -> Result<()> {
        self.writer.write_event(Event::Start(Self::element(name, attrs)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: Attrs) -> Result<()> {
        self.writer.write_event(Event::Empty(Self::element(name, attrs)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name, &[])?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

fn num(v: f64) -> String {
    format!("{v}")
}

fn join(values: &[f64]) -> String {
    values.iter().map(|&v| num(v)).collect::<Vec<_>>().join(",")
}

fn point_attrs(p: &Point) -> [(&'static str, String); 3] {
    [("X", num(p.x)), ("Y", num(p.y)), ("Z", num(p.z))]
}

/// Writes the openEMS description of `fdtd` to `path`.
pub fn write_openems_xml(path: &Path, fdtd: &Fdtd) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = write_openems(BufWriter::new(file), fdtd)
        .with_context(|| format!("Failed to write simulation description: {}", path.display()))?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to flush file: {}", path.display()))?;
    Ok(())
}

/// Serializes the openEMS description of `fdtd` to a string.
pub fn to_openems_xml_string(fdtd: &Fdtd) -> Result<String> {
    let buf = write_openems(Vec::new(), fdtd)?;
    String::from_utf8(buf).context("Simulation description is not valid UTF-8")
}

/// Writes the document into `out` and hands the sink back.
pub fn write_openems<W: Write>(out: W, fdtd: &Fdtd) -> Result<W> {
    let mut xml = XmlOut::new(out);
    xml.decl()?;
    xml.start("openEMS", &[])?;
    write_fdtd(&mut xml, fdtd)?;
    write_structure(&mut xml, fdtd)?;
    xml.end("openEMS")?;
    Ok(xml.into_inner())
}

fn write_fdtd<W: Write>(xml: &mut XmlOut<W>, fdtd: &Fdtd) -> Result<()> {
    let mut attrs = vec![
        ("NumberOfTimesteps", fdtd.nr_ts.to_string()),
        ("endCriteria", num(fdtd.end_criteria)),
    ];
    if let Some(exc) = fdtd.excitation() {
        attrs.push(("f_max", num(exc.max_frequency())));
    }
    xml.start("FDTD", &attrs)?;

    if let Some(exc) = fdtd.excitation() {
        let mut exc_attrs = vec![("Type", exc.type_id().to_string())];
        exc_attrs.extend(exc.attributes().into_iter().map(|(k, v)| (k, num(v))));
        xml.empty("Excitation", &exc_attrs)?;
    }

    let bc_attrs: Vec<(&str, String)> = fdtd
        .boundary()
        .faces()
        .map(|(face, bc)| (face, bc.to_string()))
        .collect();
    xml.empty("BoundaryCond", &bc_attrs)?;

    xml.end("FDTD")
}

fn write_structure<W: Write>(xml: &mut XmlOut<W>, fdtd: &Fdtd) -> Result<()> {
    let csx = fdtd.csx();
    xml.start("ContinuousStructure", &[("CoordSystem", "0".to_string())])?;

    xml.start("Properties", &[])?;
    for prop in csx.properties() {
        write_property(xml, prop)?;
    }
    xml.end("Properties")?;

    let grid = csx.grid();
    xml.start(
        "RectilinearGrid",
        &[
            ("DeltaUnit", num(grid.delta_unit())),
            ("CoordSystem", "0".to_string()),
        ],
    )?;
    for axis in Axis::ALL {
        let tag = match axis {
            Axis::X => "XLines",
            Axis::Y => "YLines",
            Axis::Z => "ZLines",
        };
        xml.text_element(tag, &join(&grid.sorted_lines(axis)))?;
    }
    xml.end("RectilinearGrid")?;

    xml.end("ContinuousStructure")
}

fn write_property<W: Write>(xml: &mut XmlOut<W>, prop: &Property) -> Result<()> {
    let tag = prop.kind.tag();
    let mut attrs = vec![("ID", prop.id.to_string()), ("Name", prop.name.clone())];

    match &prop.kind {
        PropertyKind::Metal | PropertyKind::Material(_) => {}
        PropertyKind::LumpedElement {
            direction,
            caps,
            r,
            c,
            l,
        } => {
            attrs.push(("Direction", direction.index().to_string()));
            attrs.push(("Caps", u8::from(*caps).to_string()));
            attrs.push(("R", num(*r)));
            if let Some(c) = c {
                attrs.push(("C", num(*c)));
            }
            if let Some(l) = l {
                attrs.push(("L", num(*l)));
            }
        }
        PropertyKind::Excitation {
            exc_type,
            vector,
            delay,
        } => {
            attrs.push(("Number", "0".to_string()));
            attrs.push(("Type", exc_type.to_string()));
            attrs.push(("Excite", join(vector)));
            attrs.push(("Delay", num(*delay)));
        }
        PropertyKind::Probe {
            probe_type,
            weight,
            norm_dir,
        } => {
            attrs.push(("Type", probe_type.code().to_string()));
            attrs.push(("Weight", num(*weight)));
            if let Some(axis) = norm_dir {
                attrs.push(("NormDir", axis.index().to_string()));
            }
        }
        PropertyKind::Dump {
            dump_type,
            dump_mode,
            file_type,
            ..
        } => {
            attrs.push(("DumpType", dump_type.code().to_string()));
            attrs.push(("DumpMode", dump_mode.code().to_string()));
            attrs.push(("FileType", file_type.code().to_string()));
        }
    }

    xml.start(tag, &attrs)?;

    match &prop.kind {
        PropertyKind::Material(m) => xml.empty(
            "Property",
            &[
                ("Epsilon", num(m.epsilon)),
                ("Mue", num(m.mue)),
                ("Kappa", num(m.kappa)),
                ("Sigma", num(m.sigma)),
            ],
        )?,
        PropertyKind::Dump { frequency, .. } if !frequency.is_empty() => {
            xml.text_element("FD_Samples", &join(frequency))?
        }
        _ => {}
    }

    xml.start("Primitives", &[])?;
    for primitive in &prop.primitives {
        write_primitive(xml, primitive)?;
    }
    xml.end("Primitives")?;

    xml.end(tag)
}

fn write_primitive<W: Write>(xml: &mut XmlOut<W>, primitive: &Primitive) -> Result<()> {
    match primitive {
        Primitive::Box {
            start,
            stop,
            priority,
        } => {
            xml.start("Box", &[("Priority", priority.to_string())])?;
            xml.empty("P1", &point_attrs(start))?;
            xml.empty("P2", &point_attrs(stop))?;
            xml.end("Box")
        }
        Primitive::PolyhedronReader {
            path,
            file_type,
            priority,
        } => xml.empty(
            "PolyhedronReader",
            &[
                ("Priority", priority.to_string()),
                ("FilePath", path.display().to_string()),
                ("FileType", file_type.code().to_string()),
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Deck;
    use crate::sim::materials::MaterialProperties;
    use tempfile::tempdir;

    fn small_setup() -> Result<Fdtd> {
        let mut fdtd = Fdtd::new(500, 1e-4);
        fdtd.set_sinus_excite(1e9)?;
        let csx = fdtd.csx_mut();
        csx.grid_mut().set_delta_unit(0.001)?;
        csx.grid_mut().add_lines(Axis::X, &[1., 0., 0.5]);
        csx.grid_mut().add_lines(Axis::Y, &[0., 1.]);
        csx.grid_mut().add_lines(Axis::Z, &[0., 1.]);
        csx.add_material("sub")?
            .set_material_property(MaterialProperties::dielectric(4.6))?
            .add_box(Point::new(0., 0., 0.), Point::new(1., 1., 0.5), 10);
        Ok(fdtd)
    }

    #[test]
    fn test_document_layout() -> Result<()> {
        let xml = to_openems_xml_string(&small_setup()?)?;
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(r#"<FDTD NumberOfTimesteps="500" endCriteria="0.0001" f_max="1000000000">"#));
        assert!(xml.contains(r#"<Excitation Type="1" f0="1000000000"/>"#));
        assert!(xml.contains(r#"xmin="PEC""#));
        assert!(xml.contains(r#"<Material ID="0" Name="sub">"#));
        assert!(xml.contains(r#"<Property Epsilon="4.6" Mue="1" Kappa="0" Sigma="0"/>"#));
        assert!(xml.contains(r#"<Box Priority="10">"#));
        assert!(xml.contains(r#"<P2 X="1" Y="1" Z="0.5"/>"#));
        assert!(xml.contains(r#"<RectilinearGrid DeltaUnit="0.001" CoordSystem="0">"#));
        assert!(xml.contains("<XLines>0,0.5,1</XLines>"));
        assert!(xml.trim_end().ends_with("</openEMS>"));
        Ok(())
    }

    #[test]
    fn test_board_properties() -> Result<()> {
        let fdtd = Deck::board_default().build(Path::new("/board"))?;
        let xml = to_openems_xml_string(&fdtd)?;

        assert!(xml.contains(r#"<BoundaryCond xmin="PML_8" xmax="PML_8" ymin="PML_8" ymax="PML_8" zmin="PML_8" zmax="PML_8"/>"#));
        assert!(xml.contains(r#"<Metal ID="0" Name="PEC">"#));
        assert!(xml.contains(r#"<PolyhedronReader Priority="9700" FilePath="/board/copper_gen_model.stl" FileType="1"/>"#));
        assert!(xml.contains(r#"<LumpedElement ID="4" Name="port_resist_1" Direction="0" Caps="1" R="50">"#));
        assert!(xml.contains(r#"Name="port_excite_1" Number="0" Type="0" Excite="-6600,0,0" Delay="0">"#));
        assert!(xml.contains(r#"<ProbeBox ID="6" Name="port_ut_1" Type="0" Weight="-1">"#));
        assert!(xml.contains(r#"<ProbeBox ID="7" Name="port_it_1" Type="1" Weight="1" NormDir="0">"#));
        assert!(xml.contains(r#"<DumpBox ID="8" Name="ht_Sim" DumpType="1" DumpMode="2" FileType="0">"#));
        assert!(xml.contains(r#"<DumpBox ID="9" Name="et_Sim" DumpType="0" DumpMode="2" FileType="0">"#));
        Ok(())
    }

    #[test]
    fn test_frequency_dump_samples() -> Result<()> {
        let mut fdtd = small_setup()?;
        fdtd.csx_mut()
            .add_dump(
                "ef",
                crate::sim::probes::DumpType::EFieldFreq,
                crate::sim::probes::DumpMode::Node,
                crate::sim::probes::DumpFileType::Hdf5,
                vec![1e9, 2e9],
            )?
            .add_box(Point::new(0., 0., 0.), Point::new(1., 1., 1.), 0);
        let xml = to_openems_xml_string(&fdtd)?;
        assert!(xml.contains("<FD_Samples>1000000000,2000000000</FD_Samples>"));
        Ok(())
    }

    #[test]
    fn test_write_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("fea.xml");
        write_openems_xml(&path, &small_setup()?)?;
        let content = std::fs::read_to_string(&path)?;
        assert!(content.contains("<ContinuousStructure CoordSystem=\"0\">"));
        Ok(())
    }
}
